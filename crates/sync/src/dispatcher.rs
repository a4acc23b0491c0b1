// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Entity dispatcher.
//!
//! Maps a queued record to one REST call and hands it to a [`Remote`]:
//!
//! | Operation | Call                          |
//! |-----------|-------------------------------|
//! | Create    | `POST /<resource>` + payload  |
//! | Update    | `PUT /<resource>/<id>` + payload |
//! | Delete    | `DELETE /<resource>/<id>`     |
//!
//! The remote is a trait so tests can substitute a recording mock for the
//! HTTP client.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use mes_core::{OperationKind, SyncRecord};
use serde_json::Value;

use crate::config::SyncConfig;

/// Header carrying the tenant id on every request.
pub const TENANT_HEADER: &str = "X-Tenant-ID";

/// Header carrying the record id so the backend can drop replays.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Error type for a single dispatch attempt.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Non-2xx response, transport failure or timeout.
    #[error("remote call failed: {message}")]
    RemoteCallFailed {
        /// HTTP status if a response arrived.
        status: Option<u16>,
        message: String,
    },

    /// Update or delete without a usable `id` in the payload.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl DispatchError {
    /// Returns true if the attempt counts against the retry ceiling
    /// rather than failing the record outright.
    ///
    /// Both kinds are retryable: the payload is opaque here and a remote
    /// failure may be transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            DispatchError::RemoteCallFailed { .. } | DispatchError::MalformedPayload(_) => true,
        }
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// HTTP verb of a dispatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub method: Method,
    /// Path relative to the API base, with a leading slash.
    pub path: String,
    /// JSON body; `None` for deletes.
    pub body: Option<Value>,
    pub idempotency_key: String,
}

impl RemoteRequest {
    /// Resolves the call for a queued record.
    pub fn for_record(record: &SyncRecord) -> DispatchResult<Self> {
        let resource = record.entity.resource_path();
        let (method, path, body) = match record.operation {
            OperationKind::Create => (
                Method::Post,
                format!("/{resource}"),
                Some(record.payload.clone()),
            ),
            OperationKind::Update => (
                Method::Put,
                format!("/{}/{}", resource, require_id(record)?),
                Some(record.payload.clone()),
            ),
            OperationKind::Delete => (
                Method::Delete,
                format!("/{}/{}", resource, require_id(record)?),
                None,
            ),
        };
        Ok(RemoteRequest {
            method,
            path,
            body,
            idempotency_key: record.id.to_string(),
        })
    }
}

fn require_id(record: &SyncRecord) -> DispatchResult<String> {
    record.payload_id().ok_or_else(|| {
        DispatchError::MalformedPayload(format!(
            "{} of {} requires an id in the payload",
            record.operation, record.entity
        ))
    })
}

/// Remote end of a dispatch.
///
/// Any non-success outcome must be reported as an error; the engine treats
/// all of them alike.
pub trait Remote: Send + Sync {
    /// Performs one remote call.
    fn call(
        &self,
        request: RemoteRequest,
    ) -> Pin<Box<dyn Future<Output = DispatchResult<()>> + Send + '_>>;
}

/// [`Remote`] backed by the MES REST API.
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    tenant_id: Option<String>,
}

impl HttpRemote {
    /// Builds a client using the configured base URL, credentials and
    /// request timeout.
    pub fn new(config: &SyncConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| crate::Error::HttpClient(e.to_string()))?;
        Ok(HttpRemote {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            tenant_id: config.tenant_id.clone(),
        })
    }

    /// Returns the absolute URL for a request path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RemoteRequest) -> DispatchResult<()> {
        let url = self.url_for(&request.path);
        let mut builder = match request.method {
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(tenant) = &self.tenant_id {
            builder = builder.header(TENANT_HEADER, tenant);
        }
        builder = builder.header(IDEMPOTENCY_HEADER, &request.idempotency_key);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DispatchError::RemoteCallFailed {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        let message = match text.trim() {
            "" => format!("HTTP {}", status.as_u16()),
            body => format!("HTTP {}: {}", status.as_u16(), body),
        };
        Err(DispatchError::RemoteCallFailed {
            status: Some(status.as_u16()),
            message,
        })
    }
}

impl Remote for HttpRemote {
    fn call(
        &self,
        request: RemoteRequest,
    ) -> Pin<Box<dyn Future<Output = DispatchResult<()>> + Send + '_>> {
        Box::pin(self.send(request))
    }
}

/// Resolves queued records and delivers them through a [`Remote`].
pub struct Dispatcher<R: Remote> {
    remote: R,
}

impl<R: Remote> Dispatcher<R> {
    pub fn new(remote: R) -> Self {
        Dispatcher { remote }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Delivers one record. Errors are returned to the caller untouched.
    pub async fn dispatch(&self, record: &SyncRecord) -> DispatchResult<()> {
        let request = RemoteRequest::for_record(record)?;
        tracing::debug!(
            id = %record.id,
            method = %request.method,
            path = %request.path,
            "dispatching sync record"
        );
        self.remote.call(request).await
    }
}
