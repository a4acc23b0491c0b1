// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the entity dispatcher, plus the mock remote used by the
//! engine and trigger tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use mes_core::{Entity, OperationKind, SyncRecord};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{Notify, Semaphore};
use yare::parameterized;

use crate::test_helpers::T0;
use crate::{
    DispatchError, DispatchResult, Dispatcher, HttpRemote, Method, Remote, RemoteRequest,
    SyncConfig,
};

#[derive(Default)]
struct MockState {
    calls: Mutex<Vec<RemoteRequest>>,
    fail_all: AtomicBool,
    fail_paths: Mutex<HashSet<String>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    entered: Notify,
}

/// Recording remote with scriptable failures.
///
/// Calls are recorded before any gate or failure is applied, so a failed
/// call still shows up in [`MockRemote::calls`].
#[derive(Clone, Default)]
pub struct MockRemote {
    state: Arc<MockState>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every request seen so far, in order.
    pub fn calls(&self) -> Vec<RemoteRequest> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn call_paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|r| r.path).collect()
    }

    /// Makes every call fail with HTTP 503.
    pub fn set_fail_all(&self, fail: bool) {
        self.state.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Makes calls to `path` fail with HTTP 503.
    pub fn fail_path(&self, path: &str) {
        self.state.fail_paths.lock().unwrap().insert(path.to_string());
    }

    /// Blocks subsequent calls until a permit is added to the returned
    /// semaphore. Each permit releases one call.
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.state.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Waits until some call has reached the remote.
    pub async fn wait_entered(&self) {
        self.state.entered.notified().await;
    }

    async fn handle(&self, request: RemoteRequest) -> DispatchResult<()> {
        let path = request.path.clone();
        self.state.calls.lock().unwrap().push(request);
        self.state.entered.notify_one();

        let gate = self.state.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        let fail = self.state.fail_all.load(Ordering::SeqCst)
            || self.state.fail_paths.lock().unwrap().contains(&path);
        if fail {
            return Err(DispatchError::RemoteCallFailed {
                status: Some(503),
                message: "HTTP 503: unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl Remote for MockRemote {
    fn call(
        &self,
        request: RemoteRequest,
    ) -> Pin<Box<dyn Future<Output = DispatchResult<()>> + Send + '_>> {
        Box::pin(self.handle(request))
    }
}

fn record(operation: OperationKind, entity: Entity, payload: serde_json::Value) -> SyncRecord {
    SyncRecord::new(T0, operation, entity, payload)
}

// Routing

#[parameterized(
    create_defect = { OperationKind::Create, "DEFECT", Method::Post, "/defects" },
    update_work_order = { OperationKind::Update, "WORK_ORDER", Method::Put, "/work-orders/42" },
    delete_step = { OperationKind::Delete, "PROCEDURE_STEP", Method::Delete, "/procedure-steps/42" },
    create_result = { OperationKind::Create, "PRODUCTION_RESULT", Method::Post, "/production-results" },
    unknown_update = { OperationKind::Update, "CUSTOM_WIDGET", Method::Put, "/custom-widgets/42" },
    unknown_sibilant = { OperationKind::Create, "box", Method::Post, "/boxes" },
    unknown_y = { OperationKind::Delete, "BATTERY", Method::Delete, "/batteries/42" },
)]
fn routes_record(operation: OperationKind, tag: &str, method: Method, path: &str) {
    let rec = record(operation, Entity::from_tag(tag).unwrap(), json!({"id": 42}));
    let request = RemoteRequest::for_record(&rec).unwrap();
    assert_eq!(request.method, method);
    assert_eq!(request.path, path);
}

#[test]
fn resource_override_replaces_convention() {
    let entity = Entity::from_parts("GAUGE_READING", Some("/metrology/readings/")).unwrap();
    let rec = record(OperationKind::Update, entity, json!({"id": "g-1"}));
    let request = RemoteRequest::for_record(&rec).unwrap();
    assert_eq!(request.path, "/metrology/readings/g-1");
}

#[test]
fn create_and_update_carry_payload_delete_does_not() {
    let payload = json!({"id": 42, "description": "crack"});

    let create = RemoteRequest::for_record(&record(
        OperationKind::Create,
        Entity::Defect,
        payload.clone(),
    ))
    .unwrap();
    assert_eq!(create.body, Some(payload.clone()));

    let delete =
        RemoteRequest::for_record(&record(OperationKind::Delete, Entity::Defect, payload)).unwrap();
    assert_eq!(delete.body, None);
}

#[test]
fn idempotency_key_is_record_id() {
    let rec = record(OperationKind::Create, Entity::Defect, json!({}));
    let request = RemoteRequest::for_record(&rec).unwrap();
    assert_eq!(request.idempotency_key, rec.id.as_str());
}

#[parameterized(
    update_without_id = { OperationKind::Update, json!({"description": "x"}) },
    delete_blank_id = { OperationKind::Delete, json!({"id": "  "}) },
    delete_object_id = { OperationKind::Delete, json!({"id": {"n": 1}}) },
)]
fn missing_id_is_malformed(operation: OperationKind, payload: serde_json::Value) {
    let err = RemoteRequest::for_record(&record(operation, Entity::WorkOrder, payload)).unwrap_err();
    assert!(matches!(err, DispatchError::MalformedPayload(_)));
    assert!(err.is_retryable());
}

#[test]
fn create_without_id_is_fine() {
    let rec = record(OperationKind::Create, Entity::WorkOrder, json!({"qty": 1}));
    assert!(RemoteRequest::for_record(&rec).is_ok());
}

#[tokio::test]
async fn dispatcher_forwards_to_remote() {
    let remote = MockRemote::new();
    let dispatcher = Dispatcher::new(remote.clone());

    let rec = record(OperationKind::Create, Entity::Defect, json!({"id": 42}));
    dispatcher.dispatch(&rec).await.unwrap();

    assert_eq!(remote.call_paths(), vec!["/defects"]);
}

#[tokio::test]
async fn dispatcher_skips_remote_for_malformed_payload() {
    let remote = MockRemote::new();
    let dispatcher = Dispatcher::new(remote.clone());

    let rec = record(OperationKind::Delete, Entity::Defect, json!({}));
    assert!(dispatcher.dispatch(&rec).await.is_err());
    assert!(remote.calls().is_empty());
}

// HTTP remote against a one-shot local server

struct Captured {
    head: String,
    body: String,
}

/// Accepts one connection, captures the request, and answers with
/// `status_line`. With `None` the connection is held open without a reply.
async fn one_shot_server(
    status_line: Option<&'static str>,
) -> (String, tokio::task::JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

        match status_line {
            Some(status_line) => {
                let reply_body = if status_line.starts_with("2") { "" } else { "boom" };
                let reply = format!(
                    "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status_line,
                    reply_body.len(),
                    reply_body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
            }
            None => {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
        }
        Captured { head, body }
    });
    (format!("http://{}/api", addr), handle)
}

fn http_remote(base_url: String, timeout_secs: u64) -> HttpRemote {
    let config = SyncConfig {
        api_base_url: base_url,
        token: Some("secret-token".to_string()),
        tenant_id: Some("plant-7".to_string()),
        request_timeout_secs: timeout_secs,
        ..SyncConfig::default()
    };
    HttpRemote::new(&config).unwrap()
}

#[tokio::test]
async fn http_remote_sends_headers_and_body() {
    let (base, server) = one_shot_server(Some("201 Created")).await;
    let remote = http_remote(base, 5);

    let rec = record(
        OperationKind::Create,
        Entity::Defect,
        json!({"id": 42, "description": "crack"}),
    );
    remote
        .call(RemoteRequest::for_record(&rec).unwrap())
        .await
        .unwrap();

    let captured = server.await.unwrap();
    let head = captured.head.to_ascii_lowercase();
    assert!(captured.head.starts_with("POST /api/defects HTTP/1.1"), "{}", captured.head);
    assert!(head.contains("authorization: bearer secret-token"));
    assert!(head.contains("x-tenant-id: plant-7"));
    assert!(head.contains(&format!("idempotency-key: {}", rec.id).to_ascii_lowercase()));
    let body: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(body, json!({"id": 42, "description": "crack"}));
}

#[tokio::test]
async fn http_remote_delete_targets_id() {
    let (base, server) = one_shot_server(Some("204 No Content")).await;
    let remote = http_remote(format!("{base}/"), 5);

    let rec = record(OperationKind::Delete, Entity::WorkOrder, json!({"id": 9}));
    remote
        .call(RemoteRequest::for_record(&rec).unwrap())
        .await
        .unwrap();

    let captured = server.await.unwrap();
    assert!(captured.head.starts_with("DELETE /api/work-orders/9 HTTP/1.1"), "{}", captured.head);
}

#[tokio::test]
async fn http_remote_reports_non_success_status() {
    let (base, server) = one_shot_server(Some("500 Internal Server Error")).await;
    let remote = http_remote(base, 5);

    let rec = record(OperationKind::Create, Entity::Defect, json!({}));
    let err = remote
        .call(RemoteRequest::for_record(&rec).unwrap())
        .await
        .unwrap_err();

    match err {
        DispatchError::RemoteCallFailed { status, message } => {
            assert_eq!(status, Some(500));
            assert_eq!(message, "HTTP 500: boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn http_remote_times_out_as_remote_failure() {
    let (base, server) = one_shot_server(None).await;
    let remote = http_remote(base, 1);

    let rec = record(OperationKind::Create, Entity::Defect, json!({}));
    let err = remote
        .call(RemoteRequest::for_record(&rec).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::RemoteCallFailed { status: None, .. }));
    server.abort();
}

#[tokio::test]
async fn http_remote_unreachable_is_remote_failure() {
    // Bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let remote = http_remote(format!("http://{addr}/api"), 2);
    let rec = record(OperationKind::Create, Entity::Defect, json!({}));
    let err = remote
        .call(RemoteRequest::for_record(&rec).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::RemoteCallFailed { status: None, .. }));
}

#[test]
fn url_for_joins_base_and_path() {
    let remote = http_remote("http://localhost:8080/api/".to_string(), 5);
    assert_eq!(remote.url_for("/defects"), "http://localhost:8080/api/defects");
}
