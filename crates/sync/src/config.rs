// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync configuration.
//!
//! Loaded from a TOML file; every key is optional:
//!
//! ```toml
//! api_base_url = "https://mes.example.com/api"
//! token = "..."
//! tenant_id = "plant-7"
//! request_timeout_secs = 30
//! max_retries = 3
//! sync_interval_secs = 300
//! db_path = "/var/lib/mes-sync/offline.db"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::DEFAULT_MAX_RETRIES;
use crate::error::{Error, Result};

const DB_DIR_NAME: &str = "mes-sync";
const DB_FILE_NAME: &str = "offline.db";

/// Configuration for the sync subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the MES REST API, including the `/api` prefix.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Bearer token attached to every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Tenant identifier sent as the `X-Tenant-ID` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// HTTP request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Failed attempts tolerated before a record is parked (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Periodic drain interval in seconds (default: 300).
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    /// Location of the local store. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_sync_interval_secs() -> u64 {
    300
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            api_base_url: default_api_base_url(),
            token: None,
            tenant_id: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            sync_interval_secs: default_sync_interval_secs(),
            db_path: None,
        }
    }
}

impl SyncConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Loads configuration, falling back to defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: SyncConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(Error::Config("api_base_url cannot be empty".to_string()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::Config(format!(
                "invalid api_base_url '{}': must start with http:// or https://",
                url
            )));
        }
        if self.sync_interval_secs == 0 {
            return Err(Error::Config(
                "sync_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    /// Returns the configured store path or the platform default.
    pub fn resolved_db_path(&self) -> PathBuf {
        if let Some(path) = &self.db_path {
            return path.clone();
        }
        dirs::data_local_dir()
            .map(|d| d.join(DB_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(".").join(DB_DIR_NAME))
            .join(DB_FILE_NAME)
    }
}
