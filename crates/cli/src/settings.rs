// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Config file lookup for the command line.
//!
//! `--config` wins, then `$MES_SYNC_CONFIG`, then `mes-sync.toml` in the
//! current directory. A file named explicitly must exist; the default file is
//! optional.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use mes_sync::SyncConfig;

use crate::cli::GlobalArgs;
use crate::error::Result;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MES_SYNC_CONFIG";

/// Config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "mes-sync.toml";

/// Where the config comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named by flag or environment; missing is an error.
    Explicit(PathBuf),
    /// Conventional location; missing means defaults.
    Default(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Explicit(p) | ConfigSource::Default(p) => p,
        }
    }
}

/// Picks the config file from the flag and environment value.
pub fn config_source(flag: Option<&Path>, env: Option<OsString>) -> ConfigSource {
    if let Some(path) = flag {
        return ConfigSource::Explicit(path.to_path_buf());
    }
    match env {
        Some(value) if !value.is_empty() => ConfigSource::Explicit(PathBuf::from(value)),
        _ => ConfigSource::Default(PathBuf::from(DEFAULT_CONFIG_FILE)),
    }
}

/// Loads the effective configuration for a command.
pub fn load(global: &GlobalArgs) -> Result<SyncConfig> {
    let source = config_source(global.config.as_deref(), std::env::var_os(CONFIG_ENV));
    let mut config = match &source {
        ConfigSource::Explicit(path) => SyncConfig::load(path)?,
        ConfigSource::Default(path) => SyncConfig::load_or_default(path)?,
    };
    if let Some(db) = &global.db {
        config.db_path = Some(db.clone());
    }
    tracing::debug!(
        config = %source.path().display(),
        db = %config.resolved_db_path().display(),
        "loaded config"
    );
    Ok(config)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
