// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for config file lookup.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mes_sync(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("mes-sync");
    cmd.current_dir(temp.path())
        .env_remove("MES_SYNC_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn db_path_from_config_file_in_cwd() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("mes-sync.toml"), "db_path = \"queue/from-config.db\"\n").unwrap();

    mes_sync(&temp)
        .args(["enqueue", "create", "DEFECT", "{}"])
        .assert()
        .success();

    assert!(temp.path().join("queue/from-config.db").exists());
}

#[test]
fn config_from_environment() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("elsewhere.toml");
    std::fs::write(&config, "db_path = \"env.db\"\n").unwrap();

    mes_sync(&temp)
        .env("MES_SYNC_CONFIG", &config)
        .args(["enqueue", "create", "DEFECT", "{}"])
        .assert()
        .success();

    assert!(temp.path().join("env.db").exists());
}

#[test]
fn db_flag_overrides_config() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("mes-sync.toml"), "db_path = \"from-config.db\"\n").unwrap();

    mes_sync(&temp)
        .args(["status", "--db", "flag.db"])
        .assert()
        .success();

    assert!(temp.path().join("flag.db").exists());
    assert!(!temp.path().join("from-config.db").exists());
}

#[test]
fn missing_explicit_config_fails() {
    let temp = TempDir::new().unwrap();
    mes_sync(&temp)
        .args(["status", "--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn invalid_config_fails() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("mes-sync.toml"), "api_base_url = \"ftp://x\"\n").unwrap();

    mes_sync(&temp)
        .args(["status", "--db", "q.db"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("api_base_url"));
}
