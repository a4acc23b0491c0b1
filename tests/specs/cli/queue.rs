// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for the queue commands: enqueue, list, status, recover, drain.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Command with an isolated store and no ambient config.
fn mes_sync(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("mes-sync");
    cmd.current_dir(temp.path())
        .env_remove("MES_SYNC_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(temp.path().join("offline.db"));
    cmd
}

fn enqueue(temp: &TempDir, args: &[&str]) -> String {
    let output = mes_sync(temp).arg("enqueue").args(args).output().unwrap();
    assert!(
        output.status.success(),
        "enqueue failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn list_json(temp: &TempDir, extra: &[&str]) -> Vec<Value> {
    let output = mes_sync(temp)
        .args(["list", "-o", "json"])
        .args(extra)
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// enqueue
// =============================================================================

#[test]
fn enqueue_prints_record_id() {
    let temp = TempDir::new().unwrap();
    let id = enqueue(&temp, &["create", "DEFECT", r#"{"id": 42, "description": "crack"}"#]);

    let (ts, suffix) = id.split_once('-').unwrap();
    assert!(ts.parse::<i64>().is_ok(), "timestamp prefix in {id}");
    assert_eq!(suffix.len(), 9);
}

#[test]
fn enqueue_identical_payloads_gives_distinct_records() {
    let temp = TempDir::new().unwrap();
    let a = enqueue(&temp, &["create", "DEFECT", "{}"]);
    let b = enqueue(&temp, &["create", "DEFECT", "{}"]);

    assert_ne!(a, b);
    assert_eq!(list_json(&temp, &[]).len(), 2);
}

#[test]
fn enqueue_rejects_non_object_payload() {
    let temp = TempDir::new().unwrap();
    mes_sync(&temp)
        .args(["enqueue", "create", "DEFECT", "[1,2]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid payload"));
}

#[test]
fn enqueue_rejects_unknown_operation() {
    let temp = TempDir::new().unwrap();
    mes_sync(&temp)
        .args(["enqueue", "upsert", "DEFECT", "{}"])
        .assert()
        .failure();
}

#[test]
fn enqueue_keeps_resource_override() {
    let temp = TempDir::new().unwrap();
    enqueue(
        &temp,
        &["update", "GAUGE", r#"{"id": 3}"#, "--resource", "/metrology/gauges/"],
    );

    let records = list_json(&temp, &[]);
    assert_eq!(records[0]["entity"]["tag"], "GAUGE");
    assert_eq!(records[0]["entity"]["resource"], "metrology/gauges");
}

// =============================================================================
// list / status
// =============================================================================

#[test]
fn list_empty_store() {
    let temp = TempDir::new().unwrap();
    mes_sync(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn list_shows_records_oldest_first() {
    let temp = TempDir::new().unwrap();
    let first = enqueue(&temp, &["create", "WORK_ORDER", r#"{"qty": 1}"#]);
    let second = enqueue(&temp, &["update", "WORK_ORDER", r#"{"id": "wo-1"}"#]);

    let output = mes_sync(&temp).arg("list").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(&first));
    assert!(lines[1].starts_with(&second));
    assert!(lines[0].contains("pending"));
    assert!(lines[0].contains("WORK_ORDER"));
}

#[test]
fn list_json_has_record_fields() {
    let temp = TempDir::new().unwrap();
    let id = enqueue(&temp, &["delete", "DEFECT", r#"{"id": 42}"#]);

    let records = list_json(&temp, &[]);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record["id"], id.as_str());
    assert_eq!(record["operation"], "delete");
    assert_eq!(record["status"], "pending");
    assert_eq!(record["retry_count"], 0);
    assert_eq!(record["payload"]["id"], 42);
}

#[test]
fn list_filters_by_status() {
    let temp = TempDir::new().unwrap();
    enqueue(&temp, &["create", "DEFECT", "{}"]);

    assert_eq!(list_json(&temp, &["--status", "pending"]).len(), 1);
    assert!(list_json(&temp, &["--status", "failed"]).is_empty());
}

#[test]
fn status_counts_records() {
    let temp = TempDir::new().unwrap();
    enqueue(&temp, &["create", "DEFECT", "{}"]);
    enqueue(&temp, &["create", "DEFECT", "{}"]);

    mes_sync(&temp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("pending: 2"))
        .stdout(predicate::str::contains("total:   2"));

    let output = mes_sync(&temp)
        .args(["status", "-o", "json"])
        .output()
        .unwrap();
    let counts: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(counts["pending"], 2);
    assert_eq!(counts["failed"], 0);
}

// =============================================================================
// recover / drain
// =============================================================================

#[test]
fn recover_with_nothing_interrupted() {
    let temp = TempDir::new().unwrap();
    enqueue(&temp, &["create", "DEFECT", "{}"]);

    mes_sync(&temp)
        .arg("recover")
        .assert()
        .success()
        .stdout("recovered 0 records\n");
}

#[test]
fn drain_against_unreachable_remote_retries_records() {
    let temp = TempDir::new().unwrap();
    // Port 9 (discard) on localhost refuses connections
    std::fs::write(
        temp.path().join("mes-sync.toml"),
        "api_base_url = \"http://127.0.0.1:9/api\"\nrequest_timeout_secs = 2\n",
    )
    .unwrap();
    let id = enqueue(&temp, &["create", "DEFECT", r#"{"id": 42}"#]);

    mes_sync(&temp)
        .arg("drain")
        .assert()
        .success()
        .stdout(predicate::str::contains("synced 0, retried 1"));

    let records = list_json(&temp, &[]);
    assert_eq!(records[0]["id"], id.as_str());
    assert_eq!(records[0]["status"], "pending");
    assert_eq!(records[0]["retry_count"], 1);
    assert!(records[0]["last_error"]
        .as_str()
        .unwrap()
        .starts_with("remote call failed"));
}

#[test]
fn drain_empty_queue_json() {
    let temp = TempDir::new().unwrap();
    let output = mes_sync(&temp)
        .args(["drain", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["outcome"], "completed");
    assert_eq!(report["synced"], 0);
}
