// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::DateTime;
use mes_core::{StatusCounts, SyncRecord};
use mes_sync::DrainReport;

/// Renders an epoch-millis timestamp as UTC, or the raw number if it is out
/// of range.
pub fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// One line per record: id, status, operation, entity, retries, time.
///
/// The last error follows on an indented line when present.
pub fn format_record_line(record: &SyncRecord) -> String {
    let mut line = format!(
        "{}  {:<7}  {:<6}  {}  retries={}  {}",
        record.id,
        record.status.as_str(),
        record.operation.as_str(),
        record.entity,
        record.retry_count,
        format_timestamp(record.timestamp),
    );
    if let Some(error) = &record.last_error {
        line.push_str("\n    last error: ");
        line.push_str(error);
    }
    line
}

pub fn format_counts(counts: &StatusCounts) -> String {
    format!(
        "pending: {}\nsyncing: {}\nfailed:  {}\ntotal:   {}",
        counts.pending,
        counts.syncing,
        counts.failed,
        counts.total()
    )
}

pub fn format_report(report: &DrainReport) -> String {
    format!(
        "synced {}, retried {}, parked {}, skipped {}",
        report.synced, report.retried, report.parked, report.skipped
    )
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
