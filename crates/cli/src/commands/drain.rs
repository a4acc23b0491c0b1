// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use mes_sync::{Dispatcher, DrainOutcome, HttpRemote, NetworkState, SkipReason, SyncEngine};
use serde::Serialize;

use crate::cli::{GlobalArgs, OutputFormat};
use crate::display::format_report;
use crate::error::Result;
use crate::settings;

use super::{open_locked_queue, runtime};

/// JSON output for the drain command.
#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum DrainJson {
    Completed {
        #[serde(flatten)]
        report: mes_sync::DrainReport,
    },
    Skipped {
        reason: SkipReason,
    },
}

pub fn run(global: &GlobalArgs, output: OutputFormat) -> Result<()> {
    let config = settings::load(global)?;
    let (queue, _lock) = open_locked_queue(&config)?;
    let remote = HttpRemote::new(&config)?;
    let engine = SyncEngine::new(queue, Dispatcher::new(remote), NetworkState::new(true))
        .with_max_retries(config.max_retries);

    let outcome = runtime()?.block_on(engine.drain())?;

    let json = match outcome {
        DrainOutcome::Completed(report) => DrainJson::Completed { report },
        DrainOutcome::Skipped(reason) => DrainJson::Skipped { reason },
    };
    match (output, &json) {
        (OutputFormat::Json, _) => println!("{}", serde_json::to_string_pretty(&json)?),
        (OutputFormat::Text, DrainJson::Completed { report }) => {
            println!("{}", format_report(report))
        }
        (OutputFormat::Text, DrainJson::Skipped { reason }) => match reason {
            SkipReason::Offline => println!("skipped: offline"),
            SkipReason::AlreadyRunning => println!("skipped: a drain is already running"),
        },
    }
    Ok(())
}

#[cfg(test)]
#[path = "drain_tests.rs"]
mod tests;
