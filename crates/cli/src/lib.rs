// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! mes_sync_cli - Command line front end for the MES offline sync queue.
//!
//! Every command opens the local store named by the config (or `--db`):
//!
//! - `enqueue` - queue a mutation, no network activity
//! - `list`, `status` - inspect the queue
//! - `drain` - push pending records once
//! - `recover` - reset records interrupted mid-sync
//! - `run` - keep syncing until Ctrl-C

mod cli;
mod commands;
mod display;
mod logging;

pub mod error;
pub mod settings;

pub use cli::{Cli, Command, GlobalArgs, OperationArg, OutputFormat, StatusArg};
pub use error::{Error, Result};
pub use logging::setup_logging;

/// Log level used when `RUST_LOG` is unset.
///
/// One-shot commands stay quiet; `run` reports its activity.
pub fn default_log_level(command: &Command) -> &'static str {
    match command {
        Command::Run { .. } => "info",
        _ => "warn",
    }
}

/// Execute a CLI command.
pub fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Command::Enqueue {
            operation,
            entity,
            payload,
            resource,
        } => commands::enqueue::run(
            &global,
            operation.into(),
            &entity,
            &payload,
            resource.as_deref(),
        ),
        Command::List { status, output } => {
            commands::list::run(&global, status.map(Into::into), output)
        }
        Command::Status { output } => commands::status::run(&global, output),
        Command::Drain { output } => commands::drain::run(&global, output),
        Command::Recover => commands::recover::run(&global),
        Command::Run { .. } => commands::run::run(&global),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
