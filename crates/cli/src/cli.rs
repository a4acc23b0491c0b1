// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Operation kind accepted by `enqueue`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OperationArg {
    Create,
    Update,
    Delete,
}

impl From<OperationArg> for mes_core::OperationKind {
    fn from(arg: OperationArg) -> Self {
        match arg {
            OperationArg::Create => mes_core::OperationKind::Create,
            OperationArg::Update => mes_core::OperationKind::Update,
            OperationArg::Delete => mes_core::OperationKind::Delete,
        }
    }
}

/// Record status accepted by `list --status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Syncing,
    Success,
    Failed,
}

impl From<StatusArg> for mes_core::SyncStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => mes_core::SyncStatus::Pending,
            StatusArg::Syncing => mes_core::SyncStatus::Syncing,
            StatusArg::Success => mes_core::SyncStatus::Success,
            StatusArg::Failed => mes_core::SyncStatus::Failed,
        }
    }
}

const QUICKSTART_HELP: &str = "\
Get started:
  mes-sync enqueue create DEFECT '{\"description\":\"crack\"}'
  mes-sync list                   Show queued records
  mes-sync drain                  Push pending records now
  mes-sync run                    Keep syncing until Ctrl-C";

#[derive(Parser, Debug)]
#[command(name = "mes-sync", version)]
#[command(about = "Offline sync queue for MES shop-floor clients")]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: $MES_SYNC_CONFIG, then ./mes-sync.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Local store path, overriding the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Queue a mutation for delivery
    #[command(after_help = "Examples:\n  \
        mes-sync enqueue create DEFECT '{\"id\":42}'            POST /defects\n  \
        mes-sync enqueue update WORK_ORDER '{\"id\":\"wo-1\"}'    PUT /work-orders/wo-1\n  \
        mes-sync enqueue delete GAUGE '{\"id\":3}' --resource metrology/gauges")]
    Enqueue {
        /// Operation kind
        #[arg(value_enum)]
        operation: OperationArg,

        /// Entity tag (e.g. WORK_ORDER, DEFECT, or any custom tag)
        entity: String,

        /// JSON payload sent to the remote
        payload: String,

        /// Resource path for custom entities, overriding the naming convention
        #[arg(long, value_name = "PATH")]
        resource: Option<String>,
    },

    /// List queued records, oldest first
    List {
        /// Only show records in this status
        #[arg(long, short, value_enum)]
        status: Option<StatusArg>,

        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show record counts per status
    Status {
        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Push pending records to the remote once
    Drain {
        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Return records interrupted mid-sync to pending
    Recover,

    /// Keep syncing on enqueue and on a timer until interrupted
    Run {
        /// Write logs to this file instead of stderr
        #[arg(long, value_name = "PATH")]
        log_file: Option<PathBuf>,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
