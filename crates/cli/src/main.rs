// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use clap::Parser;
use mes_sync_cli::{default_log_level, setup_logging, Cli, Command};

fn main() {
    let cli = Cli::parse();
    let log_file = match &cli.command {
        Command::Run { log_file } => log_file.clone(),
        _ => None,
    };
    setup_logging(log_file.as_deref(), default_log_level(&cli.command));

    if let Err(e) = mes_sync_cli::run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
