// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use mes_core::SyncStatus;

use crate::cli::{GlobalArgs, OutputFormat};
use crate::display::format_record_line;
use crate::error::Result;
use crate::settings;

use super::open_queue;

pub fn run(global: &GlobalArgs, status: Option<SyncStatus>, output: OutputFormat) -> Result<()> {
    let config = settings::load(global)?;
    let records = open_queue(&config)?.records(status)?;

    match output {
        OutputFormat::Text => {
            for record in &records {
                println!("{}", format_record_line(record));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}
