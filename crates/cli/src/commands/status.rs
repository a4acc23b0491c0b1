// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::cli::{GlobalArgs, OutputFormat};
use crate::display::format_counts;
use crate::error::Result;
use crate::settings;

use super::open_queue;

pub fn run(global: &GlobalArgs, output: OutputFormat) -> Result<()> {
    let config = settings::load(global)?;
    let counts = open_queue(&config)?.status_counts()?;

    match output {
        OutputFormat::Text => println!("{}", format_counts(&counts)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&counts)?),
    }
    Ok(())
}
