// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::cli::GlobalArgs;
use crate::error::Result;
use crate::settings;

use super::open_locked_queue;

pub fn run(global: &GlobalArgs) -> Result<()> {
    let config = settings::load(global)?;
    // Refuses while a drain or sync loop holds the store
    let (queue, _lock) = open_locked_queue(&config)?;
    let recovered = queue.recover_interrupted()?;
    println!(
        "recovered {} record{}",
        recovered,
        if recovered == 1 { "" } else { "s" }
    );
    Ok(())
}

#[cfg(test)]
#[path = "recover_tests.rs"]
mod tests;
