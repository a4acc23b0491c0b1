// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use mes_core::{Entity, OperationKind};
use serde_json::Value;

use crate::cli::GlobalArgs;
use crate::error::{Error, Result};
use crate::settings;

use super::open_queue;

/// Parses a payload argument. Only JSON objects are accepted.
pub(crate) fn parse_payload(raw: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| Error::InvalidPayload(e.to_string()))?;
    if !value.is_object() {
        return Err(Error::InvalidPayload(format!(
            "expected a JSON object, got {}",
            raw.trim()
        )));
    }
    Ok(value)
}

pub fn run(
    global: &GlobalArgs,
    operation: OperationKind,
    entity: &str,
    payload: &str,
    resource: Option<&str>,
) -> Result<()> {
    let payload = parse_payload(payload)?;
    let entity = Entity::from_parts(entity, resource)?;
    let config = settings::load(global)?;
    let queue = open_queue(&config)?;

    let id = queue.enqueue(operation, entity, payload)?;
    println!("{}", id);
    Ok(())
}

#[cfg(test)]
#[path = "enqueue_tests.rs"]
mod tests;
