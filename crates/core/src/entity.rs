// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Entity tags carried by queued mutations.
//!
//! Known shop-floor entities map to fixed remote resources. Any other tag is
//! kept as [`Entity::Other`], which either names its resource explicitly or
//! falls back to the naming convention: lower-case, words joined by `-`, last
//! word pluralised (`CUSTOM_WIDGET` -> `custom-widgets`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The logical business object a queued mutation concerns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "EntityRepr", try_from = "EntityRepr")]
pub enum Entity {
    WorkOrder,
    Defect,
    ProcedureStep,
    ProductionResult,
    /// An entity without a dedicated route.
    Other {
        tag: String,
        /// Explicit resource path; `None` uses the naming convention.
        resource: Option<String>,
    },
}

impl Entity {
    /// Parses an entity tag. Known tags are matched case-insensitively.
    pub fn from_tag(tag: &str) -> Result<Self> {
        Self::from_parts(tag, None)
    }

    /// Builds an entity from a stored tag and optional resource override.
    ///
    /// The override only applies to tags without a dedicated route.
    pub fn from_parts(tag: &str, resource: Option<&str>) -> Result<Self> {
        let tag = tag.trim();
        // A tag of only separators would map to an empty resource path
        if !tag.chars().any(char::is_alphanumeric) {
            return Err(Error::InvalidEntity(tag.to_string()));
        }
        let entity = match tag.to_ascii_uppercase().as_str() {
            "WORK_ORDER" => Entity::WorkOrder,
            "DEFECT" => Entity::Defect,
            "PROCEDURE_STEP" => Entity::ProcedureStep,
            "PRODUCTION_RESULT" => Entity::ProductionResult,
            _ => Entity::Other {
                tag: tag.to_string(),
                resource: resource
                    .map(|r| r.trim().trim_matches('/').to_string())
                    .filter(|r| !r.is_empty()),
            },
        };
        Ok(entity)
    }

    /// Returns the tag used in storage and display.
    pub fn tag(&self) -> &str {
        match self {
            Entity::WorkOrder => "WORK_ORDER",
            Entity::Defect => "DEFECT",
            Entity::ProcedureStep => "PROCEDURE_STEP",
            Entity::ProductionResult => "PRODUCTION_RESULT",
            Entity::Other { tag, .. } => tag,
        }
    }

    /// Returns the explicit resource override, if any.
    pub fn resource_override(&self) -> Option<&str> {
        match self {
            Entity::Other { resource, .. } => resource.as_deref(),
            _ => None,
        }
    }

    /// Returns the remote resource path, relative to the API base.
    pub fn resource_path(&self) -> String {
        match self {
            Entity::WorkOrder => "work-orders".to_string(),
            Entity::Defect => "defects".to_string(),
            Entity::ProcedureStep => "procedure-steps".to_string(),
            Entity::ProductionResult => "production-results".to_string(),
            Entity::Other { resource: Some(r), .. } => r.clone(),
            Entity::Other { tag, resource: None } => conventional_resource(tag),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for Entity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Entity::from_tag(s)
    }
}

/// Derives a resource path from an entity tag by convention.
pub fn conventional_resource(tag: &str) -> String {
    let lower = tag.to_lowercase();
    let mut words: Vec<&str> = lower
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect();
    let last = match words.pop() {
        Some(w) => pluralize(w),
        None => return String::new(),
    };
    let mut parts: Vec<String> = words.into_iter().map(str::to_string).collect();
    parts.push(last);
    parts.join("-")
}

fn pluralize(word: &str) -> String {
    const SIBILANT: [&str; 5] = ["s", "x", "z", "ch", "sh"];
    if SIBILANT.iter().any(|s| word.ends_with(s)) {
        return format!("{word}es");
    }
    if let Some(stem) = word.strip_suffix('y') {
        let before_vowel = stem.ends_with(['a', 'e', 'i', 'o', 'u']);
        if !stem.is_empty() && !before_vowel {
            return format!("{stem}ies");
        }
    }
    format!("{word}s")
}

#[derive(Serialize, Deserialize)]
struct EntityRepr {
    tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource: Option<String>,
}

impl From<Entity> for EntityRepr {
    fn from(entity: Entity) -> Self {
        EntityRepr {
            resource: entity.resource_override().map(str::to_string),
            tag: entity.tag().to_string(),
        }
    }
}

impl TryFrom<EntityRepr> for Entity {
    type Error = Error;

    fn try_from(repr: EntityRepr) -> Result<Self> {
        Entity::from_parts(&repr.tag, repr.resource.as_deref())
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
