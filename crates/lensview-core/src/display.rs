//! Display-name lookup.
//!
//! Maps an entity type to the attribute whose value should be shown as the
//! node's label. The lookup is decoration: a failure leaves the node without
//! a `display` field and never fails scoping.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from a display-name backend.
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Display lookup failed: {0}")]
    Lookup(String),
}

/// Source of display attribute names per entity type.
#[async_trait]
pub trait DisplayLookup: Send + Sync {
    /// Name of the attribute to display for `node_type`, if one is known.
    async fn display_property(&self, node_type: &str) -> Result<Option<String>, DisplayError>;
}

/// Lookup that never knows a display property.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDisplayLookup;

#[async_trait]
impl DisplayLookup for NoDisplayLookup {
    async fn display_property(&self, _node_type: &str) -> Result<Option<String>, DisplayError> {
        Ok(None)
    }
}

/// Lookup backed by a fixed type -> attribute table (from configuration).
#[derive(Debug, Default, Clone)]
pub struct StaticDisplayLookup {
    properties: BTreeMap<String, String>,
}

impl StaticDisplayLookup {
    pub fn new(properties: BTreeMap<String, String>) -> Self {
        Self { properties }
    }
}

#[async_trait]
impl DisplayLookup for StaticDisplayLookup {
    async fn display_property(&self, node_type: &str) -> Result<Option<String>, DisplayError> {
        Ok(self.properties.get(node_type).cloned())
    }
}

/// Render a scalar attribute as display text.
///
/// Strings are used as-is, numbers and booleans are formatted, anything else
/// has no display form.
pub fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
