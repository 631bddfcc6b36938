//! Raw Dgraph response shapes.
//!
//! These mirror what the queries in [`super::client`] return: hexadecimal
//! uids, unfiltered type lists and untyped predicate maps. Nothing outside
//! the scoper and the resolver should see them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope of a Dgraph HTTP query response.
#[derive(Debug, Deserialize)]
pub struct DgraphResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<DgraphErrorMessage>,
}

/// One entry of the `errors` array.
#[derive(Debug, Deserialize)]
pub struct DgraphErrorMessage {
    pub message: String,
}

/// Result block named `all` used by both queries.
#[derive(Debug, Deserialize)]
pub struct AllBlock<T> {
    #[serde(default)]
    pub all: Vec<T>,
}

/// A lens node with its expanded scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLens {
    pub uid: String,
    #[serde(default)]
    pub dgraph_type: Vec<String>,
    #[serde(default)]
    pub node_key: Option<String>,
    #[serde(default)]
    pub lens_name: String,
    #[serde(default)]
    pub lens_type: Option<String>,
    #[serde(default)]
    pub score: Option<Value>,
    /// Absent when the lens has no scope.
    #[serde(default)]
    pub scope: Option<Vec<RawNode>>,
}

/// A scope member with its one-hop neighborhood.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawNode {
    pub uid: String,
    #[serde(default)]
    pub dgraph_type: Vec<String>,
    /// Every other predicate as returned by `expand(_all_)`.
    #[serde(flatten)]
    pub predicates: Map<String, Value>,
}

/// A lens as returned by the listing query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLensSummary {
    pub uid: String,
    #[serde(default)]
    pub dgraph_type: Vec<String>,
    #[serde(default)]
    pub node_key: Option<String>,
    #[serde(default)]
    pub lens_name: String,
    #[serde(default)]
    pub lens_type: Option<String>,
    #[serde(default)]
    pub score: Option<Value>,
    #[serde(default)]
    pub scope: Option<Vec<RawScopeRef>>,
}

/// Shallow scope member of the listing query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawScopeRef {
    pub uid: String,
    #[serde(default)]
    pub node_key: Option<String>,
    #[serde(default)]
    pub dgraph_type: Vec<String>,
}

/// Read a numeric score that Dgraph may hand back as int or float.
pub fn score_of(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64))
}
