//! Normalized graph model produced by the scoper.
//!
//! On the wire an [`Attribute`] keeps Dgraph's shape: a scalar, an object for
//! a single edge, or an array of objects for an edge list. In memory it is
//! always one of the three tagged variants.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::primary_type;
use super::uid::Uid;

/// A referenced node as seen from the edge's owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRef {
    pub uid: Uid,
    #[serde(default)]
    pub dgraph_type: Vec<String>,
    /// Scalar properties of the referenced node.
    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

impl NodeRef {
    pub fn new(uid: Uid, dgraph_type: Vec<String>) -> Self {
        Self {
            uid,
            dgraph_type,
            properties: BTreeMap::new(),
        }
    }
}

/// A named attribute on a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Attribute {
    /// Scalar or opaque value.
    Value(Value),
    /// 1-to-1 edge.
    Edge(NodeRef),
    /// 1-to-many edge, never empty.
    Edges(Vec<NodeRef>),
}

impl Attribute {
    /// Referenced nodes, empty for values.
    pub fn targets(&self) -> &[NodeRef] {
        match self {
            Attribute::Value(_) => &[],
            Attribute::Edge(target) => std::slice::from_ref(target),
            Attribute::Edges(targets) => targets,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Attribute::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Attribute {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Already-normalized JSON: objects are edges, arrays of objects are
        // edge lists, everything else is a value.
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Object(_) => serde_json::from_value(value)
                .map(Attribute::Edge)
                .map_err(de::Error::custom),
            Value::Array(ref items) if !items.is_empty() && items.iter().all(Value::is_object) => {
                serde_json::from_value(value)
                    .map(Attribute::Edges)
                    .map_err(de::Error::custom)
            }
            other => Ok(Attribute::Value(other)),
        }
    }
}

/// A risk annotation attached to an entity by an analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub uid: Uid,
    pub dgraph_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<i64>,
}

/// An in-scope entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub uid: Uid,
    /// Filtered type tags, never empty.
    pub dgraph_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<Risk>,
    /// Display string chosen by the display lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Opaque copy of the node for plugin-defined types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicates: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Attribute>,
}

impl Node {
    pub fn new(uid: Uid, dgraph_type: Vec<String>) -> Self {
        Self {
            uid,
            dgraph_type,
            risks: Vec::new(),
            display: None,
            predicates: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn primary_type(&self) -> Option<&str> {
        primary_type(&self.dgraph_type)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Every outgoing edge as `(predicate, target)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &NodeRef)> + '_ {
        self.attributes
            .iter()
            .flat_map(|(name, attr)| attr.targets().iter().map(move |t| (name.as_str(), t)))
    }

    /// Scalar attributes only.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.attributes
            .iter()
            .filter_map(|(name, attr)| attr.as_value().map(|v| (name.as_str(), v)))
    }
}

/// A lens with its normalized scope: one graph snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    pub uid: Uid,
    pub lens_name: String,
    #[serde(default)]
    pub dgraph_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default)]
    pub scope: Vec<Node>,
}

impl Lens {
    /// Look up a scope member.
    pub fn node(&self, uid: Uid) -> Option<&Node> {
        self.scope.iter().find(|n| n.uid == uid)
    }
}

/// Shallow scope member returned with a lens listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeRef {
    pub uid: Uid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_key: Option<String>,
    pub dgraph_type: Vec<String>,
}

/// Entry of the lens listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LensSummary {
    pub uid: Uid,
    pub lens_name: String,
    #[serde(default)]
    pub dgraph_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default)]
    pub scope: Vec<ScopeRef>,
}
