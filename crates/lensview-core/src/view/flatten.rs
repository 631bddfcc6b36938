//! Flatten a normalized lens into node and link lists for rendering.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::graph::{Lens, Node, Risk, Uid};

/// A node as the rendering surface sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: Uid,
    /// Primary type tag.
    pub node_type: String,
    pub dgraph_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Scalar attributes.
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<Risk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicates: Option<Map<String, Value>>,
}

impl GraphNode {
    pub fn from_node(node: &Node) -> Self {
        Self {
            id: node.uid,
            node_type: node.primary_type().unwrap_or_default().to_string(),
            dgraph_type: node.dgraph_type.clone(),
            display: node.display.clone(),
            properties: node
                .values()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
            risks: node.risks.clone(),
            predicates: node.predicates.clone(),
        }
    }

    /// Display string, falling back to `Type#id`.
    pub fn label(&self) -> String {
        self.display
            .clone()
            .unwrap_or_else(|| format!("{}#{}", self.node_type, self.id))
    }
}

/// A directed, named edge between two rendered nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: Uid,
    pub target: Uid,
    /// Predicate the edge came from.
    pub name: String,
}

/// One flattened lens: the unit the merge engine consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub lens_name: String,
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl GraphSnapshot {
    /// Flatten a lens scope.
    ///
    /// Node ids are unique in the result (first occurrence wins) and every
    /// link resolves to a node of the snapshot.
    pub fn from_lens(lens: &Lens) -> Self {
        let mut seen = HashSet::new();
        let nodes: Vec<GraphNode> = lens
            .scope
            .iter()
            .filter(|node| seen.insert(node.uid))
            .map(GraphNode::from_node)
            .collect();

        let mut seen_links = HashSet::new();
        let links = lens
            .scope
            .iter()
            .flat_map(|node| {
                node.edges().map(move |(name, target)| GraphLink {
                    source: node.uid,
                    target: target.uid,
                    name: name.to_string(),
                })
            })
            .filter(|link| seen.contains(&link.target))
            .filter(|link| seen_links.insert(link.clone()))
            .collect();

        Self {
            lens_name: lens.lens_name.clone(),
            nodes,
            links,
        }
    }
}
