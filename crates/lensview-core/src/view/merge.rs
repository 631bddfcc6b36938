//! Incremental graph merge.
//!
//! The model folds successive snapshots of the same lens by identity: nodes
//! by uid, links by `(source, target, name)`. Nodes already in the model are
//! never replaced, so anything keyed on them (layout, selection) survives a
//! refresh. A snapshot for a different lens replaces the model outright.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::flatten::{GraphLink, GraphNode, GraphSnapshot};
use crate::graph::Uid;

/// What [`GraphModel::apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No update was available; the model is untouched.
    Unchanged,
    /// The lens changed and the model now equals the snapshot.
    Replaced { nodes: usize, links: usize },
    /// Same lens; unseen nodes and links were appended.
    Merged { added_nodes: usize, added_links: usize },
}

impl MergeOutcome {
    /// Whether the model differs from before.
    pub fn changed(&self) -> bool {
        match self {
            MergeOutcome::Unchanged => false,
            MergeOutcome::Replaced { .. } => true,
            MergeOutcome::Merged {
                added_nodes,
                added_links,
            } => *added_nodes > 0 || *added_links > 0,
        }
    }
}

/// Client-resident graph for one lens.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    lens_name: Option<String>,
    nodes: Vec<Arc<GraphNode>>,
    links: Vec<GraphLink>,
    index: HashMap<Uid, usize>,
    link_keys: HashSet<GraphLink>,
}

impl GraphModel {
    /// A model with no lens.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A model holding exactly `snapshot`.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut model = Self {
            lens_name: Some(snapshot.lens_name),
            ..Self::default()
        };
        for node in snapshot.nodes {
            model.insert_node(node);
        }
        for link in snapshot.links {
            model.insert_link(link);
        }
        model
    }

    /// Fold `update` into the model, or replace the model when the update
    /// belongs to another lens.
    pub fn apply(&mut self, update: Option<GraphSnapshot>) -> MergeOutcome {
        let Some(snapshot) = update else {
            return MergeOutcome::Unchanged;
        };

        if self.lens_name.as_deref() != Some(snapshot.lens_name.as_str()) {
            *self = Self::from_snapshot(snapshot);
            return MergeOutcome::Replaced {
                nodes: self.nodes.len(),
                links: self.links.len(),
            };
        }

        let added_nodes = snapshot
            .nodes
            .into_iter()
            .map(|node| self.insert_node(node))
            .filter(|added| *added)
            .count();
        let added_links = snapshot
            .links
            .into_iter()
            .map(|link| self.insert_link(link))
            .filter(|added| *added)
            .count();

        MergeOutcome::Merged {
            added_nodes,
            added_links,
        }
    }

    /// Drop everything, including the lens name.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn insert_node(&mut self, node: GraphNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id, self.nodes.len());
        self.nodes.push(Arc::new(node));
        true
    }

    fn insert_link(&mut self, link: GraphLink) -> bool {
        // Links must resolve to nodes of the model.
        if !self.index.contains_key(&link.source) || !self.index.contains_key(&link.target) {
            return false;
        }
        if !self.link_keys.insert(link.clone()) {
            return false;
        }
        self.links.push(link);
        true
    }

    pub fn lens_name(&self) -> Option<&str> {
        self.lens_name.as_deref()
    }

    pub fn nodes(&self) -> &[Arc<GraphNode>] {
        &self.nodes
    }

    pub fn links(&self) -> &[GraphLink] {
        &self.links
    }

    pub fn node(&self, id: Uid) -> Option<&Arc<GraphNode>> {
        self.index.get(&id).and_then(|&i| self.nodes.get(i))
    }

    pub fn contains(&self, id: Uid) -> bool {
        self.index.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Links touching `id` in either direction.
    pub fn links_of(&self, id: Uid) -> impl Iterator<Item = &GraphLink> + '_ {
        self.links
            .iter()
            .filter(move |l| l.source == id || l.target == id)
    }

    /// Nodes adjacent to `id` in either direction.
    pub fn neighbors(&self, id: Uid) -> HashSet<Uid> {
        self.links_of(id)
            .map(|l| if l.source == id { l.target } else { l.source })
            .collect()
    }
}

impl Serialize for GraphModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nodes: Vec<&GraphNode> = self.nodes.iter().map(Arc::as_ref).collect();
        let mut state = serializer.serialize_struct("GraphModel", 3)?;
        state.serialize_field("lens_name", &self.lens_name)?;
        state.serialize_field("nodes", &nodes)?;
        state.serialize_field("links", &self.links)?;
        state.end()
    }
}
