//! Render-layer state keyed by node id.
//!
//! Layout positions, pins and highlight sets live here instead of on the
//! model's nodes, so the merge engine and the renderer never write to the
//! same objects.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::flatten::{GraphLink, GraphNode};
use super::merge::GraphModel;
use crate::graph::Uid;

/// A 2D layout position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct NodeState {
    position: Option<Position>,
    pinned: bool,
}

/// Per-node render state plus hover and selection.
#[derive(Debug, Clone, Default)]
pub struct RenderOverlay {
    nodes: HashMap<Uid, NodeState>,
    hovered: Option<Uid>,
    selected: Option<Uid>,
    highlight_nodes: HashSet<Uid>,
    highlight_links: HashSet<GraphLink>,
}

impl RenderOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a layout position. Pinned nodes keep their position.
    pub fn set_position(&mut self, id: Uid, position: Position) {
        let state = self.nodes.entry(id).or_default();
        if !state.pinned {
            state.position = Some(position);
        }
    }

    pub fn position(&self, id: Uid) -> Option<Position> {
        self.nodes.get(&id).and_then(|s| s.position)
    }

    pub fn is_pinned(&self, id: Uid) -> bool {
        self.nodes.get(&id).map(|s| s.pinned).unwrap_or(false)
    }

    /// A dragged node stays where it was dropped.
    pub fn drag_end(&mut self, id: Uid, position: Position) {
        let state = self.nodes.entry(id).or_default();
        state.position = Some(position);
        state.pinned = true;
    }

    /// Clicking releases the pin, selects the node and highlights it.
    ///
    /// Returns the clicked node when it exists in `model`.
    pub fn click(&mut self, model: &GraphModel, id: Uid) -> Option<Arc<GraphNode>> {
        let node = model.node(id)?.clone();
        if let Some(state) = self.nodes.get_mut(&id) {
            state.pinned = false;
        }
        self.selected = Some(id);
        self.hover_node(model, Some(id));
        Some(node)
    }

    /// Highlight a node, its neighbors and its links. `None` clears.
    pub fn hover_node(&mut self, model: &GraphModel, id: Option<Uid>) {
        self.highlight_nodes.clear();
        self.highlight_links.clear();
        self.hovered = None;

        let Some(id) = id.filter(|id| model.contains(*id)) else {
            return;
        };
        self.hovered = Some(id);
        self.highlight_nodes.insert(id);
        self.highlight_nodes.extend(model.neighbors(id));
        self.highlight_links.extend(model.links_of(id).cloned());
    }

    /// Highlight a link and both of its ends. `None` clears.
    pub fn hover_link(&mut self, link: Option<&GraphLink>) {
        self.highlight_nodes.clear();
        self.highlight_links.clear();

        if let Some(link) = link {
            self.highlight_links.insert(link.clone());
            self.highlight_nodes.insert(link.source);
            self.highlight_nodes.insert(link.target);
        }
    }

    pub fn hovered(&self) -> Option<Uid> {
        self.hovered
    }

    pub fn selected(&self) -> Option<Uid> {
        self.selected
    }

    pub fn is_highlighted(&self, id: Uid) -> bool {
        self.highlight_nodes.contains(&id)
    }

    pub fn is_link_highlighted(&self, link: &GraphLink) -> bool {
        self.highlight_links.contains(link)
    }

    /// Forget state for nodes that left the model (after a lens switch).
    pub fn retain_model(&mut self, model: &GraphModel) {
        self.nodes.retain(|id, _| model.contains(*id));
        self.highlight_nodes.retain(|id| model.contains(*id));
        self.highlight_links
            .retain(|l| model.contains(l.source) && model.contains(l.target));
        if self.hovered.is_some_and(|id| !model.contains(id)) {
            self.hovered = None;
        }
        if self.selected.is_some_and(|id| !model.contains(id)) {
            self.selected = None;
        }
    }
}
