//! Client-side view of the active lens.
//!
//! - [`flatten`] - lens -> node/link snapshot
//! - [`merge`] - identity-preserving merge into the [`GraphModel`]
//! - [`overlay`] - render state keyed by node id
//! - [`fetch`] - where snapshots come from
//! - [`poll`] - the interval-driven controller tying them together

pub mod fetch;
pub mod flatten;
pub mod merge;
pub mod overlay;
pub mod poll;

pub use fetch::{FetchError, HttpScopeFetcher, ScopeFetcher};
pub use flatten::{GraphLink, GraphNode, GraphSnapshot};
pub use merge::{GraphModel, MergeOutcome};
pub use overlay::{Position, RenderOverlay};
pub use poll::{LensView, SelectionCallback};
