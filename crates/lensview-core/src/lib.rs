pub mod api;
pub mod config;
pub mod dgraph;
pub mod display;
pub mod graph;
pub mod scope;
pub mod view;

pub use api::{ApiError, LensResolver};
pub use config::{ApiConfig, Config, ConfigError, DgraphConfig, DisplayConfig, PollConfig, ServeConfig};
pub use dgraph::{DgraphClient, GraphDbError, GraphSource};
pub use display::{DisplayError, DisplayLookup, NoDisplayLookup, StaticDisplayLookup};
pub use graph::{Attribute, Lens, LensSummary, Node, NodeRef, Risk, Schema, Uid};
pub use scope::{normalize_lens, ScopeDiagnostics, ScopeError, ScopedLens, SubgraphScoper};
pub use view::{
    GraphLink, GraphModel, GraphNode, GraphSnapshot, HttpScopeFetcher, LensView, MergeOutcome,
    RenderOverlay, ScopeFetcher,
};
