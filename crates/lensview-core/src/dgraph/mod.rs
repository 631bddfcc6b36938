//! Graph database access.
//!
//! # Components
//!
//! - [`GraphSource`] - query seam used by the scoper and the resolver
//! - [`DgraphClient`] - HTTP implementation against Dgraph alphas
//! - [`EndpointPool`] / [`EndpointSelector`] - alpha selection strategy
//! - [`raw`] - undecoded response shapes

mod client;
mod endpoint;
mod error;
pub mod raw;

pub use client::{decode_response, normalize_endpoint, DgraphClient, LENSES_QUERY, LENS_SUBGRAPH_QUERY};
pub use endpoint::{
    EndpointPool, EndpointSelection, EndpointSelector, FirstEndpoint, RandomEndpoint,
    RoundRobinEndpoint,
};
pub use error::GraphDbError;
pub use raw::{RawLens, RawLensSummary, RawNode, RawScopeRef};

use async_trait::async_trait;

/// Parameterized read access to lenses in the graph database.
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Fetch a lens, its scope, and each scope member's one-hop neighborhood.
    ///
    /// `Ok(None)` when no lens has that name.
    async fn lens_subgraph(&self, lens_name: &str) -> Result<Option<RawLens>, GraphDbError>;

    /// Fetch lenses ordered by descending score.
    async fn lenses(&self, first: u32, offset: u32) -> Result<Vec<RawLensSummary>, GraphDbError>;
}
