//! Scoping error types.

use thiserror::Error;

use crate::dgraph::GraphDbError;
use crate::graph::UidError;

/// Errors that abort a scoping pass.
///
/// Malformed scope members and risks are not errors; they are dropped and
/// counted in [`ScopeDiagnostics`](super::ScopeDiagnostics).
#[derive(Debug, Error)]
pub enum ScopeError {
    /// The graph database query failed.
    #[error(transparent)]
    Fetch(#[from] GraphDbError),

    /// The lens node itself carries an unusable uid.
    #[error("Lens {lens_name:?} has an invalid uid: {source}")]
    InvalidLens {
        lens_name: String,
        #[source]
        source: UidError,
    },
}
