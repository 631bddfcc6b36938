//! Resolver surface exposed to the query API.
//!
//! Two operations: list lenses (paged, by descending score) and get a lens
//! scope by name. Both reject missing arguments before touching the
//! database.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::dgraph::raw::{score_of, RawLensSummary};
use crate::dgraph::GraphDbError;
use crate::graph::{filter_types, Lens, LensSummary, ScopeRef, Uid};
use crate::scope::{ScopeError, SubgraphScoper};

/// Errors returned by the resolvers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid argument {name}: {message}")]
    InvalidArgument { name: &'static str, message: String },

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Fetch(#[from] GraphDbError),
}

impl ApiError {
    /// True for errors caused by the caller's arguments.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ApiError::MissingArgument(_) | ApiError::InvalidArgument { .. }
        )
    }
}

/// Resolvers for lens listing and lens scope.
pub struct LensResolver {
    scoper: Arc<SubgraphScoper>,
    max_page_size: u32,
}

impl LensResolver {
    pub fn new(scoper: Arc<SubgraphScoper>, config: &ApiConfig) -> Self {
        Self {
            scoper,
            max_page_size: config.max_page_size,
        }
    }

    pub fn scoper(&self) -> &Arc<SubgraphScoper> {
        &self.scoper
    }

    /// List lenses ordered by descending score.
    ///
    /// `first` and `offset` are required and must be non-negative; `first`
    /// is capped by the configured page size.
    pub async fn lenses(
        &self,
        first: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<LensSummary>, ApiError> {
        let first = page_argument("first", first)?;
        let offset = page_argument("offset", offset)?;

        if first > self.max_page_size {
            return Err(ApiError::InvalidArgument {
                name: "first",
                message: format!("must be at most {}", self.max_page_size),
            });
        }

        debug!(first, offset, "listing lenses");
        let raw = self.scoper.source().lenses(first, offset).await?;

        Ok(raw.into_iter().filter_map(summarize_lens).collect())
    }

    /// Full normalized scope of a lens. `Ok(None)` when it does not exist.
    pub async fn lens_scope(&self, lens_name: Option<&str>) -> Result<Option<Lens>, ApiError> {
        let lens_name = lens_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(ApiError::MissingArgument("lens_name"))?;

        Ok(self.scoper.scope_lens(lens_name).await?)
    }
}

fn page_argument(name: &'static str, value: Option<i64>) -> Result<u32, ApiError> {
    let value = value.ok_or(ApiError::MissingArgument(name))?;
    u32::try_from(value).map_err(|_| ApiError::InvalidArgument {
        name,
        message: format!("{} is not a non-negative 32-bit integer", value),
    })
}

/// Normalize one listing entry. Entries with an unusable uid are skipped.
pub fn summarize_lens(raw: RawLensSummary) -> Option<LensSummary> {
    let uid = match Uid::from_hex(&raw.uid) {
        Ok(uid) => uid,
        Err(e) => {
            warn!(lens = %raw.lens_name, error = %e, "skipping lens with invalid uid");
            return None;
        }
    };

    let scope = raw
        .scope
        .unwrap_or_default()
        .into_iter()
        .filter_map(|member| {
            Some(ScopeRef {
                uid: Uid::from_hex(&member.uid).ok()?,
                node_key: member.node_key,
                dgraph_type: filter_types(member.dgraph_type),
            })
        })
        .collect();

    Some(LensSummary {
        uid,
        lens_name: raw.lens_name,
        dgraph_type: filter_types(raw.dgraph_type),
        node_key: raw.node_key,
        lens_type: raw.lens_type,
        score: score_of(raw.score.as_ref()),
        scope,
    })
}
