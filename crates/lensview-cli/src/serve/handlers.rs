//! HTTP route handlers for the resolver server.
//!
//! Handlers are kept thin, delegating to [`LensResolver`](lensview_core::LensResolver).

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::warn;

use lensview_core::{GraphSnapshot, Lens, LensSummary};

use super::models::{ApiErrorResponse, Health, LensPage};
use super::AppState;

/// GET `/health`
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// GET `/api/lenses?first=N&offset=M` - lenses by descending score.
pub async fn api_lenses(
    State(state): State<Arc<AppState>>,
    Query(page): Query<LensPage>,
) -> Result<Json<Vec<LensSummary>>, ApiErrorResponse> {
    let lenses = state
        .resolver
        .lenses(page.first, page.offset)
        .await
        .inspect_err(|e| warn!(error = %e, "lens listing failed"))?;
    Ok(Json(lenses))
}

/// GET `/api/lens/{name}` - normalized lens scope, `null` if unknown.
pub async fn api_lens_scope(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Option<Lens>>, ApiErrorResponse> {
    let lens = state
        .resolver
        .lens_scope(Some(&name))
        .await
        .inspect_err(|e| warn!(lens = %name, error = %e, "lens scope failed"))?;
    Ok(Json(lens))
}

/// GET `/api/lens/{name}/graph` - flattened nodes and links, `null` if unknown.
///
/// Response format:
/// ```json
/// {
///   "lens_name": "incident-42",
///   "nodes": [{"id": 1, "node_type": "Process", ...}],
///   "links": [{"source": 1, "target": 2, "name": "children"}]
/// }
/// ```
pub async fn api_lens_graph(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Option<GraphSnapshot>>, ApiErrorResponse> {
    let lens = state
        .resolver
        .lens_scope(Some(&name))
        .await
        .inspect_err(|e| warn!(lens = %name, error = %e, "lens graph failed"))?;
    Ok(Json(lens.as_ref().map(GraphSnapshot::from_lens)))
}
