//! Subgraph scoping.
//!
//! Turns the raw lens subgraph returned by the graph database into a closed,
//! UI-safe snapshot:
//!
//! 1. normalize the lens uid; a missing scope is an empty scope
//! 2. normalize scope member uids and drop members without a real type
//! 3. collect the in-scope uid set
//! 4. decode each member's predicates through the [`Schema`], pruning every
//!    edge target outside the set and normalizing risks
//! 5. attach display names (best effort)
//! 6. expose plugin-defined members' attributes under `predicates`

mod diagnostics;
mod error;
mod normalize;

pub use diagnostics::ScopeDiagnostics;
pub use error::ScopeError;
pub use normalize::normalize_lens;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::display::{display_text, DisplayLookup};
use crate::dgraph::GraphSource;
use crate::graph::{Attribute, Lens, Schema};

/// A normalized lens plus what normalization dropped.
#[derive(Debug, Clone, Serialize)]
pub struct ScopedLens {
    pub lens: Lens,
    pub diagnostics: ScopeDiagnostics,
}

/// Produces normalized lens snapshots from the graph database.
pub struct SubgraphScoper {
    source: Arc<dyn GraphSource>,
    display: Arc<dyn DisplayLookup>,
    schema: Arc<Schema>,
}

impl SubgraphScoper {
    /// Create a scoper over the given database and display lookup.
    pub fn new(
        source: Arc<dyn GraphSource>,
        display: Arc<dyn DisplayLookup>,
        schema: Schema,
    ) -> Self {
        Self {
            source,
            display,
            schema: Arc::new(schema),
        }
    }

    /// The graph database this scoper reads from.
    pub fn source(&self) -> &Arc<dyn GraphSource> {
        &self.source
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Scope a lens by name. `Ok(None)` when no lens has that name.
    pub async fn scope_lens(&self, lens_name: &str) -> Result<Option<Lens>, ScopeError> {
        Ok(self
            .scope_lens_with_diagnostics(lens_name)
            .await?
            .map(|scoped| scoped.lens))
    }

    /// Scope a lens by name and report what was dropped.
    pub async fn scope_lens_with_diagnostics(
        &self,
        lens_name: &str,
    ) -> Result<Option<ScopedLens>, ScopeError> {
        let Some(raw) = self.source.lens_subgraph(lens_name).await? else {
            debug!(lens = lens_name, "no lens with that name");
            return Ok(None);
        };

        let mut scoped = normalize::normalize_scope(raw, &self.schema)?;
        self.enrich_display(&mut scoped).await;
        normalize::mark_plugin_entities(&mut scoped.lens, &self.schema);

        scoped.diagnostics.log(lens_name);
        Ok(Some(scoped))
    }

    /// Set `display` on every member whose type has a known display attribute.
    async fn enrich_display(&self, scoped: &mut ScopedLens) {
        let mut properties: HashMap<String, Option<String>> = HashMap::new();

        for node in &mut scoped.lens.scope {
            let Some(node_type) = node.primary_type().map(str::to_string) else {
                continue;
            };

            let property = match properties.get(&node_type) {
                Some(property) => property.clone(),
                None => match self.display.display_property(&node_type).await {
                    Ok(property) => {
                        properties.insert(node_type, property.clone());
                        property
                    }
                    Err(e) => {
                        warn!(uid = %node.uid, error = %e, "display lookup failed");
                        scoped.diagnostics.display_failures += 1;
                        continue;
                    }
                },
            };

            let display = property
                .as_deref()
                .and_then(|p| node.attribute(p))
                .and_then(Attribute::as_value)
                .and_then(display_text);
            node.display = display;
        }
    }
}
