//! Counters for best-effort normalization.

use serde::Serialize;
use tracing::{debug, warn};

/// What a scoping pass silently dropped or coerced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScopeDiagnostics {
    /// Scope members removed (no real type, or unusable uid).
    pub dropped_members: usize,
    /// Uids that failed to parse, anywhere in the scope.
    pub invalid_uids: usize,
    /// Risk entries removed (no type list, or unusable uid).
    pub dropped_risks: usize,
    /// Edge attributes removed because nothing in them stayed in scope.
    pub pruned_edges: usize,
    /// Individual references removed from edge lists.
    pub pruned_targets: usize,
    /// Attributes whose shape contradicted the schema and were removed.
    pub cardinality_mismatches: usize,
    /// Display lookups that failed.
    pub display_failures: usize,
}

impl ScopeDiagnostics {
    /// Nothing was dropped, pruned or coerced.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    /// Emit the counters for one lens.
    pub fn log(&self, lens_name: &str) {
        if self.dropped_members > 0 || self.dropped_risks > 0 {
            warn!(
                lens = lens_name,
                dropped_members = self.dropped_members,
                dropped_risks = self.dropped_risks,
                invalid_uids = self.invalid_uids,
                "dropped malformed entries while scoping lens"
            );
        }
        debug!(
            lens = lens_name,
            pruned_edges = self.pruned_edges,
            pruned_targets = self.pruned_targets,
            cardinality_mismatches = self.cardinality_mismatches,
            display_failures = self.display_failures,
            "scoped lens"
        );
    }
}
