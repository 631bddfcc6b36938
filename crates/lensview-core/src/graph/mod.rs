//! Graph primitives shared by the scoper and the view.
//!
//! - [`uid`] - hexadecimal uid normalization
//! - [`types`] - housekeeping type filtering
//! - [`schema`] - predicate kinds per entity type
//! - [`model`] - normalized nodes, edges, risks and lenses

pub mod model;
pub mod schema;
pub mod types;
pub mod uid;

pub use model::{Attribute, Lens, LensSummary, Node, NodeRef, Risk, ScopeRef};
pub use schema::{PredicateKind, Schema, BUILTIN_TYPES, RISKS_PREDICATE};
pub use types::{filter_types, is_housekeeping, primary_type, HOUSEKEEPING_TYPES};
pub use uid::{Uid, UidError};
