//! Predicate schema for entity types.
//!
//! Dgraph returns a 1-to-1 edge as a JSON object and a 1-to-many edge as an
//! array of objects. Rather than guessing from the shape of every value, the
//! scoper asks the schema what each predicate is and decodes it into a
//! tagged [`Attribute`](super::Attribute) once.
//!
//! Built-in entity types are declared here. Plugin-defined types can be
//! declared through configuration; predicates nobody declared fall back to
//! [`PredicateKind::infer`] at the decode boundary.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Predicate holding risk annotations on any entity.
pub const RISKS_PREDICATE: &str = "risks";

/// Entity types with explicit rendering support.
pub const BUILTIN_TYPES: &[&str] = &[
    "Process",
    "File",
    "IpAddress",
    "Asset",
    "Risk",
    "IpConnections",
    "ProcessInboundConnections",
    "ProcessOutboundConnections",
];

/// What a predicate holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    /// Scalar or opaque value.
    Value,
    /// Single node reference (1-to-1).
    Edge,
    /// List of node references (1-to-many).
    Edges,
    /// Risk annotations.
    Risks,
}

impl PredicateKind {
    /// Classify an undeclared predicate from its JSON shape.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Object(_) => PredicateKind::Edge,
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
                PredicateKind::Edges
            }
            _ => PredicateKind::Value,
        }
    }

    /// Returns true for either edge kind.
    pub fn is_edge(self) -> bool {
        matches!(self, PredicateKind::Edge | PredicateKind::Edges)
    }
}

/// Declared predicates of one entity type.
#[derive(Debug, Clone, Default)]
struct TypeSchema {
    builtin: bool,
    predicates: HashMap<String, PredicateKind>,
}

/// Registry of entity types and their predicates.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    types: HashMap<String, TypeSchema>,
}

impl Schema {
    /// An empty schema: every type is a plugin type, every predicate inferred.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Schema with all built-in entity types declared.
    pub fn builtin() -> Self {
        use PredicateKind::{Edge, Edges, Value};

        let mut schema = Self::empty();

        schema.declare_builtin(
            "Process",
            &[
                ("node_key", Value),
                ("created_timestamp", Value),
                ("image_name", Value),
                ("process_name", Value),
                ("arguments", Value),
                ("process_id", Value),
                ("children", Edges),
                ("bin_file", Edge),
                ("created_file", Edge),
                ("deleted_files", Edge),
                ("read_files", Edges),
                ("wrote_files", Edges),
                ("created_connections", Edges),
                ("inbound_connections", Edges),
            ],
        );

        schema.declare_builtin(
            "File",
            &[
                ("node_key", Value),
                ("file_name", Value),
                ("file_type", Value),
                ("file_extension", Value),
                ("file_mime_type", Value),
                ("file_size", Value),
                ("file_version", Value),
                ("file_description", Value),
                ("file_product", Value),
                ("file_company", Value),
                ("file_directory", Value),
                ("file_inode", Value),
                ("file_hard_links", Value),
                ("signed", Value),
                ("signed_status", Value),
                ("md5_hash", Value),
                ("sha1_hash", Value),
                ("sha256_hash", Value),
                ("file_path", Value),
            ],
        );

        schema.declare_builtin(
            "IpConnections",
            &[
                ("node_key", Value),
                ("src_ip_addr", Value),
                ("src_port", Value),
                ("dst_ip_addr", Value),
                ("dst_port", Value),
                ("created_timestamp", Value),
                ("terminated_timestamp", Value),
                ("last_seen_timestamp", Value),
                ("inbound_ip_connection_to", Edge),
            ],
        );

        schema.declare_builtin("IpAddress", &[("node_key", Value), ("ip_address", Value)]);

        schema.declare_builtin(
            "Asset",
            &[
                ("node_key", Value),
                ("hostname", Value),
                ("asset_ip", Edges),
                ("asset_processes", Edges),
                ("files_on_asset", Edges),
            ],
        );

        let connection_scalars = [
            ("node_key", Value),
            ("ip_address", Value),
            ("protocol", Value),
            ("created_timestamp", Value),
            ("terminated_timestamp", Value),
            ("last_seen_timestamp", Value),
            ("port", Value),
        ];

        let mut inbound = connection_scalars.to_vec();
        inbound.extend([("bound_port", Edges), ("bound_ip", Edges)]);
        schema.declare_builtin("ProcessInboundConnections", &inbound);

        let mut outbound = connection_scalars.to_vec();
        outbound.extend([("connected_over", Edges), ("connected_to", Edges)]);
        schema.declare_builtin("ProcessOutboundConnections", &outbound);

        schema.declare_builtin(
            "Risk",
            &[("node_key", Value), ("analyzer_name", Value), ("risk_score", Value)],
        );

        // Known to the database but rendered generically.
        schema.declare("IpPort", "network_connections", Edges);
        schema.declare("NetworkConnection", "inbound_network_connection_to", Edges);

        schema
    }

    /// Built-in schema extended with plugin declarations
    /// (type -> predicate -> kind).
    pub fn with_plugins(plugins: &BTreeMap<String, BTreeMap<String, PredicateKind>>) -> Self {
        let mut schema = Self::builtin();
        for (node_type, predicates) in plugins {
            for (predicate, kind) in predicates {
                schema.declare(node_type, predicate, *kind);
            }
        }
        schema
    }

    fn declare_builtin(&mut self, node_type: &str, predicates: &[(&str, PredicateKind)]) {
        let entry = self.types.entry(node_type.to_string()).or_default();
        entry.builtin = true;
        for (name, kind) in predicates {
            entry.predicates.insert((*name).to_string(), *kind);
        }
    }

    /// Declare (or redeclare) one predicate of a type.
    pub fn declare(&mut self, node_type: &str, predicate: &str, kind: PredicateKind) {
        self.types
            .entry(node_type.to_string())
            .or_default()
            .predicates
            .insert(predicate.to_string(), kind);
    }

    /// Declared kind of `predicate` on `node_type`.
    ///
    /// `risks` is always [`PredicateKind::Risks`].
    pub fn kind_of(&self, node_type: &str, predicate: &str) -> Option<PredicateKind> {
        if predicate == RISKS_PREDICATE {
            return Some(PredicateKind::Risks);
        }
        self.types
            .get(node_type)
            .and_then(|t| t.predicates.get(predicate))
            .copied()
    }

    /// Declared kind, falling back to the value's shape.
    pub fn resolve(&self, node_type: &str, predicate: &str, value: &Value) -> PredicateKind {
        self.kind_of(node_type, predicate)
            .unwrap_or_else(|| PredicateKind::infer(value))
    }

    /// Whether `node_type` is a built-in entity type.
    pub fn is_builtin(&self, node_type: &str) -> bool {
        self.types.get(node_type).map(|t| t.builtin).unwrap_or(false)
    }
}
