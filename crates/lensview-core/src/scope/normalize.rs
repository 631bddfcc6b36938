//! Synchronous normalization of a raw lens subgraph.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use super::diagnostics::ScopeDiagnostics;
use super::error::ScopeError;
use super::ScopedLens;
use crate::dgraph::raw::{score_of, RawLens, RawNode};
use crate::graph::{
    filter_types, Attribute, Lens, Node, NodeRef, PredicateKind, Risk, Schema, Uid,
};

/// Normalize a raw lens into a closed snapshot and mark plugin entities.
///
/// This is the whole scoping pass except display enrichment.
pub fn normalize_lens(raw: RawLens, schema: &Schema) -> Result<ScopedLens, ScopeError> {
    let mut scoped = normalize_scope(raw, schema)?;
    mark_plugin_entities(&mut scoped.lens, schema);
    Ok(scoped)
}

/// Normalize ids and types, then prune every edge leaving the scope.
pub(crate) fn normalize_scope(raw: RawLens, schema: &Schema) -> Result<ScopedLens, ScopeError> {
    let mut diagnostics = ScopeDiagnostics::default();

    let uid = Uid::from_hex(&raw.uid).map_err(|source| ScopeError::InvalidLens {
        lens_name: raw.lens_name.clone(),
        source,
    })?;

    let mut members = Vec::new();
    for member in raw.scope.unwrap_or_default() {
        let RawNode {
            uid: raw_uid,
            dgraph_type,
            predicates,
        } = member;

        let uid = match Uid::from_hex(&raw_uid) {
            Ok(uid) => uid,
            Err(e) => {
                debug!(uid = %raw_uid, error = %e, "dropping scope member with invalid uid");
                diagnostics.invalid_uids += 1;
                diagnostics.dropped_members += 1;
                continue;
            }
        };

        // No real type means this is not an entity.
        let types = filter_types(dgraph_type);
        if types.is_empty() {
            diagnostics.dropped_members += 1;
            continue;
        }

        members.push((uid, types, predicates));
    }

    let scope_ids: HashSet<Uid> = members.iter().map(|(uid, _, _)| *uid).collect();

    let scope = members
        .into_iter()
        .map(|(uid, types, predicates)| {
            scope_member(uid, types, predicates, &scope_ids, schema, &mut diagnostics)
        })
        .collect();

    let lens = Lens {
        uid,
        lens_name: raw.lens_name,
        dgraph_type: filter_types(raw.dgraph_type),
        node_key: raw.node_key,
        lens_type: raw.lens_type,
        score: score_of(raw.score.as_ref()),
        scope,
    };

    Ok(ScopedLens { lens, diagnostics })
}

/// Expose the attributes of plugin-defined entities as an opaque bag.
pub(crate) fn mark_plugin_entities(lens: &mut Lens, schema: &Schema) {
    for node in &mut lens.scope {
        let builtin = node.primary_type().map(|t| schema.is_builtin(t)).unwrap_or(false);
        if builtin {
            continue;
        }
        node.predicates = match serde_json::to_value(&*node) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        };
    }
}

fn scope_member(
    uid: Uid,
    types: Vec<String>,
    predicates: Map<String, Value>,
    scope_ids: &HashSet<Uid>,
    schema: &Schema,
    diagnostics: &mut ScopeDiagnostics,
) -> Node {
    let node_type = types[0].clone();
    let mut node = Node::new(uid, types);

    for (name, value) in predicates {
        match schema.resolve(&node_type, &name, &value) {
            PredicateKind::Risks => {
                node.risks = decode_risks(value, diagnostics);
            }
            PredicateKind::Value => {
                if is_reference_shaped(&value) {
                    diagnostics.cardinality_mismatches += 1;
                    continue;
                }
                node.attributes.insert(name, Attribute::Value(value));
            }
            PredicateKind::Edge => {
                if let Some(attr) = single_edge(value, scope_ids, diagnostics) {
                    node.attributes.insert(name, attr);
                }
            }
            PredicateKind::Edges => {
                if let Some(attr) = edge_list(value, scope_ids, diagnostics) {
                    node.attributes.insert(name, attr);
                }
            }
        }
    }

    node
}

/// A 1-to-1 edge survives only if its target is in scope.
fn single_edge(
    value: Value,
    scope_ids: &HashSet<Uid>,
    diagnostics: &mut ScopeDiagnostics,
) -> Option<Attribute> {
    let target = match value {
        Value::Object(map) => map,
        Value::Array(mut items) if items.len() == 1 && items[0].is_object() => {
            match items.pop() {
                Some(Value::Object(map)) => map,
                _ => return None,
            }
        }
        _ => {
            diagnostics.cardinality_mismatches += 1;
            return None;
        }
    };

    match decode_ref(target, diagnostics) {
        Some(node_ref) if scope_ids.contains(&node_ref.uid) => Some(Attribute::Edge(node_ref)),
        _ => {
            diagnostics.pruned_edges += 1;
            None
        }
    }
}

/// A 1-to-many edge keeps only in-scope targets and disappears when empty.
fn edge_list(
    value: Value,
    scope_ids: &HashSet<Uid>,
    diagnostics: &mut ScopeDiagnostics,
) -> Option<Attribute> {
    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => {
            diagnostics.cardinality_mismatches += 1;
            return None;
        }
    };

    if items.is_empty() {
        return None;
    }

    let mut targets = Vec::with_capacity(items.len());
    for item in items {
        let kept = match item {
            Value::Object(map) => decode_ref(map, diagnostics)
                .filter(|node_ref| scope_ids.contains(&node_ref.uid)),
            _ => None,
        };
        match kept {
            Some(node_ref) => targets.push(node_ref),
            None => diagnostics.pruned_targets += 1,
        }
    }

    if targets.is_empty() {
        diagnostics.pruned_edges += 1;
        return None;
    }
    Some(Attribute::Edges(targets))
}

fn decode_ref(mut map: Map<String, Value>, diagnostics: &mut ScopeDiagnostics) -> Option<NodeRef> {
    let uid = match map.remove("uid") {
        Some(Value::String(raw)) => match Uid::from_hex(&raw) {
            Ok(uid) => uid,
            Err(_) => {
                diagnostics.invalid_uids += 1;
                return None;
            }
        },
        _ => {
            diagnostics.invalid_uids += 1;
            return None;
        }
    };

    let dgraph_type = map
        .remove("dgraph_type")
        .map(string_list)
        .map(filter_types)
        .unwrap_or_default();

    // Neighbors of neighbors are out of scope by construction.
    let properties = map
        .into_iter()
        .filter(|(_, v)| !is_reference_shaped(v))
        .collect();

    Some(NodeRef {
        uid,
        dgraph_type,
        properties,
    })
}

fn decode_risks(value: Value, diagnostics: &mut ScopeDiagnostics) -> Vec<Risk> {
    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        Value::Null => return Vec::new(),
        _ => {
            diagnostics.cardinality_mismatches += 1;
            return Vec::new();
        }
    };

    let mut risks = Vec::with_capacity(items.len());
    for item in items {
        match decode_risk(item, diagnostics) {
            Some(risk) => risks.push(risk),
            None => diagnostics.dropped_risks += 1,
        }
    }
    risks
}

fn decode_risk(value: Value, diagnostics: &mut ScopeDiagnostics) -> Option<Risk> {
    let Value::Object(mut map) = value else {
        return None;
    };

    let uid = match map.get("uid").and_then(Value::as_str).map(Uid::from_hex) {
        Some(Ok(uid)) => uid,
        _ => {
            diagnostics.invalid_uids += 1;
            return None;
        }
    };

    let dgraph_type = filter_types(string_list(map.remove("dgraph_type")?));
    if dgraph_type.is_empty() {
        return None;
    }

    Some(Risk {
        uid,
        dgraph_type,
        node_key: map.get("node_key").and_then(Value::as_str).map(str::to_string),
        analyzer_name: map
            .get("analyzer_name")
            .and_then(Value::as_str)
            .map(str::to_string),
        risk_score: score_of(map.get("risk_score")),
    })
}

fn string_list(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) => vec![s],
        _ => Vec::new(),
    }
}

fn is_reference_shaped(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.iter().any(Value::is_object),
        _ => false,
    }
}
