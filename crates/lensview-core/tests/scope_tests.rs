use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lensview_core::dgraph::{RawLens, RawLensSummary};
use lensview_core::{
    normalize_lens, Attribute, DisplayError, DisplayLookup, GraphDbError, GraphSource,
    NoDisplayLookup, Schema, ScopeError, StaticDisplayLookup, SubgraphScoper, Uid,
};
use serde_json::{json, Value};

// =============================================================================
// Fakes
// =============================================================================

struct FakeSource {
    lens: Option<Value>,
    fail: bool,
}

impl FakeSource {
    fn with_scope(scope: Value) -> Self {
        Self {
            lens: Some(json!({
                "uid": "0x100",
                "lens_name": "incident-42",
                "dgraph_type": ["Base", "Lens"],
                "lens_type": "engagement",
                "score": 42,
                "scope": scope,
            })),
            fail: false,
        }
    }
}

#[async_trait]
impl GraphSource for FakeSource {
    async fn lens_subgraph(&self, _lens_name: &str) -> Result<Option<RawLens>, GraphDbError> {
        if self.fail {
            return Err(GraphDbError::Query("boom".to_string()));
        }
        Ok(self
            .lens
            .clone()
            .map(|v| serde_json::from_value(v).unwrap()))
    }

    async fn lenses(&self, _first: u32, _offset: u32) -> Result<Vec<RawLensSummary>, GraphDbError> {
        Ok(Vec::new())
    }
}

struct FailingDisplay {
    calls: AtomicUsize,
}

#[async_trait]
impl DisplayLookup for FailingDisplay {
    async fn display_property(&self, _node_type: &str) -> Result<Option<String>, DisplayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DisplayError::Lookup("display service down".to_string()))
    }
}

fn scoper(source: FakeSource) -> SubgraphScoper {
    SubgraphScoper::new(Arc::new(source), Arc::new(NoDisplayLookup), Schema::builtin())
}

fn raw_lens(scope: Value) -> RawLens {
    serde_json::from_value(json!({
        "uid": "0x100",
        "lens_name": "incident-42",
        "scope": scope,
    }))
    .unwrap()
}

// =============================================================================
// Closure
// =============================================================================

#[tokio::test]
async fn test_edge_to_out_of_scope_node_is_removed() {
    let source = FakeSource::with_scope(json!([
        {
            "uid": "0x1",
            "dgraph_type": ["Base", "Process"],
            "children": [{"uid": "0x2", "dgraph_type": ["Entity", "File"]}]
        }
    ]));

    let scoped = scoper(source)
        .scope_lens_with_diagnostics("incident-42")
        .await
        .unwrap()
        .unwrap();
    let lens = scoped.lens;

    assert_eq!(lens.scope.len(), 1);
    let node = lens.node(Uid::new(1)).unwrap();
    assert_eq!(node.dgraph_type, vec!["Process".to_string()]);
    assert!(node.attribute("children").is_none());
    assert!(lens.node(Uid::new(2)).is_none());
    assert_eq!(scoped.diagnostics.pruned_edges, 1);
    assert_eq!(scoped.diagnostics.pruned_targets, 1);
}

#[tokio::test]
async fn test_edge_list_keeps_only_in_scope_targets() {
    let source = FakeSource::with_scope(json!([
        {
            "uid": "0x1",
            "dgraph_type": ["Process"],
            "children": [
                {"uid": "0x2", "dgraph_type": ["Process"]},
                {"uid": "0x3", "dgraph_type": ["Process"]}
            ]
        },
        {"uid": "0x2", "dgraph_type": ["Process"], "process_name": "child.exe"}
    ]));

    let scoped = scoper(source)
        .scope_lens_with_diagnostics("incident-42")
        .await
        .unwrap()
        .unwrap();

    let node = scoped.lens.node(Uid::new(1)).unwrap();
    let children = node.attribute("children").unwrap().targets();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].uid, Uid::new(2));
    assert_eq!(scoped.diagnostics.pruned_targets, 1);
    assert_eq!(scoped.diagnostics.pruned_edges, 0);
}

#[tokio::test]
async fn test_every_edge_target_is_in_scope() {
    let source = FakeSource::with_scope(json!([
        {
            "uid": "0x1",
            "dgraph_type": ["Process"],
            "bin_file": {"uid": "0x5", "dgraph_type": ["File"]},
            "children": [{"uid": "0x2"}, {"uid": "0x9"}],
            "created_connections": [{"uid": "0x7"}]
        },
        {"uid": "0x2", "dgraph_type": ["Process"], "children": [{"uid": "0x1"}]},
        {"uid": "0x5", "dgraph_type": ["File"]}
    ]));

    let lens = scoper(source).scope_lens("incident-42").await.unwrap().unwrap();
    let ids: Vec<Uid> = lens.scope.iter().map(|n| n.uid).collect();
    for node in &lens.scope {
        for (_, target) in node.edges() {
            assert!(ids.contains(&target.uid), "{} escapes the scope", target.uid);
        }
    }
}

// =============================================================================
// Member normalization
// =============================================================================

#[tokio::test]
async fn test_lens_fields_are_normalized() {
    let source = FakeSource::with_scope(json!([]));
    let lens = scoper(source).scope_lens("incident-42").await.unwrap().unwrap();

    assert_eq!(lens.uid, Uid::new(0x100));
    assert_eq!(lens.lens_name, "incident-42");
    assert_eq!(lens.dgraph_type, vec!["Lens".to_string()]);
    assert_eq!(lens.lens_type.as_deref(), Some("engagement"));
    assert_eq!(lens.score, Some(42));
    assert!(lens.scope.is_empty());
}

#[test]
fn test_missing_scope_is_empty_scope() {
    let raw: RawLens = serde_json::from_value(json!({
        "uid": "0x100",
        "lens_name": "quiet",
        "score": 3.6
    }))
    .unwrap();

    let scoped = normalize_lens(raw, &Schema::builtin()).unwrap();
    assert!(scoped.lens.scope.is_empty());
    assert_eq!(scoped.lens.score, Some(4));
    assert!(scoped.diagnostics.is_clean());
}

#[test]
fn test_member_without_real_type_is_dropped() {
    let raw = raw_lens(json!([
        {"uid": "0x1", "dgraph_type": ["Base", "Entity"]},
        {"uid": "0x2"},
        {"uid": "0x3", "dgraph_type": ["File"]}
    ]));

    let scoped = normalize_lens(raw, &Schema::builtin()).unwrap();
    assert_eq!(scoped.lens.scope.len(), 1);
    assert_eq!(scoped.lens.scope[0].uid, Uid::new(3));
    assert_eq!(scoped.diagnostics.dropped_members, 2);
}

#[test]
fn test_member_with_invalid_uid_is_dropped() {
    let raw = raw_lens(json!([
        {"uid": "not-a-uid", "dgraph_type": ["File"]},
        {"uid": "0x3", "dgraph_type": ["File"]}
    ]));

    let scoped = normalize_lens(raw, &Schema::builtin()).unwrap();
    assert_eq!(scoped.lens.scope.len(), 1);
    assert_eq!(scoped.diagnostics.invalid_uids, 1);
    assert_eq!(scoped.diagnostics.dropped_members, 1);
}

#[test]
fn test_invalid_lens_uid_is_an_error() {
    let raw: RawLens = serde_json::from_value(json!({
        "uid": "lens?",
        "lens_name": "broken"
    }))
    .unwrap();

    let err = normalize_lens(raw, &Schema::builtin()).unwrap_err();
    assert!(matches!(err, ScopeError::InvalidLens { ref lens_name, .. } if lens_name == "broken"));
}

#[test]
fn test_edge_target_types_are_filtered() {
    let raw = raw_lens(json!([
        {
            "uid": "0x1",
            "dgraph_type": ["Process"],
            "bin_file": {"uid": "0x2", "dgraph_type": ["Base", "File"], "file_path": "/bin/sh"}
        },
        {"uid": "0x2", "dgraph_type": ["File"]}
    ]));

    let scoped = normalize_lens(raw, &Schema::builtin()).unwrap();
    let node = scoped.lens.node(Uid::new(1)).unwrap();
    match node.attribute("bin_file") {
        Some(Attribute::Edge(target)) => {
            assert_eq!(target.uid, Uid::new(2));
            assert_eq!(target.dgraph_type, vec!["File".to_string()]);
            assert_eq!(target.properties.get("file_path"), Some(&json!("/bin/sh")));
        }
        other => panic!("expected a single edge, got {other:?}"),
    }
}

// =============================================================================
// Cardinality
// =============================================================================

#[test]
fn test_single_edge_as_one_element_array_is_coerced() {
    let raw = raw_lens(json!([
        {"uid": "0x1", "dgraph_type": ["Process"], "bin_file": [{"uid": "0x2"}]},
        {"uid": "0x2", "dgraph_type": ["File"]}
    ]));

    let scoped = normalize_lens(raw, &Schema::builtin()).unwrap();
    let node = scoped.lens.node(Uid::new(1)).unwrap();
    assert!(matches!(node.attribute("bin_file"), Some(Attribute::Edge(_))));
    assert_eq!(scoped.diagnostics.cardinality_mismatches, 0);
}

#[test]
fn test_single_edge_as_list_is_a_mismatch() {
    let raw = raw_lens(json!([
        {"uid": "0x1", "dgraph_type": ["Process"], "bin_file": [{"uid": "0x2"}, {"uid": "0x3"}]},
        {"uid": "0x2", "dgraph_type": ["File"]},
        {"uid": "0x3", "dgraph_type": ["File"]}
    ]));

    let scoped = normalize_lens(raw, &Schema::builtin()).unwrap();
    let node = scoped.lens.node(Uid::new(1)).unwrap();
    assert!(node.attribute("bin_file").is_none());
    assert_eq!(scoped.diagnostics.cardinality_mismatches, 1);
}

#[test]
fn test_edge_list_as_object_is_wrapped() {
    let raw = raw_lens(json!([
        {"uid": "0x1", "dgraph_type": ["Process"], "children": {"uid": "0x2"}},
        {"uid": "0x2", "dgraph_type": ["Process"]}
    ]));

    let scoped = normalize_lens(raw, &Schema::builtin()).unwrap();
    let node = scoped.lens.node(Uid::new(1)).unwrap();
    assert!(matches!(node.attribute("children"), Some(Attribute::Edges(t)) if t.len() == 1));
}

#[test]
fn test_value_predicate_holding_reference_is_dropped() {
    let raw = raw_lens(json!([
        {
            "uid": "0x1",
            "dgraph_type": ["Process"],
            "process_name": {"uid": "0x2"},
            "process_id": 4242
        }
    ]));

    let scoped = normalize_lens(raw, &Schema::builtin()).unwrap();
    let node = scoped.lens.node(Uid::new(1)).unwrap();
    assert!(node.attribute("process_name").is_none());
    assert_eq!(
        node.attribute("process_id").and_then(Attribute::as_value),
        Some(&json!(4242))
    );
    assert_eq!(scoped.diagnostics.cardinality_mismatches, 1);
}

#[test]
fn test_empty_edge_list_disappears_silently() {
    let raw = raw_lens(json!([
        {"uid": "0x1", "dgraph_type": ["Process"], "children": []}
    ]));

    let scoped = normalize_lens(raw, &Schema::builtin()).unwrap();
    assert!(scoped.lens.scope[0].attribute("children").is_none());
    assert!(scoped.diagnostics.is_clean());
}

// =============================================================================
// Risks
// =============================================================================

#[test]
fn test_risks_are_normalized_and_malformed_ones_dropped() {
    let raw = raw_lens(json!([
        {
            "uid": "0x1",
            "dgraph_type": ["Process"],
            "risks": [
                {
                    "uid": "0x9",
                    "dgraph_type": ["Base", "Risk"],
                    "analyzer_name": "Suspicious svchost",
                    "risk_score": 75
                },
                {"uid": "0xa", "analyzer_name": "No types"},
                {"uid": "0xb", "dgraph_type": ["Entity"]},
                {"uid": "zz", "dgraph_type": ["Risk"]}
            ]
        }
    ]));

    let scoped = normalize_lens(raw, &Schema::builtin()).unwrap();
    let risks = &scoped.lens.scope[0].risks;
    assert_eq!(risks.len(), 1);
    assert_eq!(risks[0].uid, Uid::new(9));
    assert_eq!(risks[0].dgraph_type, vec!["Risk".to_string()]);
    assert_eq!(risks[0].analyzer_name.as_deref(), Some("Suspicious svchost"));
    assert_eq!(risks[0].risk_score, Some(75));
    assert_eq!(scoped.diagnostics.dropped_risks, 3);
    assert_eq!(scoped.diagnostics.invalid_uids, 1);
}

// =============================================================================
// Plugin entities
// =============================================================================

#[test]
fn test_plugin_entities_get_predicates_bag() {
    let raw = raw_lens(json!([
        {"uid": "0x1", "dgraph_type": ["Process"], "process_name": "cmd.exe"},
        {"uid": "0x2", "dgraph_type": ["AwsLambda"], "function_name": "handler"}
    ]));

    let scoped = normalize_lens(raw, &Schema::builtin()).unwrap();
    let builtin = scoped.lens.node(Uid::new(1)).unwrap();
    let plugin = scoped.lens.node(Uid::new(2)).unwrap();

    assert!(builtin.predicates.is_none());
    let bag = plugin.predicates.as_ref().unwrap();
    assert_eq!(bag.get("function_name"), Some(&json!("handler")));
    assert_eq!(bag.get("uid"), Some(&json!(2)));
}

// =============================================================================
// Display enrichment
// =============================================================================

#[tokio::test]
async fn test_display_from_static_lookup() {
    let source = FakeSource::with_scope(json!([
        {"uid": "0x1", "dgraph_type": ["Process"], "process_name": "cmd.exe"},
        {"uid": "0x2", "dgraph_type": ["Process"], "process_name": "svchost.exe"},
        {"uid": "0x3", "dgraph_type": ["File"]}
    ]));
    let mut properties = BTreeMap::new();
    properties.insert("Process".to_string(), "process_name".to_string());
    properties.insert("File".to_string(), "file_path".to_string());

    let scoper = SubgraphScoper::new(
        Arc::new(source),
        Arc::new(StaticDisplayLookup::new(properties)),
        Schema::builtin(),
    );
    let lens = scoper.scope_lens("incident-42").await.unwrap().unwrap();

    assert_eq!(lens.node(Uid::new(1)).unwrap().display.as_deref(), Some("cmd.exe"));
    assert_eq!(lens.node(Uid::new(2)).unwrap().display.as_deref(), Some("svchost.exe"));
    assert_eq!(lens.node(Uid::new(3)).unwrap().display, None);
}

#[tokio::test]
async fn test_display_failure_does_not_fail_scoping() {
    let source = FakeSource::with_scope(json!([
        {"uid": "0x1", "dgraph_type": ["Process"], "process_name": "cmd.exe"}
    ]));
    let display = Arc::new(FailingDisplay {
        calls: AtomicUsize::new(0),
    });

    let scoper = SubgraphScoper::new(Arc::new(source), display.clone(), Schema::builtin());
    let scoped = scoper
        .scope_lens_with_diagnostics("incident-42")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(scoped.lens.scope.len(), 1);
    assert_eq!(scoped.lens.scope[0].display, None);
    assert_eq!(scoped.diagnostics.display_failures, 1);
    assert_eq!(display.calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Lookup outcomes
// =============================================================================

#[tokio::test]
async fn test_unknown_lens_is_none() {
    let source = FakeSource {
        lens: None,
        fail: false,
    };
    assert!(scoper(source).scope_lens("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_database_failure_is_fetch_error() {
    let source = FakeSource {
        lens: None,
        fail: true,
    };
    let err = scoper(source).scope_lens("incident-42").await.unwrap_err();
    assert!(matches!(err, ScopeError::Fetch(GraphDbError::Query(_))));
}
