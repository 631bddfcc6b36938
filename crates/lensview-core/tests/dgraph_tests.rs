use std::time::Duration;

use lensview_core::dgraph::raw::AllBlock;
use lensview_core::dgraph::{
    decode_response, normalize_endpoint, EndpointPool, EndpointSelection, EndpointSelector,
    FirstEndpoint, RandomEndpoint, RawLens, RoundRobinEndpoint,
};
use lensview_core::view::FetchError;
use lensview_core::{DgraphClient, DgraphConfig, GraphDbError, HttpScopeFetcher};

// =============================================================================
// Endpoint selection
// =============================================================================

fn pool(endpoints: &[&str], selection: EndpointSelection) -> EndpointPool {
    EndpointPool::new(
        endpoints.iter().map(|e| e.to_string()).collect(),
        selection.selector(),
    )
}

#[test]
fn test_selectors_on_empty_input() {
    assert_eq!(RandomEndpoint.select(0), None);
    assert_eq!(FirstEndpoint.select(0), None);
    assert_eq!(RoundRobinEndpoint::default().select(0), None);
}

#[test]
fn test_random_selector_stays_in_range() {
    for _ in 0..100 {
        let i = RandomEndpoint.select(3).unwrap();
        assert!(i < 3);
    }
}

#[test]
fn test_round_robin_cycles() {
    let pool = pool(&["http://a", "http://b"], EndpointSelection::RoundRobin);
    let picks: Vec<String> = (0..4).filter_map(|_| pool.select()).collect();
    assert_eq!(picks, vec!["http://a", "http://b", "http://a", "http://b"]);
}

#[test]
fn test_unhealthy_endpoint_is_skipped() {
    let pool = pool(&["http://a", "http://b"], EndpointSelection::First);
    pool.mark_unhealthy("http://a");

    assert!(!pool.is_healthy("http://a"));
    assert_eq!(pool.select().as_deref(), Some("http://b"));

    pool.mark_healthy("http://a");
    assert_eq!(pool.select().as_deref(), Some("http://a"));
}

#[test]
fn test_all_unhealthy_resets_marks() {
    let pool = pool(&["http://a", "http://b"], EndpointSelection::First);
    pool.mark_unhealthy("http://a");
    pool.mark_unhealthy("http://b");

    assert_eq!(pool.select().as_deref(), Some("http://a"));
    assert!(pool.is_healthy("http://b"));
}

#[test]
fn test_empty_pool_selects_nothing() {
    let pool = pool(&[], EndpointSelection::Random);
    assert!(pool.is_empty());
    assert_eq!(pool.select(), None);
}

#[test]
fn test_parse_endpoint_selection() {
    assert_eq!(EndpointSelection::parse("random"), Some(EndpointSelection::Random));
    assert_eq!(
        EndpointSelection::parse("Round-Robin"),
        Some(EndpointSelection::RoundRobin)
    );
    assert_eq!(EndpointSelection::parse(" first "), Some(EndpointSelection::First));
    assert_eq!(EndpointSelection::parse("fastest"), None);
}

// =============================================================================
// Client
// =============================================================================

#[test]
fn test_normalize_endpoint() {
    assert_eq!(normalize_endpoint("alpha0:8080"), "http://alpha0:8080");
    assert_eq!(normalize_endpoint("http://alpha0:8080/"), "http://alpha0:8080");
    assert_eq!(normalize_endpoint("https://dgraph.example"), "https://dgraph.example");
}

#[test]
fn test_client_requires_an_endpoint() {
    let config = DgraphConfig {
        alphas: vec![" ".to_string()],
        ..DgraphConfig::default()
    };
    assert!(matches!(DgraphClient::new(&config), Err(GraphDbError::NoEndpoints)));
}

#[test]
fn test_client_normalizes_alphas() {
    let config = DgraphConfig {
        alphas: vec!["alpha0:8080".to_string(), "http://alpha1:8080/".to_string()],
        ..DgraphConfig::default()
    };
    let client = DgraphClient::new(&config).unwrap();
    assert_eq!(
        client.pool().endpoints(),
        &["http://alpha0:8080".to_string(), "http://alpha1:8080".to_string()]
    );
}

#[test]
fn test_decode_lens_subgraph_response() {
    let body = br#"{
        "data": {
            "all": [{
                "uid": "0x100",
                "lens_name": "incident-42",
                "dgraph_type": ["Lens"],
                "score": 42,
                "scope": [
                    {"uid": "0x1", "dgraph_type": ["Process"], "process_name": "cmd.exe"}
                ]
            }]
        },
        "extensions": {"server_latency": {}}
    }"#;

    let data: AllBlock<RawLens> = decode_response(body).unwrap();
    let lens = &data.all[0];
    assert_eq!(lens.lens_name, "incident-42");
    let scope = lens.scope.as_ref().unwrap();
    assert_eq!(scope[0].uid, "0x1");
    assert!(scope[0].predicates.contains_key("process_name"));
}

#[test]
fn test_decode_empty_result() {
    let data: AllBlock<RawLens> = decode_response(br#"{"data": {"all": []}}"#).unwrap();
    assert!(data.all.is_empty());

    let data: AllBlock<RawLens> = decode_response(br#"{"data": {}}"#).unwrap();
    assert!(data.all.is_empty());
}

#[test]
fn test_decode_query_errors() {
    let body = br#"{"errors": [{"message": "line 1: bad"}, {"message": "oops"}]}"#;
    let err = decode_response::<AllBlock<RawLens>>(body).unwrap_err();
    match err {
        GraphDbError::Query(message) => assert_eq!(message, "line 1: bad; oops"),
        other => panic!("expected query error, got {other:?}"),
    }
}

#[test]
fn test_decode_garbage() {
    let err = decode_response::<AllBlock<RawLens>>(b"<html>").unwrap_err();
    assert!(matches!(err, GraphDbError::Decode(_)));

    let err = decode_response::<AllBlock<RawLens>>(b"{}").unwrap_err();
    assert!(matches!(err, GraphDbError::Decode(_)));
}

// =============================================================================
// HTTP fetcher
// =============================================================================

#[test]
fn test_lens_url_encodes_name() {
    let fetcher = HttpScopeFetcher::new("http://localhost:3333", Duration::from_secs(1)).unwrap();
    assert_eq!(
        fetcher.lens_url("incident 42/a").as_str(),
        "http://localhost:3333/api/lens/incident%2042%2Fa"
    );

    let fetcher =
        HttpScopeFetcher::new("http://proxy.local/lensview/", Duration::from_secs(1)).unwrap();
    assert_eq!(
        fetcher.lens_url("A").as_str(),
        "http://proxy.local/lensview/api/lens/A"
    );
}

#[test]
fn test_invalid_server_url() {
    let result = HttpScopeFetcher::new("not a url", Duration::from_secs(1));
    assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
}
