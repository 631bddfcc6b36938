//! Dgraph HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::endpoint::EndpointPool;
use super::error::GraphDbError;
use super::raw::{AllBlock, DgraphResponse, RawLens, RawLensSummary};
use super::GraphSource;
use crate::config::DgraphConfig;

/// The lens node, its scope, and one hop of neighbors per scope member.
pub const LENS_SUBGRAPH_QUERY: &str = r#"
query all($a: string) {
    all(func: eq(lens_name, $a), first: 1) {
        uid,
        dgraph_type: dgraph.type,
        node_key,
        lens_name,
        lens_type,
        score,
        scope @filter(has(node_key)) {
            uid,
            dgraph_type: dgraph.type,
            expand(_all_) {
                uid,
                dgraph_type: dgraph.type,
                expand(_all_)
            }
        }
    }
}
"#;

/// Lenses ordered by score, paged.
pub const LENSES_QUERY: &str = r#"
query all($a: int, $b: int) {
    all(func: type(Lens), first: $a, offset: $b, orderdesc: score) {
        lens_name,
        score,
        node_key,
        uid,
        dgraph_type: dgraph.type,
        lens_type,
        scope {
            uid,
            node_key,
            dgraph_type: dgraph.type,
        }
    }
}
"#;

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    variables: Map<String, Value>,
}

/// Read-only client for Dgraph's `/query` endpoint.
pub struct DgraphClient {
    pool: EndpointPool,
    client: Client,
}

impl DgraphClient {
    /// Creates a client from explicit configuration.
    pub fn new(config: &DgraphConfig) -> Result<Self, GraphDbError> {
        let endpoints: Vec<String> = config
            .alphas
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(normalize_endpoint)
            .collect();

        if endpoints.is_empty() {
            return Err(GraphDbError::NoEndpoints);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            pool: EndpointPool::new(endpoints, config.endpoint_selection.selector()),
            client,
        })
    }

    /// Endpoint pool backing this client.
    pub fn pool(&self) -> &EndpointPool {
        &self.pool
    }

    /// Run a read-only query and return its `data` block.
    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Map<String, Value>,
    ) -> Result<T, GraphDbError> {
        let endpoint = self.pool.select().ok_or(GraphDbError::NoEndpoints)?;
        let url = format!("{}/query?ro=true", endpoint);

        debug!(%endpoint, "querying graph database");

        let request = QueryRequest { query, variables };
        let response = match self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(%endpoint, error = %e, "graph database unreachable, marking unhealthy");
                self.pool.mark_unhealthy(&endpoint);
                return Err(GraphDbError::Network {
                    endpoint,
                    message: e.to_string(),
                });
            }
        };
        self.pool.mark_healthy(&endpoint);

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GraphDbError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        decode_response(&body)
    }
}

/// Decode a `/query` response body into its `data` block.
pub fn decode_response<T: DeserializeOwned>(body: &[u8]) -> Result<T, GraphDbError> {
    let response: DgraphResponse<T> = serde_json::from_slice(body)?;

    if !response.errors.is_empty() {
        let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(GraphDbError::Query(messages.join("; ")));
    }

    response
        .data
        .ok_or_else(|| GraphDbError::Decode("response has no data".to_string()))
}

/// Prefix bare `host:port` alphas with `http://` and drop trailing slashes.
pub fn normalize_endpoint(alpha: &str) -> String {
    let alpha = alpha.trim_end_matches('/');
    if alpha.starts_with("http://") || alpha.starts_with("https://") {
        alpha.to_string()
    } else {
        format!("http://{}", alpha)
    }
}

fn variables(pairs: &[(&str, String)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), json!(v)))
        .collect()
}

#[async_trait]
impl GraphSource for DgraphClient {
    async fn lens_subgraph(&self, lens_name: &str) -> Result<Option<RawLens>, GraphDbError> {
        let data: AllBlock<RawLens> = self
            .query(LENS_SUBGRAPH_QUERY, variables(&[("$a", lens_name.to_string())]))
            .await?;
        Ok(data.all.into_iter().next())
    }

    async fn lenses(&self, first: u32, offset: u32) -> Result<Vec<RawLensSummary>, GraphDbError> {
        let data: AllBlock<RawLensSummary> = self
            .query(
                LENSES_QUERY,
                variables(&[("$a", first.to_string()), ("$b", offset.to_string())]),
            )
            .await?;
        Ok(data.all)
    }
}
