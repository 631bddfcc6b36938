//! Graph database error types.

use thiserror::Error;

/// Errors that can occur while querying the graph database.
#[derive(Debug, Error)]
pub enum GraphDbError {
    /// Transport-level failure (connect, timeout, reset).
    #[error("Network error talking to {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    /// Non-success HTTP status.
    #[error("Graph database returned error: {status} - {message}")]
    Status { status: u16, message: String },

    /// The query ran and the database reported errors.
    #[error("Query failed: {0}")]
    Query(String),

    /// Response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// No alpha endpoint configured.
    #[error("No graph database endpoints configured")]
    NoEndpoints,
}

impl From<serde_json::Error> for GraphDbError {
    fn from(err: serde_json::Error) -> Self {
        GraphDbError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for GraphDbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return GraphDbError::Decode(err.to_string());
        }
        GraphDbError::Network {
            endpoint: err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "<unknown>".to_string()),
            message: err.to_string(),
        }
    }
}
