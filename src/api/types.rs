//! API response types shared by the handlers.

use serde::Serialize;

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Short error label
    pub error: String,

    /// Human-readable explanation
    pub message: String,

    /// Extra advice, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Suggested wait in seconds before retrying
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Active upstream model
    pub model: String,

    /// Whether an upstream credential is configured
    pub has_api_key: bool,

    /// Server time (RFC 3339)
    pub timestamp: String,

    /// Available endpoints
    pub endpoints: Vec<String>,
}
