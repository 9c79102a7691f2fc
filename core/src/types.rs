//! Token record DTOs exchanged with the tokens API.
//!
//! Wire names are camelCase (`allowedUrls`). These mirror the mock-server's
//! schema but are defined independently; integration tests catch drift.

use serde::{Deserialize, Serialize};

/// A token record as returned by the API. `id` and `token` are assigned
/// server-side and absent from request payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub note: String,
    #[serde(default)]
    pub allowed_urls: Vec<String>,
    pub id: Option<String>,
    pub scopes: Vec<String>,
    pub token: Option<String>,
}

/// Request payload for creating a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateToken {
    pub note: String,
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_urls: Vec<String>,
}

/// Partial update payload; omitted fields stay unchanged on the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateToken {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_urls: Option<Vec<String>>,
}
