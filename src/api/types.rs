// src/api/types.rs

use serde::{Deserialize, Serialize};

pub use crate::core::config::SolveRequest;
pub use crate::core::types::SolveResponse;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub tasks: Vec<String>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
