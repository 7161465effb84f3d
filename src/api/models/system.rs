//! System endpoint models

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" while the process is serving
    pub status: String,
    pub version: String,
    /// Unix seconds
    pub timestamp: i64,
}
