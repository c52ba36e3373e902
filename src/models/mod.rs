pub mod analysis;
pub mod problem;

pub use analysis::*;
pub use problem::*;

use serde::{Deserialize, Serialize};

/// Uniform success envelope: `{ "success": true, "data": ... }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            note: None,
        }
    }

    pub fn with_note(data: T, note: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            note: Some(note.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
