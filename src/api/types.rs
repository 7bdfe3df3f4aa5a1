//! API request and response types.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::grid::{GenerationError, HaradaGrid};

pub const GENERATION_FAILED: &str = "Failed to generate goal plan";
pub const LOAD_FAILED: &str = "Failed to load goal plan";
pub const VISIBILITY_FAILED: &str = "Failed to update visibility";
pub const IS_PUBLIC_REQUIRED: &str = "isPublic must be true or false";
pub const INVALID_LIMIT: &str = "limit must be a non-negative integer";

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// Convert a generation failure to its HTTP form.
///
/// Only validation failures reach the client verbatim; everything else is a
/// generic 500 with detail kept in the server log.
pub fn generation_error(err: GenerationError) -> ApiError {
    if err.is_validation() {
        return api_error(StatusCode::BAD_REQUEST, err.public_message());
    }
    tracing::error!("Error generating Harada goal: {}", err);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, GENERATION_FAILED)
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default, rename = "goalText")]
    pub goal_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    #[serde(rename = "isPublic")]
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    pub limit: Option<usize>,
}

/// A newly created grid with its public link.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedGridResponse {
    #[serde(flatten)]
    pub grid: HaradaGrid,
    pub share_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub generator: String,
    pub storage: String,
}
