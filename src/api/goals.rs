//! Goal generation and ownership endpoints.
//!
//! - Generate a grid without saving it (the edge-function contract)
//! - Generate and save a grid
//! - Toggle a goal's public visibility

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::routes::AppState;
use super::types::*;
use crate::generator::{validate_goal_text, GOAL_TEXT_REQUIRED};
use crate::grid::{Goal, GridDraft};
use crate::share::share_url;
use crate::store::persist_grid;

/// Pull the goal text out of a request body. The body is read as JSON
/// whatever its content type; bad bodies count as missing text.
fn goal_text_from(body: &[u8]) -> Result<String, ApiError> {
    let goal_text = match serde_json::from_slice::<GenerateRequest>(body) {
        Ok(req) => req.goal_text.unwrap_or_default(),
        Err(e) => {
            tracing::debug!("Rejected generation body: {}", e);
            String::new()
        }
    };

    validate_goal_text(&goal_text)
        .map(str::to_string)
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, GOAL_TEXT_REQUIRED))
}

/// POST /functions/v1/generate-harada-goal - Generate a grid without saving it.
pub async fn generate_grid(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<GridDraft>, ApiError> {
    let goal_text = goal_text_from(&body)?;

    let draft = state
        .generator
        .generate(&goal_text)
        .await
        .map_err(generation_error)?;

    Ok(Json(draft))
}

/// POST /api/goals - Generate a grid and save it as a private goal.
pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedGridResponse>), ApiError> {
    let goal_text = goal_text_from(&body)?;

    let draft = state
        .generator
        .generate(&goal_text)
        .await
        .map_err(generation_error)?;

    let grid = persist_grid(state.store.as_ref(), &goal_text, &draft)
        .await
        .map_err(generation_error)?;

    let url = share_url(&state.config.public_base_url, &grid.goal.share_token);
    tracing::info!("Created goal {} ({})", grid.goal.id, url);

    Ok((
        StatusCode::CREATED,
        Json(CreatedGridResponse {
            grid,
            share_url: url,
        }),
    ))
}

/// PUT /api/goals/:id/visibility - Make a goal public or private.
pub async fn set_visibility(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<Goal>, ApiError> {
    let req: VisibilityRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Rejected visibility body: {}", e);
        api_error(StatusCode::BAD_REQUEST, IS_PUBLIC_REQUIRED)
    })?;

    match state.store.set_public(id, req.is_public).await {
        Ok(Some(goal)) => {
            tracing::info!("Goal {} is now {}", id, if goal.is_public { "public" } else { "private" });
            Ok(Json(goal))
        }
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Goal {} not found", id),
        )),
        Err(e) => {
            tracing::error!("Error toggling visibility of {}: {}", id, e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, VISIBILITY_FAILED))
        }
    }
}
