//! Read-only grid endpoints, addressed by share token.
//!
//! - Get a grid
//! - Share links
//! - 9x9 board layout
//! - Plain-text outline
//! - Public gallery

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::routes::AppState;
use super::types::*;
use crate::grid::{layout, render_outline, HaradaGrid, Layout};
use crate::share::ShareLinks;
use crate::store::{load_grid, load_public_grids, DEFAULT_GALLERY_LIMIT};

/// Create grid routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:share_token", get(get_grid))
        .route("/:share_token/share", get(get_share_links))
        .route("/:share_token/layout", get(get_layout))
        .route("/:share_token/outline", get(get_outline))
}

async fn find_grid(state: &AppState, share_token: &str) -> Result<HaradaGrid, ApiError> {
    match load_grid(state.store.as_ref(), share_token).await {
        Ok(Some(grid)) => Ok(grid),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "Grid not found")),
        Err(e) => {
            tracing::error!("Error loading shared grid {}: {}", share_token, e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, LOAD_FAILED))
        }
    }
}

/// GET /api/grids/:share_token - Get a grid.
async fn get_grid(
    State(state): State<Arc<AppState>>,
    Path(share_token): Path<String>,
) -> Result<Json<HaradaGrid>, ApiError> {
    find_grid(&state, &share_token).await.map(Json)
}

/// GET /api/grids/:share_token/share - Share URL and social links.
async fn get_share_links(
    State(state): State<Arc<AppState>>,
    Path(share_token): Path<String>,
) -> Result<Json<ShareLinks>, ApiError> {
    let grid = find_grid(&state, &share_token).await?;
    Ok(Json(ShareLinks::new(
        &state.config.public_base_url,
        &grid.goal.share_token,
        &grid.goal.goal_text,
    )))
}

/// GET /api/grids/:share_token/layout - 9x9 board.
async fn get_layout(
    State(state): State<Arc<AppState>>,
    Path(share_token): Path<String>,
) -> Result<Json<Layout>, ApiError> {
    let grid = find_grid(&state, &share_token).await?;
    Ok(Json(layout(&grid)))
}

/// GET /api/grids/:share_token/outline - Plain-text outline.
async fn get_outline(
    State(state): State<Arc<AppState>>,
    Path(share_token): Path<String>,
) -> Result<String, ApiError> {
    let grid = find_grid(&state, &share_token).await?;
    Ok(render_outline(&grid))
}

/// GET /api/gallery - Public grids, newest first.
pub async fn gallery(
    State(state): State<Arc<AppState>>,
    query: Result<Query<GalleryQuery>, QueryRejection>,
) -> Result<Json<Vec<HaradaGrid>>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        tracing::debug!("Rejected gallery query: {}", rejection);
        api_error(StatusCode::BAD_REQUEST, INVALID_LIMIT)
    })?;
    let limit = query.limit.unwrap_or(DEFAULT_GALLERY_LIMIT);
    load_public_grids(state.store.as_ref(), limit)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Error loading public grids: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, LOAD_FAILED)
        })
}
