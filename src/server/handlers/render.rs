//! PNG render handlers for the live canvas and preview thumbnails.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::error::LienzoError;
use crate::render::{encode_png, Surface};

use super::super::state::AppState;

/// GET /api/render.png - Render the live canvas.
pub async fn live(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let surface = Surface::live(state.store.read().await.state());
    let png = state.snapshot.capture(&surface).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// GET /api/previews/:index/png - Render one preview thumbnail.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let surface = Surface::preview(state.store.read().await.state(), index)
        .ok_or_else(|| LienzoError::not_found(format!("preview {}", index)))?;
    let images = state.resolver.resolve(&surface.blocks).await;

    let rasterizer = state.rasterizer.clone();
    let scale = state.config.preview_scale;
    let png = tokio::task::spawn_blocking(move || {
        encode_png(&rasterizer.render_scaled(&surface, &images, scale))
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Task error: {}", e),
        )
    })??;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
