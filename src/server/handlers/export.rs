//! Batch export handlers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::model::ExportStatus;

use super::super::state::AppState;

/// POST /api/export - Render every data row and return the zip archive.
pub async fn export(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let archive = state.exporter.export_dataset().await?;
    let disposition = format!("attachment; filename=\"{}\"", archive.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive.bytes,
    ))
}

/// GET /api/export/status - Current export state and progress.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<ExportStatus> {
    Json(state.store.read().await.export_status().clone())
}

/// POST /api/export/cancel - Stop the running export before its next row.
pub async fn cancel(State(state): State<Arc<AppState>>) -> StatusCode {
    state.exporter.cancel();
    StatusCode::ACCEPTED
}
