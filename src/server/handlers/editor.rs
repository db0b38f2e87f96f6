//! Template editing handlers.
//!
//! Every mutation goes through the store's commands, so edits made while an
//! export is generating come back as 409 Conflict.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::import::{parse_dataset, DataFormat, HeaderMode};
use crate::model::{Block, BlockId, BlockPatch, CanvasSettings, EditorState};
use crate::store::{CanvasStore, ZOrder};

use super::super::state::AppState;

type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Query parameters for import endpoint.
#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    #[serde(default)]
    pub headers: HeaderMode,
    /// Overrides the format implied by `Content-Type`.
    #[serde(default)]
    pub format: Option<DataFormat>,
}

/// Request body for adding blocks: a toolbar type, explicit blocks, or both.
#[derive(Debug, Deserialize)]
pub struct AddBlocksRequest {
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Serialize)]
pub struct BlockIdsResponse {
    pub ids: Vec<BlockId>,
}

#[derive(Debug, Serialize)]
pub struct BlockIdResponse {
    pub id: BlockId,
}

#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub order: ZOrder,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub ids: Vec<BlockId>,
}

/// Rebuild previews after a template edit.
fn refresh(store: &mut CanvasStore, state: &AppState) {
    store.refresh_previews(state.config.preview_rows, state.config.preview_scale);
}

/// GET /api/state - Full editor state.
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<EditorState> {
    Json(state.store.read().await.state().clone())
}

/// POST /api/import - Load a dataset and infer a template from it.
///
/// The body is JSON, CSV or a workbook, chosen by `?format=` or else by
/// `Content-Type`. Anything unrecognized is read as JSON.
pub async fn import(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> ApiResult<Json<EditorState>> {
    let format = query
        .format
        .or_else(|| {
            headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .and_then(DataFormat::from_content_type)
        })
        .unwrap_or(DataFormat::Json);
    let dataset = parse_dataset(&body, format, query.headers)?;
    let mut store = state.store.write().await;
    store.load_dataset(dataset, state.config.preview_rows, state.config.preview_scale)?;
    Ok(Json(store.state().clone()))
}

/// POST /api/blocks - Add a toolbar block and/or explicit blocks.
pub async fn add_blocks(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddBlocksRequest>,
) -> ApiResult<(StatusCode, Json<BlockIdsResponse>)> {
    if req.type_name.is_none() && req.blocks.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Expected a block type or a list of blocks".to_string(),
        ));
    }
    let mut store = state.store.write().await;
    let mut ids: Vec<BlockId> = req.blocks.iter().map(|b| b.id.clone()).collect();
    if !req.blocks.is_empty() {
        store.add_blocks(req.blocks)?;
    }
    if let Some(type_name) = &req.type_name {
        ids.push(store.add_block_of_type(type_name)?);
    }
    refresh(&mut store, &state);
    Ok((StatusCode::CREATED, Json(BlockIdsResponse { ids })))
}

/// PATCH /api/blocks/:id - Merge-patch a block.
pub async fn update_block(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<BlockPatch>,
) -> ApiResult<Json<EditorState>> {
    let id = BlockId::from(id);
    let mut store = state.store.write().await;
    if store.state().block(&id).is_none() {
        return Err((StatusCode::NOT_FOUND, format!("Block '{}' not found", id)));
    }
    store.update_block(&id, &patch)?;
    refresh(&mut store, &state);
    Ok(Json(store.state().clone()))
}

/// PUT /api/blocks/:id/position - Move a block.
pub async fn set_position(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<PositionRequest>,
) -> ApiResult<Json<EditorState>> {
    let mut store = state.store.write().await;
    store.update_block_position(&BlockId::from(id), req.x, req.y)?;
    refresh(&mut store, &state);
    Ok(Json(store.state().clone()))
}

/// POST /api/blocks/:id/order - Change a block's paint order.
pub async fn reorder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<OrderRequest>,
) -> ApiResult<Json<EditorState>> {
    let mut store = state.store.write().await;
    store.reorder(&BlockId::from(id), req.order)?;
    refresh(&mut store, &state);
    Ok(Json(store.state().clone()))
}

/// POST /api/blocks/:id/ungroup - Dissolve a group.
pub async fn ungroup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<BlockIdsResponse>> {
    let mut store = state.store.write().await;
    let ids = store.ungroup(&BlockId::from(id))?;
    refresh(&mut store, &state);
    Ok(Json(BlockIdsResponse { ids }))
}

/// PUT /api/selection - Replace the selection.
pub async fn select(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectionRequest>,
) -> ApiResult<Json<BlockIdsResponse>> {
    let mut store = state.store.write().await;
    store.ensure_editable()?;
    store.select(req.ids);
    Ok(Json(BlockIdsResponse {
        ids: store.selected_ids().to_vec(),
    }))
}

/// DELETE /api/selection/blocks - Delete every selected block.
pub async fn delete_selected(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BlockIdsResponse>> {
    let mut store = state.store.write().await;
    let ids = store.delete_selected()?;
    refresh(&mut store, &state);
    Ok(Json(BlockIdsResponse { ids }))
}

/// POST /api/selection/group - Group the selected blocks.
pub async fn group_selected(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<BlockIdResponse>)> {
    let mut store = state.store.write().await;
    let id = store.group_selected()?;
    refresh(&mut store, &state);
    Ok((StatusCode::CREATED, Json(BlockIdResponse { id })))
}

/// PUT /api/canvas - Change canvas settings, rescaling blocks to a new size.
pub async fn update_canvas(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<CanvasSettings>,
) -> ApiResult<Json<EditorState>> {
    let mut store = state.store.write().await;
    store.resize_canvas(settings)?;
    Ok(Json(store.state().clone()))
}
