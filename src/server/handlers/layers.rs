//! Layer panel handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::model::{Layer, LayerId};
use crate::store::LayerPatch;

use super::super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewLayerRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LayerResponse {
    pub id: LayerId,
    pub layers: Vec<Layer>,
}

/// POST /api/layers - Create a layer and make it current.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewLayerRequest>,
) -> Result<(StatusCode, Json<LayerResponse>), (StatusCode, String)> {
    let mut store = state.store.write().await;
    store.ensure_editable()?;
    let id = store.add_layer(req.name);
    Ok((
        StatusCode::CREATED,
        Json(LayerResponse {
            id,
            layers: store.layers().to_vec(),
        }),
    ))
}

/// PATCH /api/layers/:id - Rename, hide, lock or fade a layer.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<LayerPatch>,
) -> Result<Json<Vec<Layer>>, (StatusCode, String)> {
    let mut store = state.store.write().await;
    store.ensure_editable()?;
    store.update_layer(&LayerId::from(id), patch)?;
    Ok(Json(store.layers().to_vec()))
}

/// DELETE /api/layers/:id - Remove a layer; its blocks become unlayered.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Layer>>, (StatusCode, String)> {
    let mut store = state.store.write().await;
    store.remove_layer(&LayerId::from(id))?;
    Ok(Json(store.layers().to_vec()))
}
