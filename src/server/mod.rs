//! # HTTP Editor API
//!
//! Exposes one in-memory editor session over JSON and PNG endpoints.
//!
//! ## Usage
//!
//! ```bash
//! lienzo serve --listen 127.0.0.1:8080
//! ```
//!
//! Then `POST /api/import` a JSON, CSV or xlsx dataset, edit the inferred
//! template and `POST /api/export` to download the rendered rows as a zip.

mod handlers;
mod state;

pub use crate::config::ServerConfig;
pub use state::AppState;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::LienzoError;

/// Build the API router around shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Session
        .route("/api/state", get(handlers::editor::get_state))
        .route("/api/import", post(handlers::editor::import))
        // Blocks
        .route("/api/blocks", post(handlers::editor::add_blocks))
        .route("/api/blocks/:id", patch(handlers::editor::update_block))
        .route(
            "/api/blocks/:id/position",
            put(handlers::editor::set_position),
        )
        .route("/api/blocks/:id/order", post(handlers::editor::reorder))
        .route("/api/blocks/:id/ungroup", post(handlers::editor::ungroup))
        // Selection
        .route("/api/selection", put(handlers::editor::select))
        .route(
            "/api/selection/blocks",
            delete(handlers::editor::delete_selected),
        )
        .route(
            "/api/selection/group",
            post(handlers::editor::group_selected),
        )
        // Canvas
        .route("/api/canvas", put(handlers::editor::update_canvas))
        // Layers
        .route("/api/layers", post(handlers::layers::create))
        .route(
            "/api/layers/:id",
            patch(handlers::layers::update).delete(handlers::layers::remove),
        )
        // Rendering
        .route("/api/render.png", get(handlers::render::live))
        .route("/api/previews/:index/png", get(handlers::render::preview))
        // Export
        .route("/api/export", post(handlers::export::export))
        .route("/api/export/status", get(handlers::export::status))
        .route("/api/export/cancel", post(handlers::export::cancel))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use lienzo::config::{EditorConfig, ServerConfig};
/// use lienzo::server::serve;
///
/// # async fn example() -> Result<(), lienzo::LienzoError> {
/// let config = ServerConfig {
///     listen_addr: "127.0.0.1:8080".to_string(),
///     editor: EditorConfig::default(),
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), LienzoError> {
    let app_state = Arc::new(AppState::new(config.editor.clone())?);
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            LienzoError::Config(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;
    info!(addr = %config.listen_addr, "Lienzo editor API listening");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::model::{EditorState, ExportStatus};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::io::Cursor;
    use std::time::Duration;
    use tower::ServiceExt;

    const DATASET: &str = r#"[
        {"name": "Tea", "price": 3},
        {"name": "Coffee", "price": 4.5},
        {"name": "Cocoa", "price": 5}
    ]"#;

    fn app_state() -> Arc<AppState> {
        let config = EditorConfig {
            settle: Duration::ZERO,
            ..Default::default()
        };
        Arc::new(AppState::new(config).unwrap())
    }

    async fn send(
        state: &Arc<AppState>,
        method: &str,
        uri: &str,
        body: Option<String>,
    ) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
        let mut request = Request::builder().method(method).uri(uri);
        if body.is_some() {
            request = request.header(header::CONTENT_TYPE, "application/json");
        }
        let request = request
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .unwrap();
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec(), headers)
    }

    async fn import(state: &Arc<AppState>) -> EditorState {
        let (status, body, _) = send(state, "POST", "/api/import", Some(DATASET.into())).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_state_starts_empty() {
        let state = app_state();
        let (status, body, _) = send(&state, "GET", "/api/state", None).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["canvas"]["width"], json!(800.0));
        assert_eq!(value["blocks"], json!([]));
        assert_eq!(value["export"]["state"], json!("idle"));
    }

    #[tokio::test]
    async fn test_import_infers_template_and_previews() {
        let state = app_state();
        let editor = import(&state).await;
        assert_eq!(editor.blocks.len(), 2);
        assert_eq!(editor.main_canvas_blocks, editor.blocks);
        assert_eq!(editor.preview_canvas_blocks.len(), 2);
        assert_eq!(editor.dataset.len(), 3);

        let (status, body, headers) = send(&state, "GET", "/api/previews/0/png", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
        let png = image::load_from_memory(&body).unwrap();
        assert_eq!((png.width(), png.height()), (200, 150));

        let (status, _, _) = send(&state, "GET", "/api/previews/9/png", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_import_is_400() {
        let state = app_state();
        let (status, _, _) = send(&state, "POST", "/api/import", Some("[]".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    async fn import_as(
        state: &Arc<AppState>,
        uri: &str,
        content_type: &str,
        body: &str,
    ) -> StatusCode {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        router(state.clone()).oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_import_csv_by_content_type() {
        let state = app_state();
        let csv = "name,price\nTea,3\nCoffee,4\n";
        let status = import_as(&state, "/api/import", "text/csv; charset=utf-8", csv).await;
        assert_eq!(status, StatusCode::OK);
        {
            let store = state.store.read().await;
            assert_eq!(store.dataset().len(), 2);
            assert_eq!(store.blocks().len(), 2);
            assert!(store.state().has_headers);
        }

        // Same body labelled as JSON is rejected; `format` overrides the label.
        let status = import_as(&state, "/api/import", "application/json", csv).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let status = import_as(&state, "/api/import?format=csv", "text/plain", csv).await;
        assert_eq!(status, StatusCode::OK);

        let status = import_as(
            &state,
            "/api/import",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            csv,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_add_patch_and_move_block() {
        let state = app_state();
        let (status, body, _) = send(
            &state,
            "POST",
            "/api/blocks",
            Some(json!({"type": "text"}).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let ids: Value = serde_json::from_slice(&body).unwrap();
        let id = ids["ids"][0].as_str().unwrap().to_string();

        let (status, _, _) = send(
            &state,
            "PATCH",
            &format!("/api/blocks/{}", id),
            Some(json!({"content": "Hello"}).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = send(
            &state,
            "PUT",
            &format!("/api/blocks/{}/position", id),
            Some(json!({"x": 10.0, "y": 20.0}).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let store = state.store.read().await;
        let block = store.state().block(&id.as_str().into()).unwrap();
        assert_eq!(block.content(), Some("Hello"));
        assert_eq!((block.x, block.y), (10.0, 20.0));
        assert_eq!(store.blocks(), store.main_blocks());
    }

    #[tokio::test]
    async fn test_unknown_block_is_404() {
        let state = app_state();
        let (status, _, _) = send(
            &state,
            "PATCH",
            "/api/blocks/missing",
            Some(json!({"x": 1.0}).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_select_and_group() {
        let state = app_state();
        let editor = import(&state).await;
        let ids: Vec<_> = editor.blocks.iter().map(|b| b.id.clone()).collect();

        let (status, _, _) = send(
            &state,
            "PUT",
            "/api/selection",
            Some(json!({"ids": ids}).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body, _) = send(&state, "POST", "/api/selection/group", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let group: Value = serde_json::from_slice(&body).unwrap();
        let group_id = group["id"].as_str().unwrap().to_string();

        let (status, body, _) = send(
            &state,
            "POST",
            &format!("/api/blocks/{}/ungroup", group_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let children: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(children["ids"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_layer_lifecycle() {
        let state = app_state();
        let (status, body, _) = send(
            &state,
            "POST",
            "/api/layers",
            Some(json!({"name": "Background"}).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Value = serde_json::from_slice(&body).unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let (status, body, _) = send(
            &state,
            "PATCH",
            &format!("/api/layers/{}", id),
            Some(json!({"visible": false}).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let layers: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(layers[0]["visible"], json!(false));

        let uri = format!("/api/layers/{}", id);
        let (status, _, _) = send(&state, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, _) = send(&state, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_render_png_is_canvas_sized() {
        let state = app_state();
        import(&state).await;
        let (status, body, headers) = send(&state, "GET", "/api/render.png", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
        let png = image::load_from_memory(&body).unwrap();
        assert_eq!((png.width(), png.height()), (800, 600));
    }

    #[tokio::test]
    async fn test_export_returns_zip() {
        let state = app_state();
        let editor = import(&state).await;

        let (status, body, headers) = send(&state, "POST", "/api/export", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("products_"));

        let mut zip = zip::ZipArchive::new(Cursor::new(body)).unwrap();
        assert_eq!(zip.len(), 3);
        assert!(zip.by_name("product_3.png").is_ok());

        let store = state.store.read().await;
        assert_eq!(store.blocks(), editor.blocks.as_slice());
        assert_eq!(store.export_status(), &ExportStatus::Idle);
    }

    #[tokio::test]
    async fn test_export_without_data_is_400() {
        let state = app_state();
        let (status, _, _) = send(&state, "POST", "/api/export", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_edits_conflict_while_generating() {
        let state = app_state();
        let editor = import(&state).await;
        let id = editor.blocks[0].id.clone();
        let original = state.store.write().await.begin_export(3).unwrap();

        let (status, body, _) = send(&state, "GET", "/api/export/status", None).await;
        assert_eq!(status, StatusCode::OK);
        let export: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(export["state"], json!("generating"));

        for (method, uri, body) in [
            ("PATCH", format!("/api/blocks/{}", id), json!({"x": 1.0})),
            ("PUT", "/api/selection".to_string(), json!({"ids": [id]})),
            ("POST", "/api/layers".to_string(), json!({"name": "L"})),
            ("POST", "/api/export".to_string(), json!({})),
        ] {
            let (status, _, _) = send(&state, method, &uri, Some(body.to_string())).await;
            assert_eq!(status, StatusCode::CONFLICT, "{} {}", method, uri);
        }

        state.store.write().await.finish_export(original, None);
    }
}
