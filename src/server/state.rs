//! Server state shared across handlers.

use std::sync::Arc;

use crate::assets::ImageResolver;
use crate::config::EditorConfig;
use crate::error::LienzoError;
use crate::export::{Exporter, RasterSnapshot, Snapshot};
use crate::render::Rasterizer;
use crate::store::{CanvasStore, SharedStore};

/// Application state shared across handlers.
pub struct AppState {
    pub config: EditorConfig,
    /// The single editor session.
    pub store: SharedStore,
    pub rasterizer: Rasterizer,
    pub resolver: ImageResolver,
    /// Captures the live canvas, both for `/api/render.png` and for exports.
    pub snapshot: Arc<dyn Snapshot>,
    pub exporter: Exporter,
}

impl AppState {
    pub fn new(config: EditorConfig) -> Result<Self, LienzoError> {
        config.validate()?;
        let rasterizer = config.rasterizer()?;
        let resolver = config.image_resolver()?;
        let snapshot = Arc::new(RasterSnapshot::new(resolver.clone(), rasterizer.clone()));
        Ok(Self::with_snapshot(config, rasterizer, resolver, snapshot))
    }

    /// Build state around a specific capture backend.
    pub fn with_snapshot(
        config: EditorConfig,
        rasterizer: Rasterizer,
        resolver: ImageResolver,
        snapshot: Arc<dyn Snapshot>,
    ) -> Self {
        let store = CanvasStore::new(config.canvas.clone()).into_shared();
        let exporter = Exporter::new(store.clone(), snapshot.clone(), config.export_config());
        Self {
            config,
            store,
            rasterizer,
            resolver,
            snapshot,
            exporter,
        }
    }
}
