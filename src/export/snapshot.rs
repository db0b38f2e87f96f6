//! Surface capture.

use async_trait::async_trait;

use crate::assets::ImageResolver;
use crate::error::LienzoError;
use crate::render::{encode_png, Rasterizer, Surface};

/// Turns a surface into PNG bytes.
#[async_trait]
pub trait Snapshot: Send + Sync {
    async fn capture(&self, surface: &Surface) -> Result<Vec<u8>, LienzoError>;
}

/// Captures with the built-in rasterizer, fetching referenced images first.
#[derive(Clone)]
pub struct RasterSnapshot {
    resolver: ImageResolver,
    rasterizer: Rasterizer,
}

impl RasterSnapshot {
    pub fn new(resolver: ImageResolver, rasterizer: Rasterizer) -> Self {
        Self {
            resolver,
            rasterizer,
        }
    }
}

#[async_trait]
impl Snapshot for RasterSnapshot {
    async fn capture(&self, surface: &Surface) -> Result<Vec<u8>, LienzoError> {
        let images = self.resolver.resolve(&surface.blocks).await;
        let rasterizer = self.rasterizer.clone();
        let surface = surface.clone();
        tokio::task::spawn_blocking(move || {
            let frame = rasterizer.render(&surface, &images);
            encode_png(&frame)
        })
        .await
        .map_err(|e| LienzoError::Image(format!("Render task failed: {}", e)))?
    }
}
