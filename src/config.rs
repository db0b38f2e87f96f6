//! Editor and server configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::assets::{ImageResolver, DEFAULT_CACHE_ENTRIES};
use crate::error::LienzoError;
use crate::export::ExportConfig;
use crate::model::CanvasSettings;
use crate::render::{Rasterizer, TextRenderer};

/// Settings for an editor session.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Canvas a new session starts with.
    pub canvas: CanvasSettings,
    /// Number of data rows (after the first) shown as previews.
    pub preview_rows: usize,
    /// Thumbnail scale applied to preview placement.
    pub preview_scale: f64,
    /// Wait between applying a row and capturing it during export.
    pub settle: Duration,
    /// TrueType font for text blocks. The built-in bitmap font is used when unset.
    pub font_path: Option<PathBuf>,
    /// Per-request timeout for remote images.
    pub fetch_timeout: Duration,
    /// Decoded images kept in memory between renders.
    pub image_cache_entries: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSettings::default(),
            preview_rows: 5,
            preview_scale: 0.25,
            settle: Duration::from_millis(50),
            font_path: None,
            fetch_timeout: Duration::from_secs(10),
            image_cache_entries: DEFAULT_CACHE_ENTRIES,
        }
    }
}

impl EditorConfig {
    pub fn validate(&self) -> Result<(), LienzoError> {
        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            return Err(LienzoError::Config(format!(
                "Canvas size must be positive, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        if !(self.preview_scale > 0.0) {
            return Err(LienzoError::Config(format!(
                "Preview scale must be positive, got {}",
                self.preview_scale
            )));
        }
        if self.image_cache_entries == 0 {
            return Err(LienzoError::Config(
                "Image cache must hold at least one image".into(),
            ));
        }
        Ok(())
    }

    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            settle: self.settle,
        }
    }

    /// Rasterizer with the configured font.
    pub fn rasterizer(&self) -> Result<Rasterizer, LienzoError> {
        let text = TextRenderer::load(self.font_path.as_deref())?;
        Ok(Rasterizer::new(text))
    }

    /// Image resolver with the configured timeout and cache bound.
    pub fn image_resolver(&self) -> Result<ImageResolver, LienzoError> {
        ImageResolver::with_capacity(self.fetch_timeout, self.image_cache_entries)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8080")
    pub listen_addr: String,
    pub editor: EditorConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EditorConfig::default();
        config.validate().unwrap();
        assert_eq!(config.canvas.width, 800.0);
        assert_eq!(config.canvas.height, 600.0);
        assert_eq!(config.canvas.background_color, "#ffffff");
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.settle, Duration::from_millis(50));
        assert_eq!(config.image_cache_entries, 64);
    }

    #[test]
    fn test_rejects_non_positive() {
        let mut config = EditorConfig::default();
        config.canvas.width = 0.0;
        assert!(matches!(config.validate(), Err(LienzoError::Config(_))));

        let mut config = EditorConfig::default();
        config.preview_scale = -1.0;
        assert!(matches!(config.validate(), Err(LienzoError::Config(_))));

        let mut config = EditorConfig::default();
        config.canvas.height = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = EditorConfig::default();
        config.image_cache_entries = 0;
        assert!(matches!(config.validate(), Err(LienzoError::Config(_))));
    }

    #[test]
    fn test_missing_font_is_config_error() {
        let config = EditorConfig {
            font_path: Some("/nonexistent/lienzo.ttf".into()),
            ..Default::default()
        };
        assert!(matches!(config.rasterizer(), Err(LienzoError::Config(_))));
    }
}
