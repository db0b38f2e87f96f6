//! Proportional rescaling on canvas resize.
//!
//! Going from (W, H) to (W', H') multiplies every block's `x` by W'/W and
//! `y` by H'/H. Font size follows the horizontal factor only. Intrinsic
//! geometry scales too: widths and line lengths by the horizontal factor,
//! heights by the vertical one.

use tracing::info;

use super::CanvasStore;
use crate::error::LienzoError;
use crate::model::{Block, CanvasSettings};

fn rescale(blocks: &mut [Block], sx: f64, sy: f64) {
    for block in blocks {
        block.scale_placement(sx, sy, sx);
        block.scale_geometry(sx, sy);
    }
}

/// Rescale the template, live set and previews, then apply `settings`.
pub fn resize_canvas(store: &mut CanvasStore, settings: CanvasSettings) -> Result<(), LienzoError> {
    store.ensure_editable()?;
    if !(settings.width > 0.0 && settings.height > 0.0) {
        return Err(LienzoError::invariant(format!(
            "canvas size must be positive, got {}x{}",
            settings.width, settings.height
        )));
    }

    let old = store.canvas();
    let sx = settings.width / old.width;
    let sy = settings.height / old.height;
    if sx != 1.0 || sy != 1.0 {
        info!(
            from = %format!("{}x{}", old.width, old.height),
            to = %format!("{}x{}", settings.width, settings.height),
            "Rescaling blocks for canvas resize"
        );
        let state = &mut store.state;
        rescale(&mut state.main_canvas_blocks, sx, sy);
        rescale(&mut state.blocks, sx, sy);
        for preview in &mut state.preview_canvas_blocks {
            rescale(preview, sx, sy);
        }
    }

    store.update_canvas_settings(settings);
    Ok(())
}

impl CanvasStore {
    /// See [`resize_canvas`].
    pub fn resize_canvas(&mut self, settings: CanvasSettings) -> Result<(), LienzoError> {
        resize_canvas(self, settings)
    }
}
