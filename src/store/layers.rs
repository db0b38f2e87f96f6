//! Layer commands.
//!
//! Layers index blocks; they never own them. Removing a layer clears the
//! `layerId` of every block that referenced it, so no block is left pointing
//! at a layer that does not exist.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::CanvasStore;
use crate::error::LienzoError;
use crate::model::{BlockId, Layer, LayerId};

/// Partial layer update, as sent by the layers panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl CanvasStore {
    pub fn layers(&self) -> &[Layer] {
        &self.state.layers
    }

    pub(crate) fn layer_mut(&mut self, id: &LayerId) -> Result<&mut Layer, LienzoError> {
        self.state
            .layers
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| LienzoError::not_found(format!("layer '{}'", id)))
    }

    /// Create an empty layer and make it current.
    pub fn add_layer(&mut self, name: impl Into<String>) -> LayerId {
        let id = LayerId::generate();
        let layer = Layer::new(id.clone(), name);
        info!(layer = %id, name = %layer.name, "Added layer");
        self.state.layers.push(layer);
        self.state.current_layer_id = Some(id.clone());
        id
    }

    /// Remove a layer, clearing `layerId` on every block that referenced it.
    pub fn remove_layer(&mut self, id: &LayerId) -> Result<(), LienzoError> {
        self.ensure_editable()?;
        let index = self
            .state
            .layers
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| LienzoError::not_found(format!("layer '{}'", id)))?;
        self.state.layers.remove(index);

        let state = &mut self.state;
        for block in state
            .blocks
            .iter_mut()
            .chain(state.main_canvas_blocks.iter_mut())
            .chain(state.preview_canvas_blocks.iter_mut().flatten())
            .filter(|b| b.layer_id.as_ref() == Some(id))
        {
            block.layer_id = None;
        }
        if state.current_layer_id.as_ref() == Some(id) {
            state.current_layer_id = None;
        }
        debug_assert!(
            state
                .blocks
                .iter()
                .chain(state.main_canvas_blocks.iter())
                .all(|b| b.layer_id.as_ref() != Some(id)),
            "block still references removed layer"
        );
        Ok(())
    }

    pub fn rename_layer(&mut self, id: &LayerId, name: impl Into<String>) -> Result<(), LienzoError> {
        self.layer_mut(id)?.name = name.into();
        Ok(())
    }

    pub fn set_layer_visible(&mut self, id: &LayerId, visible: bool) -> Result<(), LienzoError> {
        self.layer_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn set_layer_locked(&mut self, id: &LayerId, locked: bool) -> Result<(), LienzoError> {
        self.layer_mut(id)?.locked = locked;
        Ok(())
    }

    /// Set layer opacity, clamped to 0..=1.
    pub fn set_layer_opacity(&mut self, id: &LayerId, opacity: f64) -> Result<(), LienzoError> {
        self.layer_mut(id)?.opacity = opacity.clamp(0.0, 1.0);
        Ok(())
    }

    /// Apply every field present in `patch`.
    pub fn update_layer(&mut self, id: &LayerId, patch: LayerPatch) -> Result<(), LienzoError> {
        self.layer_mut(id)?;
        if let Some(name) = patch.name {
            self.rename_layer(id, name)?;
        }
        if let Some(visible) = patch.visible {
            self.set_layer_visible(id, visible)?;
        }
        if let Some(locked) = patch.locked {
            self.set_layer_locked(id, locked)?;
        }
        if let Some(opacity) = patch.opacity {
            self.set_layer_opacity(id, opacity)?;
        }
        Ok(())
    }

    /// Choose the layer new blocks land on. `None` means no layer.
    pub fn set_current_layer(&mut self, id: Option<LayerId>) -> Result<(), LienzoError> {
        if let Some(id) = &id
            && self.state.layer(id).is_none()
        {
            return Err(LienzoError::invariant(format!("no layer '{}'", id)));
        }
        self.state.current_layer_id = id;
        Ok(())
    }

    /// Move a block onto a layer, or off every layer with `None`.
    ///
    /// The target layer must exist; the block leaves its previous layer's
    /// index.
    pub fn assign_to_layer(
        &mut self,
        block_id: &BlockId,
        layer_id: Option<LayerId>,
    ) -> Result<(), LienzoError> {
        self.ensure_editable()?;
        if self.state.block(block_id).is_none() {
            return Err(LienzoError::not_found(format!("block '{}'", block_id)));
        }
        if let Some(target) = &layer_id
            && self.state.layer(target).is_none()
        {
            return Err(LienzoError::invariant(format!(
                "block '{}' cannot join missing layer '{}'",
                block_id, target
            )));
        }

        for layer in &mut self.state.layers {
            layer.block_ids.retain(|b| b != block_id);
        }
        if let Some(target) = &layer_id {
            self.layer_mut(target)?.block_ids.push(block_id.clone());
        }
        self.edit_everywhere(block_id, |b| b.layer_id = layer_id.clone());
        Ok(())
    }
}
