//! The editor's aggregate root.

use serde::{Deserialize, Serialize};

use super::{Block, BlockId, CanvasSettings, DataRow, Layer, LayerId};

/// Batch export state machine: `Idle -> Generating -> (Idle | Failed)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExportStatus {
    #[default]
    Idle,
    /// `progress` is 0..=100, updated once per finished row.
    Generating { progress: u8, rows: usize },
    Failed { message: String },
}

impl ExportStatus {
    pub fn is_generating(&self) -> bool {
        matches!(self, ExportStatus::Generating { .. })
    }
}

/// Everything the editor session holds in memory.
///
/// `blocks` is the live, displayed set. `main_canvas_blocks` is the durable
/// template. The two are equal in steady state and only diverge while an
/// export has the live set checked out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub canvas: CanvasSettings,
    pub blocks: Vec<Block>,
    pub main_canvas_blocks: Vec<Block>,
    pub preview_canvas_blocks: Vec<Vec<Block>>,
    pub selected_ids: Vec<BlockId>,
    pub layers: Vec<Layer>,
    pub current_layer_id: Option<LayerId>,
    /// Imported rows, in source order.
    pub dataset: Vec<DataRow>,
    pub has_headers: bool,
    pub export: ExportStatus,
}

impl EditorState {
    pub fn with_canvas(canvas: CanvasSettings) -> Self {
        Self {
            canvas,
            ..Default::default()
        }
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    /// Whether the block sits on a locked layer. Unlayered blocks are never locked.
    pub fn is_locked(&self, block: &Block) -> bool {
        block
            .layer_id
            .as_ref()
            .and_then(|id| self.layer(id))
            .is_some_and(|l| l.locked)
    }
}
