//! # Canvas Store
//!
//! [`CanvasStore`] is the sole mutable owner of the [`EditorState`]. The
//! HTTP handlers, the CLI and the exporter all go through its command
//! methods instead of mutating copies of the state.
//!
//! The store is shared as a [`SharedStore`]. Callers take the write lock for
//! one synchronous batch of mutations and release it before awaiting.
//!
//! ## Live and main blocks
//!
//! Editing commands write both the live set (`blocks`) and the durable
//! template (`main_canvas_blocks`). Only [`CanvasStore::update_block_content`]
//! touches the live set alone; the exporter uses it for per-row values and
//! restores the live set afterwards.

pub mod layers;
pub mod resize;

pub use layers::LayerPatch;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::LienzoError;
use crate::model::{
    paint_order, Block, BlockId, BlockKind, BlockPatch, CanvasSettings, DataRow, Dataset,
    EditorState, ExportStatus, GroupBlock, Layer, LayerId,
};
use crate::template;

/// Handle to the store shared by every task of a session.
pub type SharedStore = Arc<RwLock<CanvasStore>>;

/// X position of blocks added from the toolbar.
const ADD_X: f64 = 100.0;
/// Y position of the first toolbar block; later ones stack downward.
const ADD_Y: f64 = 100.0;
const ADD_Y_STEP: f64 = 60.0;

/// Partial replacement of the editor state. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas: Option<CanvasSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Block>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_canvas_blocks: Option<Vec<Block>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_canvas_blocks: Option<Vec<Vec<Block>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_ids: Option<Vec<BlockId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<Layer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_layer_id: Option<Option<LayerId>>,
}

/// Relative or absolute z-order move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZOrder {
    Forward,
    Backward,
    Front,
    Back,
}

#[derive(Debug, Clone, Default)]
pub struct CanvasStore {
    state: EditorState,
}

impl CanvasStore {
    pub fn new(canvas: CanvasSettings) -> Self {
        Self {
            state: EditorState::with_canvas(canvas),
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn canvas(&self) -> &CanvasSettings {
        &self.state.canvas
    }

    pub fn blocks(&self) -> &[Block] {
        &self.state.blocks
    }

    pub fn main_blocks(&self) -> &[Block] {
        &self.state.main_canvas_blocks
    }

    pub fn previews(&self) -> &[Vec<Block>] {
        &self.state.preview_canvas_blocks
    }

    pub fn selected_ids(&self) -> &[BlockId] {
        &self.state.selected_ids
    }

    pub fn dataset(&self) -> &[DataRow] {
        &self.state.dataset
    }

    pub fn export_status(&self) -> &ExportStatus {
        &self.state.export
    }

    /// Live blocks in paint order.
    pub fn paint_order(&self) -> Vec<&Block> {
        paint_order(&self.state.blocks)
    }

    /// Refuse template edits while an export has the live set checked out.
    pub(crate) fn ensure_editable(&self) -> Result<(), LienzoError> {
        if self.state.export.is_generating() {
            Err(LienzoError::ExportInProgress)
        } else {
            Ok(())
        }
    }

    fn live_block(&self, id: &BlockId) -> Result<&Block, LienzoError> {
        self.state
            .block(id)
            .ok_or_else(|| LienzoError::not_found(format!("block '{}'", id)))
    }

    fn ensure_unlocked(&self, block: &Block) -> Result<(), LienzoError> {
        if self.state.is_locked(block) {
            Err(LienzoError::Locked(block.id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Apply `f` to the block with `id` in both the live and main sets.
    fn edit_everywhere(&mut self, id: &BlockId, mut f: impl FnMut(&mut Block)) {
        for block in self
            .state
            .blocks
            .iter_mut()
            .chain(self.state.main_canvas_blocks.iter_mut())
            .filter(|b| &b.id == id)
        {
            f(block);
        }
    }

    // ========================================================================
    // BLOCKS
    // ========================================================================

    /// Append blocks to the live and main sets.
    ///
    /// Ids must be unique across the existing collection and the new batch;
    /// on a duplicate nothing is added.
    pub fn add_blocks(&mut self, new: Vec<Block>) -> Result<(), LienzoError> {
        self.ensure_editable()?;

        self.validate_new_blocks(&new)?;

        for block in &new {
            if let Some(layer_id) = &block.layer_id {
                self.layer_mut(layer_id)?.block_ids.push(block.id.clone());
            }
        }
        debug!(count = new.len(), "Adding blocks");
        self.state.main_canvas_blocks.extend(new.iter().cloned());
        self.state.blocks.extend(new);
        self.debug_assert_consistent();
        Ok(())
    }

    /// Post-condition of the structural commands: live ids are unique and
    /// the selection only names live blocks.
    fn debug_assert_consistent(&self) {
        debug_assert!(
            {
                let mut seen = HashSet::new();
                self.state.blocks.iter().all(|b| seen.insert(&b.id))
            },
            "duplicate block id in the live set"
        );
        debug_assert!(
            self.state
                .selected_ids
                .iter()
                .all(|id| self.state.block(id).is_some()),
            "selection names a block that is not live"
        );
    }

    fn validate_new_blocks(&self, new: &[Block]) -> Result<(), LienzoError> {
        let mut seen: HashSet<&BlockId> = self
            .state
            .blocks
            .iter()
            .chain(self.state.main_canvas_blocks.iter())
            .map(|b| &b.id)
            .collect();
        for block in new {
            if !seen.insert(&block.id) {
                return Err(LienzoError::invariant(format!(
                    "duplicate block id '{}'",
                    block.id
                )));
            }
            if let Some(layer_id) = &block.layer_id
                && self.state.layer(layer_id).is_none()
            {
                return Err(LienzoError::invariant(format!(
                    "block '{}' references missing layer '{}'",
                    block.id, layer_id
                )));
            }
        }
        Ok(())
    }

    /// Add a toolbar default block of the given type tag.
    ///
    /// New blocks stack downward from (100, 100) and land on top of the
    /// current paint order and on the current layer, if any. The new block
    /// becomes the selection.
    pub fn add_block_of_type(&mut self, type_name: &str) -> Result<BlockId, LienzoError> {
        let kind = BlockKind::editor_default(type_name)
            .ok_or_else(|| LienzoError::invariant(format!("unknown block type '{}'", type_name)))?;
        let n = self.state.blocks.len();
        let mut block = Block::new(BlockId::generate(type_name), kind)
            .at(ADD_X, ADD_Y + ADD_Y_STEP * n as f64)
            .z(n as i32 + 1);
        block.layer_id = self.state.current_layer_id.clone();
        let id = block.id.clone();
        self.add_blocks(vec![block])?;
        self.state.selected_ids = vec![id.clone()];
        Ok(id)
    }

    /// Merge-patch the live block only. No-op if the id is absent.
    ///
    /// This is the exporter's path; it is allowed while generating.
    pub fn update_block_content(&mut self, id: &BlockId, patch: &BlockPatch) {
        if let Some(block) = self.state.blocks.iter_mut().find(|b| &b.id == id) {
            patch.apply(block);
        }
    }

    /// Merge-patch a block in both the live and main sets.
    ///
    /// No-op if the id is absent. Blocks on a locked layer are rejected, and
    /// a patch that moves the block to another layer keeps the layer index
    /// in sync.
    pub fn update_block(&mut self, id: &BlockId, patch: &BlockPatch) -> Result<(), LienzoError> {
        self.ensure_editable()?;
        let Some(block) = self.state.block(id) else {
            return Ok(());
        };
        self.ensure_unlocked(block)?;

        if let Some(layer_id) = &patch.layer_id {
            self.assign_to_layer(id, layer_id.clone())?;
        }
        self.edit_everywhere(id, |b| patch.apply(b));
        Ok(())
    }

    pub fn update_block_position(
        &mut self,
        id: &BlockId,
        x: f64,
        y: f64,
    ) -> Result<(), LienzoError> {
        self.live_block(id)?;
        self.update_block(id, &BlockPatch::position(x, y))
    }

    /// Overwrite the live set with a deep copy of the template.
    pub fn reset_blocks(&mut self) {
        self.state.blocks = self.state.main_canvas_blocks.clone();
    }

    /// Replace canvas settings as-is. Blocks are not rescaled; see
    /// [`CanvasStore::resize_canvas`] for that.
    pub fn update_canvas_settings(&mut self, settings: CanvasSettings) {
        self.state.canvas = settings;
    }

    /// Apply a literal partial state.
    pub fn set_state(&mut self, patch: StatePatch) {
        let state = &mut self.state;
        if let Some(canvas) = patch.canvas {
            state.canvas = canvas;
        }
        if let Some(blocks) = patch.blocks {
            state.blocks = blocks;
        }
        if let Some(main) = patch.main_canvas_blocks {
            state.main_canvas_blocks = main;
        }
        if let Some(previews) = patch.preview_canvas_blocks {
            state.preview_canvas_blocks = previews;
        }
        if let Some(selected) = patch.selected_ids {
            state.selected_ids = selected;
        }
        if let Some(layers) = patch.layers {
            state.layers = layers;
        }
        if let Some(current) = patch.current_layer_id {
            state.current_layer_id = current;
        }
        let live: HashSet<&BlockId> = state.blocks.iter().map(|b| &b.id).collect();
        state.selected_ids.retain(|id| live.contains(id));
    }

    /// Apply a partial state computed from the current one.
    pub fn set_state_with(&mut self, f: impl FnOnce(&EditorState) -> StatePatch) {
        let patch = f(&self.state);
        self.set_state(patch);
    }

    /// Move a block in the paint order, in both the live and main sets.
    pub fn reorder(&mut self, id: &BlockId, order: ZOrder) -> Result<(), LienzoError> {
        self.ensure_editable()?;
        let block = self.live_block(id)?;
        self.ensure_unlocked(block)?;

        let current = block.z_index;
        let others = self.state.blocks.iter().filter(|b| &b.id != id);
        let z = match order {
            ZOrder::Forward => current + 1,
            ZOrder::Backward => current - 1,
            ZOrder::Front => others.map(|b| b.z_index).max().map_or(current, |m| m + 1),
            ZOrder::Back => others.map(|b| b.z_index).min().map_or(current, |m| m - 1),
        };
        self.edit_everywhere(id, |b| b.z_index = z);
        Ok(())
    }

    pub fn bring_forward(&mut self, id: &BlockId) -> Result<(), LienzoError> {
        self.reorder(id, ZOrder::Forward)
    }

    pub fn send_backward(&mut self, id: &BlockId) -> Result<(), LienzoError> {
        self.reorder(id, ZOrder::Backward)
    }

    pub fn bring_to_front(&mut self, id: &BlockId) -> Result<(), LienzoError> {
        self.reorder(id, ZOrder::Front)
    }

    pub fn send_to_back(&mut self, id: &BlockId) -> Result<(), LienzoError> {
        self.reorder(id, ZOrder::Back)
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    /// Replace the selection. Ids not present in the live set are dropped.
    pub fn select(&mut self, ids: impl IntoIterator<Item = BlockId>) {
        let mut selected = Vec::new();
        for id in ids {
            if self.state.block(&id).is_some() && !selected.contains(&id) {
                selected.push(id);
            }
        }
        self.state.selected_ids = selected;
    }

    pub fn toggle_selection(&mut self, id: &BlockId) {
        if let Some(pos) = self.state.selected_ids.iter().position(|s| s == id) {
            self.state.selected_ids.remove(pos);
        } else if self.state.block(id).is_some() {
            self.state.selected_ids.push(id.clone());
        }
    }

    pub fn clear_selection(&mut self) {
        self.state.selected_ids.clear();
    }

    /// Delete every selected block.
    ///
    /// Blocks leave the live set, the main set, the selection, group
    /// children and layer indexes in one step. If any selected block is on a
    /// locked layer nothing is deleted.
    pub fn delete_selected(&mut self) -> Result<Vec<BlockId>, LienzoError> {
        self.ensure_editable()?;
        for id in &self.state.selected_ids {
            if let Some(block) = self.state.block(id) {
                self.ensure_unlocked(block)?;
            }
        }

        let doomed: Vec<BlockId> = std::mem::take(&mut self.state.selected_ids);
        self.remove_blocks(&doomed);
        self.debug_assert_consistent();
        debug!(count = doomed.len(), "Deleted selected blocks");
        Ok(doomed)
    }

    fn remove_blocks(&mut self, ids: &[BlockId]) {
        let gone: HashSet<&BlockId> = ids.iter().collect();
        let state = &mut self.state;
        state.blocks.retain(|b| !gone.contains(&b.id));
        state.main_canvas_blocks.retain(|b| !gone.contains(&b.id));
        for block in state
            .blocks
            .iter_mut()
            .chain(state.main_canvas_blocks.iter_mut())
        {
            if let BlockKind::Group(group) = &mut block.kind {
                group.children.retain(|c| !gone.contains(c));
            }
        }
        for layer in &mut state.layers {
            layer.block_ids.retain(|b| !gone.contains(b));
        }
    }

    // ========================================================================
    // GROUPING
    // ========================================================================

    /// Group the selected blocks.
    ///
    /// The group sits at the mean of its children's coordinates, above every
    /// existing block. Children keep their own coordinates and stay in the
    /// collection; the selection becomes the new group.
    pub fn group_selected(&mut self) -> Result<BlockId, LienzoError> {
        self.ensure_editable()?;
        let selected = self.state.selected_ids.clone();
        if selected.len() < 2 {
            return Err(LienzoError::invariant(format!(
                "grouping needs at least 2 selected blocks, got {}",
                selected.len()
            )));
        }

        let (x, y) = {
            let members: Vec<&Block> = selected
                .iter()
                .filter_map(|id| self.state.block(id))
                .collect();
            let count = members.len() as f64;
            (
                members.iter().map(|b| b.x).sum::<f64>() / count,
                members.iter().map(|b| b.y).sum::<f64>() / count,
            )
        };
        let z = self
            .state
            .blocks
            .iter()
            .map(|b| b.z_index)
            .max()
            .unwrap_or(0)
            + 1;

        let group = Block::new(
            BlockId::generate("group"),
            BlockKind::Group(GroupBlock {
                children: selected,
            }),
        )
        .at(x, y)
        .z(z);
        let id = group.id.clone();
        self.add_blocks(vec![group])?;
        self.state.selected_ids = vec![id.clone()];
        self.debug_assert_consistent();
        info!(group = %id, "Grouped blocks");
        Ok(id)
    }

    /// Remove a group block and select its children.
    pub fn ungroup(&mut self, id: &BlockId) -> Result<Vec<BlockId>, LienzoError> {
        self.ensure_editable()?;
        let block = self.live_block(id)?;
        let BlockKind::Group(group) = &block.kind else {
            return Err(LienzoError::invariant(format!("block '{}' is not a group", id)));
        };
        let children = group.children.clone();

        self.remove_blocks(std::slice::from_ref(id));
        self.select(children.clone());
        self.debug_assert_consistent();
        Ok(children)
    }

    // ========================================================================
    // DATASET
    // ========================================================================

    /// Replace the template with one inferred from `dataset` and rebuild the
    /// previews.
    pub fn load_dataset(
        &mut self,
        dataset: Dataset,
        preview_count: usize,
        preview_scale: f64,
    ) -> Result<(), LienzoError> {
        self.ensure_editable()?;
        if dataset.rows.is_empty() {
            return Err(LienzoError::import("dataset has no rows"));
        }

        let template = template::infer_template(&dataset.rows);
        let previews =
            template::build_previews(&template, &dataset.rows, preview_count, preview_scale);
        info!(
            rows = dataset.rows.len(),
            blocks = template.len(),
            previews = previews.len(),
            "Loaded dataset"
        );

        let state = &mut self.state;
        state.main_canvas_blocks = template.clone();
        state.blocks = template;
        state.preview_canvas_blocks = previews;
        state.selected_ids.clear();
        for layer in &mut state.layers {
            layer.block_ids.clear();
        }
        state.dataset = dataset.rows;
        state.has_headers = dataset.has_headers;
        Ok(())
    }

    /// Re-resolve previews from the current template.
    pub fn refresh_previews(&mut self, preview_count: usize, preview_scale: f64) {
        self.state.preview_canvas_blocks = template::build_previews(
            &self.state.main_canvas_blocks,
            &self.state.dataset,
            preview_count,
            preview_scale,
        );
    }

    // ========================================================================
    // EXPORT CHECKOUT
    // ========================================================================

    /// Enter `Generating` and hand out a deep copy of the live set.
    pub(crate) fn begin_export(&mut self, rows: usize) -> Result<Vec<Block>, LienzoError> {
        self.ensure_editable()?;
        self.state.export = ExportStatus::Generating { progress: 0, rows };
        Ok(self.state.blocks.clone())
    }

    pub(crate) fn set_export_progress(&mut self, progress: u8) {
        if let ExportStatus::Generating { rows, .. } = self.state.export {
            self.state.export = ExportStatus::Generating {
                progress: progress.min(100),
                rows,
            };
        }
    }

    /// Put the checked-out live set back and leave `Generating`.
    pub(crate) fn finish_export(&mut self, original: Vec<Block>, failure: Option<String>) {
        self.state.blocks = original;
        self.state.export = match failure {
            Some(message) => ExportStatus::Failed { message },
            None => ExportStatus::Idle,
        };
        self.debug_assert_consistent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ShapeBlock, TextBlock};
    use pretty_assertions::assert_eq;

    fn text(id: &str, x: f64, y: f64) -> Block {
        Block::new(id, BlockKind::Text(TextBlock::new(id))).at(x, y)
    }

    fn store_with(blocks: Vec<Block>) -> CanvasStore {
        let mut store = CanvasStore::default();
        store.add_blocks(blocks).unwrap();
        store
    }

    fn ids(ids: &[&str]) -> Vec<BlockId> {
        ids.iter().map(|s| BlockId::from(*s)).collect()
    }

    #[test]
    fn test_add_blocks_updates_live_and_main() {
        let store = store_with(vec![text("a", 0.0, 0.0), text("b", 1.0, 1.0)]);
        assert_eq!(store.blocks().len(), 2);
        assert_eq!(store.blocks(), store.main_blocks());
    }

    #[test]
    fn test_add_blocks_rejects_duplicates_atomically() {
        let mut store = store_with(vec![text("a", 0.0, 0.0)]);
        let err = store
            .add_blocks(vec![text("b", 0.0, 0.0), text("a", 0.0, 0.0)])
            .unwrap_err();
        assert!(matches!(err, LienzoError::Invariant(_)));
        assert_eq!(store.blocks().len(), 1);

        let err = store
            .add_blocks(vec![text("c", 0.0, 0.0), text("c", 0.0, 0.0)])
            .unwrap_err();
        assert!(matches!(err, LienzoError::Invariant(_)));
        assert_eq!(store.main_blocks().len(), 1);
    }

    #[test]
    fn test_add_block_of_type_stacks() {
        let mut store = CanvasStore::default();
        let first = store.add_block_of_type("shape").unwrap();
        let second = store.add_block_of_type("text").unwrap();
        let a = store.state().block(&first).unwrap();
        let b = store.state().block(&second).unwrap();
        assert_eq!((a.x, a.y, a.z_index), (100.0, 100.0, 1));
        assert_eq!((b.x, b.y, b.z_index), (100.0, 160.0, 2));
        assert_eq!(b.content(), Some("New text"));
        assert_eq!(store.selected_ids(), [second.clone()].as_slice());
        assert!(store.add_block_of_type("chart").is_err());
        assert_eq!(store.selected_ids(), [second].as_slice());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "duplicate block id")]
    fn test_structural_command_checks_unique_ids() {
        let mut store = store_with(vec![text("a", 0.0, 0.0)]);
        store.set_state(StatePatch {
            blocks: Some(vec![text("a", 0.0, 0.0), text("a", 1.0, 1.0)]),
            ..Default::default()
        });
        let _ = store.delete_selected();
    }

    #[test]
    fn test_update_block_content_touches_live_only() {
        let mut store = store_with(vec![text("a", 0.0, 0.0)]);
        store.update_block_content(&"a".into(), &BlockPatch::content("row value"));
        assert_eq!(store.blocks()[0].content(), Some("row value"));
        assert_eq!(store.main_blocks()[0].content(), Some("a"));

        store.reset_blocks();
        assert_eq!(store.blocks(), store.main_blocks());
    }

    #[test]
    fn test_update_block_touches_both_sets() {
        let mut store = store_with(vec![text("a", 0.0, 0.0)]);
        store
            .update_block(&"a".into(), &BlockPatch::content("edited"))
            .unwrap();
        assert_eq!(store.blocks()[0].content(), Some("edited"));
        assert_eq!(store.main_blocks()[0].content(), Some("edited"));
    }

    #[test]
    fn test_update_missing_block_is_noop() {
        let mut store = store_with(vec![text("a", 0.0, 0.0)]);
        let before = store.state().clone();
        store
            .update_block(&"zzz".into(), &BlockPatch::content("x"))
            .unwrap();
        store.update_block_content(&"zzz".into(), &BlockPatch::content("x"));
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_update_block_position() {
        let mut store = store_with(vec![text("a", 0.0, 0.0)]);
        store.update_block_position(&"a".into(), 12.0, 34.0).unwrap();
        assert_eq!((store.main_blocks()[0].x, store.main_blocks()[0].y), (12.0, 34.0));
        assert!(matches!(
            store.update_block_position(&"nope".into(), 1.0, 1.0),
            Err(LienzoError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_state_with_appends() {
        let mut store = store_with(vec![text("a", 0.0, 0.0)]);
        store.set_state_with(|prev| {
            let mut blocks = prev.blocks.clone();
            blocks.push(text("b", 5.0, 5.0));
            StatePatch {
                blocks: Some(blocks),
                ..Default::default()
            }
        });
        assert_eq!(store.blocks().len(), 2);
        assert_eq!(store.main_blocks().len(), 1);
    }

    #[test]
    fn test_set_state_drops_stale_selection() {
        let mut store = store_with(vec![text("a", 0.0, 0.0), text("b", 0.0, 0.0)]);
        store.select(ids(&["a", "b"]));
        store.set_state(StatePatch {
            blocks: Some(vec![text("b", 0.0, 0.0)]),
            ..Default::default()
        });
        assert_eq!(store.selected_ids(), ids(&["b"]).as_slice());
    }

    #[test]
    fn test_selection_ignores_unknown_ids() {
        let mut store = store_with(vec![text("a", 0.0, 0.0), text("b", 0.0, 0.0)]);
        store.select(ids(&["a", "ghost", "a"]));
        assert_eq!(store.selected_ids(), ids(&["a"]).as_slice());
        store.toggle_selection(&"b".into());
        store.toggle_selection(&"a".into());
        assert_eq!(store.selected_ids(), ids(&["b"]).as_slice());
        store.clear_selection();
        assert!(store.selected_ids().is_empty());
    }

    #[test]
    fn test_delete_selected_removes_everywhere() {
        let mut store = store_with(vec![
            text("a", 0.0, 0.0),
            text("b", 100.0, 100.0),
            text("c", 5.0, 5.0),
        ]);
        store.select(ids(&["a", "b"]));
        let group = store.group_selected().unwrap();
        store.select(vec![BlockId::from("a")]);

        let removed = store.delete_selected().unwrap();
        assert_eq!(removed, ids(&["a"]));
        assert!(store.state().block(&"a".into()).is_none());
        assert!(store.main_blocks().iter().all(|b| b.id.as_str() != "a"));
        assert!(store.selected_ids().is_empty());
        assert_eq!(store.state().block(&group).unwrap().children(), ids(&["b"]).as_slice());
    }

    #[test]
    fn test_group_selected_at_mean() {
        let mut store = store_with(vec![
            text("a", 0.0, 0.0).z(3),
            text("b", 100.0, 100.0).z(1),
        ]);
        store.select(ids(&["a", "b"]));
        let group_id = store.group_selected().unwrap();

        let group = store.state().block(&group_id).unwrap();
        assert_eq!((group.x, group.y), (50.0, 50.0));
        assert_eq!(group.z_index, 4);
        assert_eq!(group.children(), ids(&["a", "b"]).as_slice());
        assert_eq!(store.selected_ids(), &[group_id.clone()]);

        let a = store.state().block(&"a".into()).unwrap();
        let b = store.state().block(&"b".into()).unwrap();
        assert_eq!((a.x, a.y), (0.0, 0.0));
        assert_eq!((b.x, b.y), (100.0, 100.0));
        assert_eq!(store.blocks().len(), 3);
        assert_eq!(store.blocks(), store.main_blocks());
    }

    #[test]
    fn test_group_needs_two() {
        let mut store = store_with(vec![text("a", 0.0, 0.0)]);
        store.select(ids(&["a"]));
        assert!(matches!(
            store.group_selected(),
            Err(LienzoError::Invariant(_))
        ));
    }

    #[test]
    fn test_ungroup_selects_children() {
        let mut store = store_with(vec![text("a", 0.0, 0.0), text("b", 10.0, 10.0)]);
        store.select(ids(&["a", "b"]));
        let group = store.group_selected().unwrap();
        let children = store.ungroup(&group).unwrap();
        assert_eq!(children, ids(&["a", "b"]));
        assert_eq!(store.blocks().len(), 2);
        assert_eq!(store.selected_ids(), ids(&["a", "b"]).as_slice());
        assert!(store.ungroup(&"a".into()).is_err());
    }

    #[test]
    fn test_reorder() {
        let mut store = store_with(vec![
            text("a", 0.0, 0.0).z(0),
            text("b", 0.0, 0.0).z(1),
            text("c", 0.0, 0.0).z(2),
        ]);
        store.bring_to_front(&"a".into()).unwrap();
        let order: Vec<&str> = store.paint_order().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);

        store.send_to_back(&"c".into()).unwrap();
        let order: Vec<&str> = store.paint_order().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);

        store.bring_forward(&"b".into()).unwrap();
        store.send_backward(&"a".into()).unwrap();
        assert_eq!(store.main_blocks()[0].z_index, 2);
        assert_eq!(store.main_blocks()[1].z_index, 2);
    }

    #[test]
    fn test_load_dataset() {
        let rows: Vec<DataRow> = vec![
            [("name", "Tea")].into_iter().collect(),
            [("name", "Coffee")].into_iter().collect(),
            [("name", "Cocoa")].into_iter().collect(),
        ];
        let mut store = CanvasStore::default();
        store
            .load_dataset(
                Dataset {
                    rows,
                    has_headers: true,
                },
                5,
                0.5,
            )
            .unwrap();
        assert_eq!(store.blocks().len(), 1);
        assert_eq!(store.blocks(), store.main_blocks());
        assert_eq!(store.previews().len(), 2);
        assert_eq!(store.previews()[0][0].content(), Some("Coffee"));
        assert_eq!(store.previews()[0][0].x, 25.0);
        assert_eq!(store.dataset().len(), 3);
        assert!(store.state().has_headers);

        let err = store.load_dataset(Dataset::default(), 5, 1.0).unwrap_err();
        assert!(matches!(err, LienzoError::Import(_)));
    }

    #[test]
    fn test_editing_refused_while_generating() {
        let mut store = store_with(vec![text("a", 0.0, 0.0)]);
        let original = store.begin_export(3).unwrap();
        assert!(matches!(store.begin_export(3), Err(LienzoError::ExportInProgress)));
        assert!(matches!(
            store.update_block(&"a".into(), &BlockPatch::content("x")),
            Err(LienzoError::ExportInProgress)
        ));
        assert!(matches!(
            store.add_blocks(vec![Block::new("s", BlockKind::Shape(ShapeBlock::default()))]),
            Err(LienzoError::ExportInProgress)
        ));

        store.update_block_content(&"a".into(), &BlockPatch::content("row"));
        store.set_export_progress(50);
        assert_eq!(
            store.export_status(),
            &ExportStatus::Generating {
                progress: 50,
                rows: 3
            }
        );
        store.finish_export(original, None);
        assert_eq!(store.export_status(), &ExportStatus::Idle);
        assert_eq!(store.blocks(), store.main_blocks());
    }
}
