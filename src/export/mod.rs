//! # Batch Exporter
//!
//! Renders one PNG per data row into a zip archive without disturbing the
//! editable template.
//!
//! ## Row loop
//!
//! The live block set is checked out of the store (entering `Generating`),
//! then for every row, strictly in order:
//!
//! 1. each template block's resolved content/url is written to the live set,
//! 2. the exporter waits a bounded settle interval,
//! 3. the live surface is captured through [`Snapshot`],
//! 4. the PNG is added as `product_{row}.png`.
//!
//! On every exit path (success, failure, cancellation, or the export future
//! being dropped) the checked-out blocks are written back. A failed export
//! never returns a partial archive.

pub mod archive;
pub mod snapshot;

pub use archive::{ArchiveBuilder, ExportArchive};
pub use snapshot::{RasterSnapshot, Snapshot};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::LienzoError;
use crate::model::{Block, DataRow};
use crate::render::Surface;
use crate::store::SharedStore;
use crate::template::resolve_block;

#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Wait between applying a row and capturing it.
    pub settle: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(50),
        }
    }
}

/// Scoped checkout of the live block set.
///
/// Holds the pre-export blocks and puts them back when released, or when
/// dropped without being released.
struct Checkout {
    store: SharedStore,
    original: Option<Vec<Block>>,
}

impl Checkout {
    async fn acquire(store: &SharedStore, rows: usize) -> Result<Self, LienzoError> {
        let original = store.write().await.begin_export(rows)?;
        Ok(Self {
            store: store.clone(),
            original: Some(original),
        })
    }

    fn blocks(&self) -> &[Block] {
        self.original.as_deref().unwrap_or_default()
    }

    async fn release(mut self, failure: Option<String>) {
        // Take only under the lock: if this future is dropped while waiting,
        // Drop still owns the blocks.
        let mut store = self.store.write().await;
        if let Some(original) = self.original.take() {
            store.finish_export(original, failure);
        }
    }
}

impl Drop for Checkout {
    fn drop(&mut self) {
        let Some(original) = self.original.take() else {
            return;
        };
        let failure = Some("Export interrupted".to_string());
        if let Ok(mut store) = self.store.try_write() {
            store.finish_export(original, failure);
        } else if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let store = self.store.clone();
            handle.spawn(async move {
                store.write().await.finish_export(original, failure);
            });
        } else {
            warn!("Export checkout dropped outside a runtime; live blocks not restored");
        }
    }
}

/// Drives batch exports against a shared store.
pub struct Exporter {
    store: SharedStore,
    snapshot: Arc<dyn Snapshot>,
    config: ExportConfig,
    cancel: Arc<AtomicBool>,
}

impl Exporter {
    pub fn new(store: SharedStore, snapshot: Arc<dyn Snapshot>, config: ExportConfig) -> Self {
        Self {
            store,
            snapshot,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked before each row; setting it stops the export.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Export every row of the store's dataset.
    pub async fn export_dataset(&self) -> Result<ExportArchive, LienzoError> {
        let rows = self.store.read().await.dataset().to_vec();
        self.export(&rows).await
    }

    /// Export `rows`, one image each, in order.
    pub async fn export(&self, rows: &[DataRow]) -> Result<ExportArchive, LienzoError> {
        if rows.is_empty() {
            return Err(LienzoError::import("No data rows to export"));
        }
        let checkout = Checkout::acquire(&self.store, rows.len()).await?;
        self.cancel.store(false, Ordering::SeqCst);
        info!(rows = rows.len(), "Export started");

        let result = self.render_rows(checkout.blocks(), rows).await;
        match &result {
            Ok(archive) => {
                checkout.release(None).await;
                info!(
                    file = %archive.file_name,
                    entries = archive.entries.len(),
                    bytes = archive.bytes.len(),
                    "Export finished"
                );
            }
            Err(e) => {
                error!(error = %e, "Export failed");
                checkout.release(Some(e.to_string())).await;
            }
        }
        result
    }

    async fn render_rows(
        &self,
        template: &[Block],
        rows: &[DataRow],
    ) -> Result<ExportArchive, LienzoError> {
        let mut frames: Vec<(String, Vec<u8>)> = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let number = i + 1;
            if self.cancel.load(Ordering::SeqCst) {
                return Err(LienzoError::Cancelled(number));
            }

            {
                let mut store = self.store.write().await;
                for block in template {
                    if let Some(patch) = resolve_block(block, row) {
                        store.update_block_content(&block.id, &patch);
                    }
                }
            }

            if !self.config.settle.is_zero() {
                tokio::time::sleep(self.config.settle).await;
            }

            let surface = Surface::live(self.store.read().await.state());
            let png = self
                .snapshot
                .capture(&surface)
                .await
                .map_err(|e| LienzoError::Render {
                    row: number,
                    message: e.to_string(),
                })?;
            debug!(row = number, bytes = png.len(), "Captured row");
            frames.push((archive::entry_name(number), png));

            let progress = (number * 100 / rows.len()) as u8;
            self.store.write().await.set_export_progress(progress);
        }

        let mut archive = ArchiveBuilder::new();
        for (name, png) in &frames {
            archive.add(name, png)?;
        }
        archive.finish(archive::archive_name())
    }
}
