//! # Lienzo - Data-Bound Canvas Templates
//!
//! Lienzo is a Rust library for designing a canvas template once and
//! rendering it for every row of a dataset. It provides:
//!
//! - **Template resolution**: bind blocks to data columns or embed `{{column}}`
//!   placeholders, then resolve them per row
//! - **Canvas store**: blocks, selection, layers, grouping and z-order with
//!   enforced invariants
//! - **Rasterizer**: deterministic CPU rendering of text, images, shapes and
//!   lines to PNG
//! - **Batch export**: one PNG per row, collected into a zip archive
//! - **HTTP API**: an axum editor backend over all of the above
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use lienzo::{
//!     config::EditorConfig,
//!     export::{Exporter, RasterSnapshot},
//!     import::{load_dataset, HeaderMode},
//!     store::CanvasStore,
//! };
//!
//! # async fn example() -> Result<(), lienzo::LienzoError> {
//! let config = EditorConfig::default();
//!
//! // Import rows and infer one block per column
//! let dataset = load_dataset("products.json".as_ref(), HeaderMode::Auto).await?;
//! let mut store = CanvasStore::new(config.canvas.clone());
//! store.load_dataset(dataset, config.preview_rows, config.preview_scale)?;
//! let store = store.into_shared();
//!
//! // Render every row into a zip
//! let snapshot = RasterSnapshot::new(
//!     config.image_resolver()?,
//!     config.rasterizer()?,
//! );
//! let exporter = Exporter::new(store, Arc::new(snapshot), config.export_config());
//! let archive = exporter.export_dataset().await?;
//! archive.save_to("out".as_ref()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | Blocks, canvas settings, layers, data rows |
//! | [`template`] | Placeholder substitution, inference, resolution |
//! | [`store`] | The editor session and its commands |
//! | [`import`] | JSON, CSV and spreadsheet import |
//! | [`render`] | Rasterizer and PNG encoding |
//! | [`assets`] | Image fetching and caching |
//! | [`export`] | Batch export to zip |
//! | [`server`] | HTTP editor API |
//! | [`config`] | Editor and server settings |
//! | [`error`] | Error types |

pub mod assets;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod model;
pub mod render;
pub mod server;
pub mod store;
pub mod template;

// Re-exports for convenience
pub use error::LienzoError;
pub use model::{Block, BlockKind, CanvasSettings, DataRow, EditorState};
pub use store::{CanvasStore, SharedStore};
