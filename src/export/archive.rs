//! In-memory zip archive of rendered rows.

use chrono::Local;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::LienzoError;

/// Entry name for a 1-based row number.
pub fn entry_name(row: usize) -> String {
    format!("product_{}.png", row)
}

/// Archive name stamped with the local generation time.
pub fn archive_name() -> String {
    format!("products_{}.zip", Local::now().format("%Y%m%d_%H%M%S_%3f"))
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Entry names, in insertion order.
    pub entries: Vec<String>,
}

impl ExportArchive {
    /// Write the archive into `dir` under its own file name.
    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf, LienzoError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}

/// Accumulates PNG entries. PNG data is already compressed, so entries are
/// stored as-is.
pub struct ArchiveBuilder {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    entries: Vec<String>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, name: &str, bytes: &[u8]) -> Result<(), LienzoError> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        self.zip
            .start_file(name, options)
            .map_err(|e| LienzoError::Archive(format!("Failed to start {}: {}", name, e)))?;
        self.zip
            .write_all(bytes)
            .map_err(|e| LienzoError::Archive(format!("Failed to write {}: {}", name, e)))?;
        self.entries.push(name.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self, file_name: String) -> Result<ExportArchive, LienzoError> {
        let cursor = self
            .zip
            .finish()
            .map_err(|e| LienzoError::Archive(format!("Failed to finalize archive: {}", e)))?;
        Ok(ExportArchive {
            file_name,
            bytes: cursor.into_inner(),
            entries: self.entries,
        })
    }
}
