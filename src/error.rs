//! # Error Types
//!
//! This module defines error types used throughout the lienzo library.
//!
//! Resolution never fails (missing data degrades to visible fallbacks), so
//! every variant here belongs to an IO boundary (import, image fetch,
//! snapshot, archive) or to a violated store invariant.

use axum::http::StatusCode;
use thiserror::Error;

/// Main error type for lienzo operations
#[derive(Debug, Error)]
pub enum LienzoError {
    /// Malformed, empty or unexpectedly shaped dataset
    #[error("Import error: {0}")]
    Import(String),

    /// Capture or encoding failed while exporting a row (1-based)
    #[error("Render error on row {row}: {message}")]
    Render { row: usize, message: String },

    /// Zip archive could not be written or finalized
    #[error("Archive error: {0}")]
    Archive(String),

    /// Image decoding, fetching or encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Store invariant violated by the caller (duplicate id, dangling layer)
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// Referenced block or layer does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Block sits on a locked layer
    #[error("Block '{0}' is on a locked layer")]
    Locked(String),

    /// A batch export is already generating
    #[error("An export is already in progress")]
    ExportInProgress,

    /// Export stopped by its cancellation flag before the given row (1-based)
    #[error("Export cancelled before row {0}")]
    Cancelled(usize),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LienzoError {
    pub fn import(msg: impl Into<String>) -> Self {
        Self::Import(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// HTTP status used when this error crosses the API boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            LienzoError::Import(_) | LienzoError::Config(_) => StatusCode::BAD_REQUEST,
            LienzoError::Invariant(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LienzoError::NotFound(_) => StatusCode::NOT_FOUND,
            LienzoError::Locked(_) | LienzoError::ExportInProgress => StatusCode::CONFLICT,
            LienzoError::Render { .. }
            | LienzoError::Archive(_)
            | LienzoError::Image(_)
            | LienzoError::Cancelled(_)
            | LienzoError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Handlers return `(StatusCode, String)` errors; this lets them use `?`.
impl From<LienzoError> for (StatusCode, String) {
    fn from(err: LienzoError) -> Self {
        (err.status_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_names_row() {
        let err = LienzoError::Render {
            row: 2,
            message: "capture failed".into(),
        };
        let text = err.to_string();
        assert!(text.contains("row 2"));
        assert!(text.contains("capture failed"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(LienzoError::import("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(LienzoError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(LienzoError::ExportInProgress.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            LienzoError::invariant("dup").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_io_from() {
        let err: LienzoError = std::io::Error::other("boom").into();
        assert!(err.to_string().contains("boom"));
    }
}
