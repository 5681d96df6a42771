//! Ingestion results reported back to the request handler.

use serde::Serialize;
use std::fmt;

/// Why a single uploaded file was not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Extension is not the accepted one. Carries the extension as found (may be empty).
    InvalidExtension { extension: String },
    /// Filename is not a plain file name (empty, `.`, `..`, or contains a separator).
    InvalidFilename,
    /// The upload could not be opened for reading.
    UnreadableUpload,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidExtension { extension } => write!(f, "Invalid extension {}", extension),
            Self::InvalidFilename => write!(f, "Invalid file name"),
            Self::UnreadableUpload => write!(f, "Unreadable upload"),
        }
    }
}

/// A file skipped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: SkipReason,
}

/// Order number and directory name claimed for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Allocation {
    /// Externally visible order number
    pub order_number: String,
    /// Directory name relative to the upload root
    pub directory: String,
}

/// Successful pipeline outcome.
#[derive(Debug, Clone)]
pub struct IngestionSummary {
    pub order_number: String,
    /// Generated order id, `None` when nothing was stored
    pub order_id: Option<i32>,
    pub stored_file_count: usize,
    /// Stored paths relative to the upload root, in upload order
    pub stored_files: Vec<String>,
    pub skipped_files: Vec<SkippedFile>,
}

impl IngestionSummary {
    /// True when no file made it to disk and no order was recorded.
    pub fn is_empty(&self) -> bool {
        self.stored_file_count == 0
    }
}
