//! Copies accepted uploads into an allocated order directory.

use async_trait::async_trait;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::models::{SkipReason, SkippedFile};

/// The only extension accepted for ingestion. Compared case-sensitively.
pub const ACCEPTED_EXTENSION: &str = ".ab1";

/// Boxed reader over one upload's content.
pub type UploadReader = Pin<Box<dyn AsyncRead + Send>>;

/// Something an upload's bytes can be read from.
#[async_trait]
pub trait UploadSource: Send + Sync {
    async fn open(&self) -> std::io::Result<UploadReader>;
}

/// Upload content spooled to a local file by the request handler.
#[derive(Debug, Clone)]
pub struct SpooledFile {
    path: PathBuf,
}

impl SpooledFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl UploadSource for SpooledFile {
    async fn open(&self) -> std::io::Result<UploadReader> {
        let file = tokio::fs::File::open(&self.path).await?;
        Ok(Box::pin(file))
    }
}

#[async_trait]
impl UploadSource for Vec<u8> {
    async fn open(&self) -> std::io::Result<UploadReader> {
        Ok(Box::pin(std::io::Cursor::new(self.clone())))
    }
}

/// One uploaded file: the client-supplied name and its content.
pub struct Upload {
    pub filename: String,
    source: Box<dyn UploadSource>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, source: impl UploadSource + 'static) -> Self {
        Self {
            filename: filename.into(),
            source: Box::new(source),
        }
    }
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

/// Files that landed on disk and files that were skipped, both in upload order.
#[derive(Debug, Default, Clone)]
pub struct IngestReport {
    /// Paths relative to the upload root, `<order dir>/<filename>`
    pub stored: Vec<String>,
    pub skipped: Vec<SkippedFile>,
}

/// Writes uploads under `root/<order dir>/`.
#[derive(Debug, Clone)]
pub struct FileIngestor {
    root: PathBuf,
}

impl FileIngestor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Ingest `uploads` in order into the directory `order_dir` under the root.
    ///
    /// Per-file problems are collected in [`IngestReport::skipped`]. Failing to
    /// create or fill a destination file aborts the whole ingestion; files
    /// written before that point stay on disk.
    pub async fn ingest(
        &self,
        order_dir: &str,
        uploads: Vec<Upload>,
    ) -> Result<IngestReport, IngestError> {
        let dest_dir = self.root.join(order_dir);
        let mut report = IngestReport::default();

        for upload in uploads {
            let filename = upload.filename;

            let ext = extension(&filename);
            if ext != ACCEPTED_EXTENSION {
                debug!(file = %filename, extension = %ext, "Skipping file with invalid extension");
                report.skipped.push(SkippedFile {
                    reason: SkipReason::InvalidExtension {
                        extension: ext.to_string(),
                    },
                    filename,
                });
                continue;
            }

            if !is_plain_file_name(&filename) {
                warn!(file = %filename, "Skipping file with invalid name");
                report.skipped.push(SkippedFile {
                    filename,
                    reason: SkipReason::InvalidFilename,
                });
                continue;
            }

            let mut reader = match upload.source.open().await {
                Ok(reader) => reader,
                Err(e) => {
                    warn!(file = %filename, "Error reading upload: {}", e);
                    report.skipped.push(SkippedFile {
                        filename,
                        reason: SkipReason::UnreadableUpload,
                    });
                    continue;
                }
            };

            let dest = dest_dir.join(&filename);
            let mut file = tokio::fs::File::create(&dest).await.map_err(|source| {
                IngestError::DestinationWriteFailed {
                    path: dest.clone(),
                    source,
                }
            })?;

            let bytes = tokio::io::copy(&mut reader, &mut file)
                .await
                .map_err(|source| IngestError::CopyFailed {
                    filename: filename.clone(),
                    source,
                })?;
            file.flush()
                .await
                .map_err(|source| IngestError::CopyFailed {
                    filename: filename.clone(),
                    source,
                })?;

            info!(file = %filename, bytes, directory = %order_dir, "Stored upload");
            report.stored.push(format!("{}/{}", order_dir, filename));
        }

        Ok(report)
    }
}

/// Extension of the final path element including the leading dot, or `""`.
///
/// `"x.ab1"` gives `".ab1"`, `"archive.tar.gz"` gives `".gz"`, `"README"` gives `""`.
pub fn extension(filename: &str) -> &str {
    let base_start = filename.rfind('/').map_or(0, |i| i + 1);
    filename[base_start..]
        .rfind('.')
        .map_or("", |i| &filename[base_start + i..])
}

/// A name that stays inside its directory when joined onto it.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
