//! Exclusive creation of per-order destination directories.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::models::Allocation;
use crate::services::naming::NameGenerator;

/// Maximum number of candidates tried before giving up.
pub const MAX_ALLOCATION_ATTEMPTS: usize = 10;

/// Claims a fresh directory under the upload root for each submission.
///
/// Ownership is established by `mkdir` itself, which fails if the path
/// already exists, so two racing requests can never both claim a name.
#[derive(Clone)]
pub struct DirectoryAllocator {
    names: Arc<dyn NameGenerator>,
    max_attempts: usize,
}

impl DirectoryAllocator {
    pub fn new(names: Arc<dyn NameGenerator>) -> Self {
        Self {
            names,
            max_attempts: MAX_ALLOCATION_ATTEMPTS,
        }
    }

    /// Create a new, empty, exclusively owned directory under `root`.
    pub async fn allocate(&self, root: &Path) -> Result<Allocation, IngestError> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.names.generate();
            let path = root.join(&candidate.directory);

            match tokio::fs::create_dir(&path).await {
                Ok(()) => {
                    debug!(
                        attempt,
                        order_number = %candidate.order_number,
                        directory = %candidate.directory,
                        "Allocated destination directory"
                    );
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    warn!(
                        attempt,
                        directory = %candidate.directory,
                        "Destination directory already taken, retrying"
                    );
                }
                Err(e) => {
                    warn!(
                        attempt,
                        path = %path.display(),
                        "Failed to create destination directory: {}", e
                    );
                }
            }
        }

        Err(IngestError::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }
}
