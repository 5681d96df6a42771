//! Ingestion pipeline: allocate, validate, ingest, persist.
//!
//! One call to [`IngestionPipeline::run`] handles one submission. Steps run
//! strictly in sequence:
//!
//! 1. **Allocating** - claim a fresh order directory.
//! 2. **Validating** - check the order fields. On failure the empty directory
//!    is left behind for the orphan sweeper.
//! 3. **Ingesting** - copy accepted uploads. If nothing was stored the empty
//!    directory is removed and the run ends without touching the store.
//! 4. **Persisting** - commit the order and its file list atomically. On
//!    failure the copied files remain on disk.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::models::{IngestionSummary, OrderFields};
use crate::services::allocator::DirectoryAllocator;
use crate::services::ingest::{FileIngestor, Upload};
use crate::services::metadata::MetadataStore;
use crate::services::naming::NameGenerator;

/// Orchestrates one submission from raw form input to a committed order.
pub struct IngestionPipeline<S> {
    root: PathBuf,
    allocator: DirectoryAllocator,
    ingestor: FileIngestor,
    store: S,
}

impl<S: MetadataStore> IngestionPipeline<S> {
    pub fn new(root: impl Into<PathBuf>, names: Arc<dyn NameGenerator>, store: S) -> Self {
        let root = root.into();
        Self {
            allocator: DirectoryAllocator::new(names),
            ingestor: FileIngestor::new(root.clone()),
            root,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one submission through the pipeline.
    pub async fn run(
        &self,
        fields: OrderFields,
        uploads: Vec<Upload>,
    ) -> Result<IngestionSummary, IngestError> {
        let allocation = self.allocator.allocate(&self.root).await?;
        debug!(
            order_number = %allocation.order_number,
            directory = %allocation.directory,
            "Stage: allocated"
        );

        let order = fields.validate(&allocation.order_number).inspect_err(|e| {
            warn!(
                directory = %allocation.directory,
                "Order rejected, leaving empty directory for the sweeper: {}", e
            );
        })?;
        debug!(order_number = %order.number, "Stage: validated");

        let report = self
            .ingestor
            .ingest(&allocation.directory, uploads)
            .await?;
        debug!(
            order_number = %order.number,
            stored = report.stored.len(),
            skipped = report.skipped.len(),
            "Stage: ingested"
        );

        if report.stored.is_empty() {
            let dir = self.root.join(&allocation.directory);
            match tokio::fs::remove_dir(&dir).await {
                Ok(()) => info!(
                    directory = %allocation.directory,
                    "No files stored, removed empty directory"
                ),
                Err(e) => warn!(
                    directory = %allocation.directory,
                    "No files stored, failed to remove empty directory: {}", e
                ),
            }

            return Ok(IngestionSummary {
                order_number: allocation.order_number,
                order_id: None,
                stored_file_count: 0,
                stored_files: Vec::new(),
                skipped_files: report.skipped,
            });
        }

        let order_id = self
            .store
            .commit(&order, &report.stored)
            .await
            .inspect_err(|e| {
                warn!(
                    order_number = %order.number,
                    files = report.stored.len(),
                    "Files left on disk without metadata: {}", e
                );
            })?;

        info!(
            order_id,
            order_number = %order.number,
            stored = report.stored.len(),
            skipped = report.skipped.len(),
            "Order ingested"
        );

        Ok(IngestionSummary {
            order_number: order.number,
            order_id: Some(order_id),
            stored_file_count: report.stored.len(),
            stored_files: report.stored,
            skipped_files: report.skipped,
        })
    }
}
