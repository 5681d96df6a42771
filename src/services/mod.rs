//! Business logic services.

pub mod allocator;
pub mod cleanup;
pub mod ingest;
pub mod metadata;
pub mod naming;
pub mod pipeline;

pub use allocator::DirectoryAllocator;
pub use cleanup::{start_cleanup_task, CleanupConfig};
pub use ingest::{FileIngestor, IngestReport, SpooledFile, Upload, UploadSource};
pub use metadata::MetadataStore;
pub use naming::{NameGenerator, TimeSeededNames};
pub use pipeline::IngestionPipeline;
