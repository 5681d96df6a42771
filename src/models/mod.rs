//! Domain models for order intake.

pub mod ingestion;
pub mod order;

// Re-export commonly used types
pub use ingestion::{Allocation, IngestionSummary, SkipReason, SkippedFile};
pub use order::{NewOrder, OrderFields};
