//! Persistence seam for committed orders.

use async_trait::async_trait;

use crate::error::IngestError;
use crate::models::NewOrder;

/// Stores an order together with its file list as one atomic unit.
///
/// Implementations must either make the order row and every file row visible
/// together, or leave the store untouched and return
/// [`IngestError::PersistenceFailed`]. They never retry on their own.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Commit `order` and one file row per entry of `files`, returning the generated order id.
    async fn commit(&self, order: &NewOrder, files: &[String]) -> Result<i32, IngestError>;
}
