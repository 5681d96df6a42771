//! Cleanup service for orphaned, empty order directories.
//!
//! A submission that fails field validation leaves its freshly allocated
//! directory behind. This task removes such directories once they are older
//! than a grace period, so in-flight submissions are never disturbed.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::services::naming::is_order_directory;

/// Configuration for the cleanup service.
#[derive(Clone, Debug)]
pub struct CleanupConfig {
    /// Upload root containing order directories
    pub upload_dir: PathBuf,
    /// Minimum age before an empty order directory is removed
    pub grace_period: Duration,
    /// How often to run cleanup
    pub interval: Duration,
}

/// Start the cleanup background task.
///
/// Does nothing when the interval is zero.
pub fn start_cleanup_task(config: CleanupConfig) {
    if config.interval.is_zero() {
        info!("Orphan directory sweeper disabled");
        return;
    }

    tokio::spawn(async move {
        info!(
            "Starting orphan directory sweeper (grace: {}s, interval: {}s)",
            config.grace_period.as_secs(),
            config.interval.as_secs()
        );

        let mut ticker = interval(config.interval);

        loop {
            ticker.tick().await;

            match sweep_orphaned_dirs(&config.upload_dir, config.grace_period).await {
                Ok(0) => {}
                Ok(removed) => info!("Removed {} orphaned order directories", removed),
                Err(e) => error!("Cleanup task error: {}", e),
            }
        }
    });
}

/// Remove empty order directories under `upload_dir` older than `grace_period`.
///
/// Returns the number of directories removed. Directories that are not empty,
/// not shaped like order directories, or too recent are left alone.
pub async fn sweep_orphaned_dirs(
    upload_dir: &Path,
    grace_period: Duration,
) -> std::io::Result<usize> {
    let mut entries = tokio::fs::read_dir(upload_dir).await?;
    let now = SystemTime::now();
    let mut removed = 0;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !is_order_directory(name) {
            continue;
        }

        let metadata = match entry.metadata().await {
            Ok(m) if m.is_dir() => m,
            Ok(_) => continue,
            Err(e) => {
                warn!("Failed to stat {}: {}", name, e);
                continue;
            }
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age < grace_period {
            continue;
        }

        // remove_dir refuses non-empty directories, which is the emptiness check.
        match tokio::fs::remove_dir(entry.path()).await {
            Ok(()) => {
                debug!(directory = %name, "Removed orphaned order directory");
                removed += 1;
            }
            Err(e) => debug!(directory = %name, "Keeping order directory: {}", e),
        }
    }

    Ok(removed)
}
