//! Shared test helpers for ingestion tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_web::cookie::Key;
use order_intake_lib::db::DbPool;
use order_intake_lib::models::OrderFields;
use order_intake_lib::services::{IngestionPipeline, TimeSeededNames};
use tempfile::TempDir;

/// Upload root plus a migrated SQLite store, both removed on drop.
pub struct TestEnv {
    pub upload_root: TempDir,
    pub session_key: Key,
    _db_dir: TempDir,
    pub pool: DbPool,
}

impl TestEnv {
    pub async fn new() -> Self {
        let upload_root = tempfile::tempdir().unwrap();
        let db_dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}?mode=rwc",
            db_dir.path().join("orders.db").display()
        );
        let pool = DbPool::connect(&url, 1, 1)
            .await
            .expect("Failed to open SQLite database");
        pool.run_migrations().await.expect("Failed to run migrations");

        Self {
            upload_root,
            session_key: Key::generate(),
            _db_dir: db_dir,
            pool,
        }
    }

    pub fn root(&self) -> &Path {
        self.upload_root.path()
    }

    pub fn pipeline(&self) -> IngestionPipeline<DbPool> {
        IngestionPipeline::new(
            self.root().to_path_buf(),
            Arc::new(TimeSeededNames::with_seed(7)),
            self.pool.clone(),
        )
    }

    /// Names of every entry directly under the upload root.
    pub fn order_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(self.root())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        dirs.sort();
        dirs
    }
}

pub fn complete_fields() -> OrderFields {
    OrderFields::new("A", "B", "c@d.com")
}
