//! Shared state for the API layer.

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::db::sqlite::open_database;
use crate::pipeline::TaskQueue;
use crate::storage::BlobStore;

/// Shared context for all API routes. Handlers open their own short-lived
/// database connection per request; only the blob store and the queue
/// handle are shared.
#[derive(Clone)]
pub struct ApiContext {
    pub db_path: Arc<PathBuf>,
    pub store: Arc<BlobStore>,
    pub queue: Arc<TaskQueue>,
}

impl ApiContext {
    pub fn new(db_path: PathBuf, store: Arc<BlobStore>, queue: Arc<TaskQueue>) -> Self {
        Self {
            db_path: Arc::new(db_path),
            store,
            queue,
        }
    }

    pub fn open_db(&self) -> Result<Connection, ApiError> {
        open_database(&self.db_path).map_err(|e| ApiError::Internal(format!("Database: {e}")))
    }
}
