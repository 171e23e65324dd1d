//! Shared application state for the HTTP layer.
//!
//! `CoreState` owns the runtime configuration and hands out one SQLite
//! connection per request. Nothing here is mutable after startup, so it
//! is shared as a plain `Arc<CoreState>`.

use std::path::PathBuf;

use crate::accounts::{self, AccountError};
use crate::config::AppConfig;
use crate::db::{self, DatabaseError};

pub struct CoreState {
    pub config: AppConfig,
    db_path: PathBuf,
}

impl CoreState {
    pub fn new(config: AppConfig) -> Self {
        let db_path = config.database_path();
        Self { config, db_path }
    }

    /// Prepare the data directory, run migrations and bootstrap the admin.
    pub fn initialize(&self) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.config.data_dir)?;
        let conn = self.open_db()?;
        let admin = accounts::bootstrap_admin(
            &conn,
            &self.config.admin,
            self.config.password_iterations,
        )?;
        tracing::info!(
            db = %self.db_path.display(),
            admin = %admin.username,
            "Core state initialized"
        );
        Ok(())
    }

    /// Open a database connection. Each request gets its own.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Account bootstrap failed: {0}")]
    Account(#[from] AccountError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
