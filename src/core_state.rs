//! Shared service state for request handlers.
//!
//! `CoreState` is built once at startup (`connect`), wrapped in `Arc`, and
//! handed to the HTTP layer. It owns the database connection and the oracle
//! client; `close` tears both down after the server stops.

use std::sync::{Arc, Mutex, PoisonError};

use rusqlite::Connection;
use thiserror::Error;

use crate::config::AppConfig;
use crate::db::{self, DatabaseError};
use crate::oracle::{GeminiClient, Oracle, OracleError};

pub struct CoreState {
    /// Single SQLite connection; statements are short and serialised here.
    db: Mutex<Connection>,
    oracle: Arc<dyn Oracle>,
    config: AppConfig,
}

impl CoreState {
    /// Open the database (running migrations and index creation) and build
    /// the Gemini client from `config`.
    ///
    /// Must be called outside an async context: the blocking HTTP client
    /// owns its own runtime.
    pub fn connect(config: AppConfig) -> Result<Self, CoreError> {
        let conn = db::open_database(&config.db_path)?;
        let oracle = GeminiClient::from_config(&config)?;
        tracing::info!(
            db = %config.db_path.display(),
            oracle_url = %config.gemini_api_url,
            timeout_secs = config.oracle_timeout_secs,
            "Core state connected"
        );
        Ok(Self::with_parts(conn, Arc::new(oracle), config))
    }

    /// Assemble from already-built parts (tests, alternative oracles).
    pub fn with_parts(conn: Connection, oracle: Arc<dyn Oracle>, config: AppConfig) -> Self {
        Self {
            db: Mutex::new(conn),
            oracle,
            config,
        }
    }

    /// In-memory database with the given oracle.
    pub fn in_memory(oracle: Arc<dyn Oracle>) -> Result<Self, CoreError> {
        let conn = db::open_memory_database()?;
        Ok(Self::with_parts(conn, oracle, AppConfig::default()))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn oracle(&self) -> &dyn Oracle {
        self.oracle.as_ref()
    }

    /// Run `f` with exclusive access to the connection.
    ///
    /// A poisoned lock is recovered: the connection holds no in-process
    /// invariants that a panicking holder could break.
    pub fn with_db<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
    {
        let conn = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn)
    }

    /// Close the database connection. The oracle client is dropped here too.
    pub fn close(self) -> Result<(), CoreError> {
        let conn = self.db.into_inner().unwrap_or_else(PoisonError::into_inner);
        conn.close()
            .map_err(|(_, e)| CoreError::Database(DatabaseError::from(e)))?;
        tracing::info!("Core state closed");
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Oracle client error: {0}")]
    Oracle(#[from] OracleError),
}
