use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use rusqlite::Connection;

use crate::config::Config;
use crate::error::ApiError;

/// Shared application state. The whole workload is single-row
/// request/response, so one mutex-guarded connection is enough; concurrent
/// writers serialize here with last-write-wins semantics.
pub struct AppState {
    db: Mutex<Connection>,
    pub config: Config,
}

impl AppState {
    pub fn new(conn: Connection, config: Config) -> Self {
        Self {
            db: Mutex::new(conn),
            config,
        }
    }

    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal(anyhow!("database mutex poisoned")))
    }
}
