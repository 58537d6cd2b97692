//! SQLite driver implementation

use dbflat_core::{ConnectionConfig, DbflatError, QueryExecutor, Result};
use std::time::Duration;

use crate::SqliteConnection;

/// SQLite database driver
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        tracing::debug!("SQLite driver initialized");
        Self
    }

    pub fn name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database named by the `path` (or `database`) parameter.
    ///
    /// An optional `busy_timeout_ms` parameter sets how long a statement
    /// waits on a locked database before failing.
    #[tracing::instrument(skip(self, config), fields(path = ?config.get_string("path")))]
    pub fn connect(&self, config: &ConnectionConfig) -> Result<SqliteConnection> {
        if !config.driver.is_empty() && config.driver != self.name() {
            return Err(DbflatError::Configuration(format!(
                "driver '{}' is not supported, expected 'sqlite'",
                config.driver
            )));
        }

        let path = config.get_string("path").ok_or_else(|| {
            DbflatError::Configuration(
                "SQLite requires a 'path' or 'database' setting. Example: database = \"/path/to/database.db\"".into(),
            )
        })?;

        let busy_timeout = match config.get_string("busy_timeout_ms") {
            Some(raw) => Some(Duration::from_millis(raw.parse::<u64>().map_err(|e| {
                DbflatError::Configuration(format!("invalid busy_timeout_ms '{}': {}", raw, e))
            })?)),
            None => None,
        };

        let conn = SqliteConnection::open(&path).map_err(|e| {
            tracing::error!(error = %e, "failed to connect to SQLite database");
            e
        })?;
        if let Some(timeout) = busy_timeout {
            conn.set_busy_timeout(timeout)?;
        }

        tracing::debug!(path = %path, "SQLite connection created");
        Ok(conn)
    }

    /// Open the database and run a trivial query against it
    #[tracing::instrument(skip(self, config))]
    pub fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        tracing::debug!("testing SQLite connection");
        let conn = self.connect(config)?;
        conn.query_each("SELECT 1", &[], &mut |_| Ok(()))?;
        Ok(())
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}
