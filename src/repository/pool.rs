//! SQLite connection pool.
//!
//! SQLite connections are lightweight and file-based, so connections are
//! created on demand rather than pooled. Every connection is configured with
//! foreign key enforcement and a busy timeout before it is handed out.

use std::path::Path;

use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::{AsyncConnection, SimpleAsyncConnection};

use super::util::{to_diesel_error, validate_database_url};

/// Diesel error type alias.
pub type DieselError = diesel::result::Error;

/// Async SQLite connection type.
pub type SqliteConn = SyncConnectionWrapper<SqliteConnection>;

/// Pragmas applied to every new connection.
const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;";

/// SQLite connection pool (lightweight - creates connections on demand).
#[derive(Debug, Clone)]
pub struct DbPool {
    database_url: String,
}

impl DbPool {
    /// Create a pool from a database URL or file path.
    ///
    /// Accepts `sqlite:path`, `sqlite:///abs/path` or a bare path.
    pub fn from_url(url: &str) -> Result<Self, DieselError> {
        validate_database_url(url).map_err(to_diesel_error)?;
        // Strip sqlite: prefix if present - diesel expects just the file path
        let url = url.strip_prefix("sqlite:").unwrap_or(url);
        Ok(Self {
            database_url: url.to_string(),
        })
    }

    /// Create pool from a file path.
    pub fn from_path(path: &Path) -> Self {
        Self {
            database_url: path.display().to_string(),
        }
    }

    /// Get a connection.
    pub async fn get(&self) -> Result<SqliteConn, DieselError> {
        let mut conn = SqliteConn::establish(&self.database_url)
            .await
            .map_err(to_diesel_error)?;
        conn.batch_execute(CONNECTION_PRAGMAS).await?;
        Ok(conn)
    }

    /// Get the database URL (file path form).
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}
