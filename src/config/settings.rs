//! Resolved application settings.

use std::path::PathBuf;
use std::time::Duration;

use super::{ProviderConfig, DEFAULT_DATABASE_FILENAME, DEFAULT_PAGE_SIZE};
use crate::repository::{DbContext, DieselError};

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Provider request timeout in seconds.
    pub request_timeout: u64,
    /// Upper bound on one reconciliation run, in seconds.
    pub reconcile_timeout_secs: u64,
    /// Products per listing page.
    pub page_size: u32,
    pub provider: ProviderConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pricewatch");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            request_timeout: 30,
            reconcile_timeout_secs: 120,
            page_size: DEFAULT_PAGE_SIZE,
            provider: ProviderConfig::default(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Check if the database appears to be initialized.
    pub fn database_exists(&self) -> bool {
        self.database_url.is_some() || self.database_path().exists()
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_secs)
    }

    /// Create a database context using the configured database URL or path.
    ///
    /// Returns an error if the database URL is invalid.
    pub fn create_db_context(&self) -> Result<DbContext, DieselError> {
        DbContext::from_url(&self.database_url())
    }
}
