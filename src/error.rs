//! Error types surfaced by the catalog core.

use std::time::Duration;

use thiserror::Error;

use crate::models::JobStatus;

/// Why a reconciliation run was aborted.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("database error during reconciliation: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("reconciliation exceeded its {0:?} deadline")]
    Timeout(Duration),
}

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The provider rejected the scrape request; no job was created.
    #[error("Trigger failed: {0}")]
    Trigger(String),
    /// Snapshot not ready or provider error; the job stays pending.
    #[error("Snapshot fetch failed: {0}")]
    Fetch(String),
    /// Reconciliation aborted; nothing from the run is visible.
    #[error("Ingestion of job {job_id} failed: {source}")]
    Ingestion {
        job_id: i32,
        #[source]
        source: IngestionError,
    },
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    /// Product is already favourited / tracked.
    #[error("{0}")]
    Conflict(String),
    #[error("Job {job_id} cannot move from {from} to {to}")]
    InvalidTransition {
        job_id: i32,
        from: JobStatus,
        to: JobStatus,
    },
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl CatalogError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Errors that should be shown to the user as a warning rather than a failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Conflict(_))
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = CatalogError::not_found("Product", 42);
        assert_eq!(err.to_string(), "Product not found: 42");
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_ingestion_message() {
        let err = CatalogError::Ingestion {
            job_id: 3,
            source: IngestionError::Timeout(Duration::from_secs(30)),
        };
        assert_eq!(
            err.to_string(),
            "Ingestion of job 3 failed: reconciliation exceeded its 30s deadline"
        );
        assert!(!err.is_user_facing());
    }

    #[test]
    fn test_sub_second_deadline_message() {
        let err = IngestionError::Timeout(Duration::from_millis(150));
        assert_eq!(err.to_string(), "reconciliation exceeded its 150ms deadline");
    }
}
