//! Scrape provider collaborators.
//!
//! A provider turns keywords into a snapshot ID (trigger) and later turns a
//! snapshot ID into validated records (fetch). Raw rows are loosely typed
//! JSON; they are validated into [`SnapshotRecord`]s before anything else in
//! the crate sees them.
//!
//! [`SnapshotRecord`]: crate::models::SnapshotRecord

mod client;
mod file;

pub use client::BrightDataClient;
pub use file::FileSnapshotSource;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::CatalogError;
use crate::models::{RawSnapshotRow, ValidatedSnapshot};

/// Errors from talking to a scrape provider or reading a snapshot file.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider not configured: {0} is missing")]
    NotConfigured(&'static str),
    #[error("invalid provider endpoint {0}")]
    InvalidEndpoint(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("snapshot {0} is not ready yet")]
    NotReady(String),
    #[error("provider response has no snapshot_id")]
    MissingSnapshotId,
    #[error("invalid snapshot data: {0}")]
    Parse(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Convert into the catalog error for a failed trigger.
    pub fn into_trigger(self) -> CatalogError {
        CatalogError::Trigger(self.to_string())
    }

    /// Convert into the catalog error for a failed fetch.
    pub fn into_fetch(self) -> CatalogError {
        CatalogError::Fetch(self.to_string())
    }
}

/// Starts asynchronous scrapes.
#[async_trait]
pub trait SnapshotTrigger: Send + Sync {
    /// Request a scrape for the given keywords and return the snapshot ID.
    async fn trigger(&self, keywords: &[String]) -> Result<String, ProviderError>;
}

/// Produces the records of a finished snapshot.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, snapshot_id: &str) -> Result<ValidatedSnapshot, ProviderError>;
}

/// Parse a snapshot body into raw rows.
///
/// Accepts either a JSON array or newline-delimited JSON objects. A single
/// object carrying a `status` field is the provider's "still running"
/// answer and maps to [`ProviderError::NotReady`].
pub fn parse_rows(body: &str, snapshot_id: &str) -> Result<Vec<RawSnapshotRow>, ProviderError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| ProviderError::Parse(e.to_string()));
    }

    let mut rows = Vec::new();
    for (index, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| ProviderError::Parse(format!("line {}: {}", index + 1, e)))?;

        if index == 0 && is_pending_status(&value) {
            return Err(ProviderError::NotReady(snapshot_id.to_string()));
        }

        let row: RawSnapshotRow = serde_json::from_value(value)
            .map_err(|e| ProviderError::Parse(format!("line {}: {}", index + 1, e)))?;
        rows.push(row);
    }

    Ok(rows)
}

fn is_pending_status(value: &serde_json::Value) -> bool {
    match value.get("status").and_then(|s| s.as_str()) {
        Some(status) => matches!(status, "running" | "building" | "collecting" | "starting"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ndjson() {
        let body = r#"{"title":"A","url":"https://shop.example/a","initial_price":10}
{"title":"B","url":"https://shop.example/b","initial_price":null}

{"title":"C","url":"https://shop.example/c","initial_price":"$1,299.00"}
"#;
        let rows = parse_rows(body, "s_1").unwrap();
        assert_eq!(rows.len(), 3);

        let snapshot = ValidatedSnapshot::from_rows(rows);
        assert_eq!(snapshot.records.len(), 2);
        assert_eq!(snapshot.skipped.len(), 1);
        assert_eq!(snapshot.records[1].price, 1299.0);
    }

    #[test]
    fn test_parse_json_array() {
        let body = r#"[{"title":"A","url":"https://shop.example/a","initial_price":3.5}]"#;
        let rows = parse_rows(body, "s_1").unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_running_snapshot_is_not_ready() {
        let body = r#"{"status":"running","message":"Snapshot is not ready yet, try again in 10s"}"#;
        let err = parse_rows(body, "s_9").unwrap_err();
        assert!(matches!(err, ProviderError::NotReady(ref id) if id == "s_9"));
    }

    #[test]
    fn test_malformed_line() {
        let err = parse_rows("{\"title\":\"A\"}\nnot json", "s_1").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_error_conversion() {
        let err = ProviderError::Status {
            status: 401,
            body: "unauthorized".into(),
        };
        assert!(matches!(err.into_trigger(), CatalogError::Trigger(_)));
        assert!(matches!(
            ProviderError::NotReady("s".into()).into_fetch(),
            CatalogError::Fetch(_)
        ));
    }
}
