//! Snapshot source backed by a local file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{parse_rows, ProviderError, SnapshotSource};
use crate::models::ValidatedSnapshot;

/// Reads snapshot rows from a JSON array or NDJSON file.
///
/// The same file is served for any snapshot ID.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot ID used for jobs created from this file.
    pub fn local_snapshot_id(&self) -> String {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        format!(
            "local-{}-{}",
            stem,
            chrono::Utc::now().format("%Y%m%d%H%M%S%6f")
        )
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn fetch(&self, snapshot_id: &str) -> Result<ValidatedSnapshot, ProviderError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let rows = parse_rows(&text, snapshot_id)?;
        let snapshot = ValidatedSnapshot::from_rows(rows);

        debug!(
            path = %self.path.display(),
            records = snapshot.records.len(),
            skipped = snapshot.skipped.len(),
            "read snapshot file"
        );
        Ok(snapshot)
    }
}
