//! Scrape job models and lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a scrape job.
///
/// ```text
/// pending ──> done
///    │         ^
///    v         │
/// failed ──────┘   (retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Triggered at the provider, snapshot not yet reconciled.
    Pending,
    /// Snapshot fully reconciled.
    Done,
    /// Reconciliation aborted or timed out; nothing was written.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// `done -> done` is allowed so that re-importing a snapshot stays idempotent.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Done)
                | (Self::Pending, Self::Failed)
                | (Self::Failed, Self::Done)
                | (Self::Failed, Self::Failed)
                | (Self::Done, Self::Done)
        )
    }

    /// Whether the job is finished (no reconciliation pending).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scrape job triggered at the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeJob {
    /// Database row ID.
    pub id: i32,
    /// Provider-issued snapshot identifier (natural key).
    pub snapshot_id: String,
    /// Keyword(s) searched, comma-joined when several were sent.
    pub keyword: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    /// When the job reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
    /// Error message from the last failed reconciliation.
    pub last_error: Option<String>,
}

/// Fields for inserting a new scrape job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub snapshot_id: String,
    pub keyword: String,
    pub created_at: DateTime<Utc>,
}

impl NewJob {
    /// A pending job for a freshly triggered snapshot.
    pub fn pending(snapshot_id: impl Into<String>, keywords: &[String]) -> Self {
        Self {
            snapshot_id: snapshot_id.into(),
            keyword: keywords.join(", "),
            created_at: Utc::now(),
        }
    }
}
