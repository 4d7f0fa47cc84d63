//! Scrape job lifecycle.
//!
//! A job is created `pending` when the provider accepts a trigger, stays
//! `pending` while its snapshot is not fetchable, and ends `done` or
//! `failed` depending on how reconciliation went.

use std::time::Duration;

use tracing::{info, warn};

use super::reconcile::{ReconcileReport, SnapshotReconciler, DEFAULT_RECONCILE_TIMEOUT};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{JobStatus, NewJob, ScrapeJob, SkipReason, ValidatedSnapshot};
use crate::provider::{SnapshotSource, SnapshotTrigger};
use crate::repository::util::is_unique_violation;
use crate::repository::DbContext;

/// Outcome of importing a snapshot into the catalog.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub job: ScrapeJob,
    pub report: ReconcileReport,
    /// Rows dropped during validation.
    pub skipped: Vec<SkipReason>,
}

/// Drives jobs from trigger through reconciliation.
pub struct JobService<'a> {
    ctx: &'a DbContext,
    reconcile_timeout: Duration,
}

impl<'a> JobService<'a> {
    pub fn new(ctx: &'a DbContext) -> Self {
        Self {
            ctx,
            reconcile_timeout: DEFAULT_RECONCILE_TIMEOUT,
        }
    }

    pub fn with_reconcile_timeout(mut self, timeout: Duration) -> Self {
        self.reconcile_timeout = timeout;
        self
    }

    /// Trigger a scrape and record the pending job.
    ///
    /// No job is created if the provider rejects the request.
    pub async fn trigger<T>(&self, trigger: &T, keywords: &[String]) -> CatalogResult<ScrapeJob>
    where
        T: SnapshotTrigger + ?Sized,
    {
        let snapshot_id = trigger
            .trigger(keywords)
            .await
            .map_err(|e| e.into_trigger())?;

        self.register(NewJob::pending(snapshot_id, keywords)).await
    }

    /// Record a pending job for a snapshot that already exists.
    pub async fn register(&self, job: NewJob) -> CatalogResult<ScrapeJob> {
        match self.ctx.jobs().create(&job).await {
            Ok(created) => {
                info!(
                    job_id = created.id,
                    snapshot_id = %created.snapshot_id,
                    keyword = %created.keyword,
                    "job created"
                );
                Ok(created)
            }
            Err(e) if is_unique_violation(&e) => Err(CatalogError::Conflict(format!(
                "Snapshot {} already has a job",
                job.snapshot_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch a job's snapshot from `source` and reconcile it.
    ///
    /// A fetch failure leaves the job untouched so it can be retried.
    pub async fn import<S>(&self, job_id: i32, source: &S) -> CatalogResult<ImportSummary>
    where
        S: SnapshotSource + ?Sized,
    {
        let job = self.job(job_id).await?;

        let snapshot = match source.fetch(&job.snapshot_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(job_id, snapshot_id = %job.snapshot_id, "snapshot fetch failed: {}", e);
                return Err(e.into_fetch());
            }
        };

        self.import_snapshot(job, snapshot).await
    }

    /// Reconcile an already validated snapshot under `job`.
    pub async fn import_snapshot(
        &self,
        job: ScrapeJob,
        snapshot: ValidatedSnapshot,
    ) -> CatalogResult<ImportSummary> {
        for reason in &snapshot.skipped {
            warn!(job_id = job.id, "skipped snapshot row: {}", reason.as_str());
        }

        let report = SnapshotReconciler::new(self.ctx)
            .with_timeout(self.reconcile_timeout)
            .reconcile(job.id, &snapshot.records)
            .await?;

        let job = self.job(job.id).await?;
        Ok(ImportSummary {
            job,
            report,
            skipped: snapshot.skipped,
        })
    }

    /// Import every pending job, oldest first.
    ///
    /// Jobs whose snapshot is not ready stay pending and are reported
    /// alongside the successful imports.
    pub async fn import_pending<S>(
        &self,
        source: &S,
    ) -> CatalogResult<Vec<(i32, CatalogResult<ImportSummary>)>>
    where
        S: SnapshotSource + ?Sized,
    {
        let pending = self.ctx.jobs().list_by_status(JobStatus::Pending).await?;
        let mut results = Vec::with_capacity(pending.len());
        for job in pending {
            let result = self.import(job.id, source).await;
            results.push((job.id, result));
        }
        Ok(results)
    }

    /// Get a job or fail with NotFound.
    pub async fn job(&self, job_id: i32) -> CatalogResult<ScrapeJob> {
        self.ctx
            .jobs()
            .get(job_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Job", job_id))
    }

    /// All jobs, oldest first.
    pub async fn jobs(&self) -> CatalogResult<Vec<ScrapeJob>> {
        Ok(self.ctx.jobs().list().await?)
    }
}
