//! Snapshot reconciliation.
//!
//! Folds a validated snapshot into the catalog inside a single transaction:
//! products are matched by URL, each (product, job) pair gets at most one
//! price row, and the job flips to `done` only if every record landed.
//! Any failure rolls the whole run back and marks the job `failed`.

use std::time::Duration;

use chrono::Utc;
use diesel_async::SimpleAsyncConnection;
use tracing::{debug, info, warn};

use crate::error::{CatalogError, CatalogResult, IngestionError};
use crate::models::{JobStatus, SnapshotRecord};
use crate::repository::util::is_unique_violation;
use crate::repository::{job, price, product, DbContext, DieselError, SqliteConn};

/// Default upper bound on a single reconciliation run.
pub const DEFAULT_RECONCILE_TIMEOUT: Duration = Duration::from_secs(120);

/// Counters describing what a reconciliation run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub job_id: i32,
    /// Valid records handed to the reconciler.
    pub records: usize,
    pub products_created: usize,
    pub products_updated: usize,
    pub prices_appended: usize,
    /// Records whose (product, job) pair already had a price.
    pub prices_skipped: usize,
}

impl ReconcileReport {
    fn new(job_id: i32, records: usize) -> Self {
        Self {
            job_id,
            records,
            ..Default::default()
        }
    }
}

/// Applies validated snapshot records to the catalog on behalf of a job.
pub struct SnapshotReconciler<'a> {
    ctx: &'a DbContext,
    timeout: Duration,
}

impl<'a> SnapshotReconciler<'a> {
    pub fn new(ctx: &'a DbContext) -> Self {
        Self {
            ctx,
            timeout: DEFAULT_RECONCILE_TIMEOUT,
        }
    }

    /// Override the run deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reconcile `records` against the catalog for job `job_id`.
    ///
    /// Re-running with the same job is a no-op for price history: pairs that
    /// already have a row are counted as skipped. Product fields are
    /// overwritten with the snapshot values either way.
    pub async fn reconcile(
        &self,
        job_id: i32,
        records: &[SnapshotRecord],
    ) -> CatalogResult<ReconcileReport> {
        let job = self
            .ctx
            .jobs()
            .get(job_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Job", job_id))?;

        if !job.status.can_transition_to(JobStatus::Done) {
            return Err(CatalogError::InvalidTransition {
                job_id,
                from: job.status,
                to: JobStatus::Done,
            });
        }

        debug!(
            job_id,
            records = records.len(),
            status = %job.status,
            "starting reconciliation"
        );

        let outcome = tokio::time::timeout(self.timeout, self.apply(job_id, records)).await;

        let source = match outcome {
            Ok(Ok(report)) => {
                info!(
                    job_id,
                    created = report.products_created,
                    updated = report.products_updated,
                    appended = report.prices_appended,
                    skipped = report.prices_skipped,
                    "reconciliation complete"
                );
                return Ok(report);
            }
            Ok(Err(e)) => IngestionError::Database(e),
            Err(_) => IngestionError::Timeout(self.timeout),
        };

        self.mark_failed(job_id, &source.to_string()).await;
        Err(CatalogError::Ingestion { job_id, source })
    }

    async fn apply(
        &self,
        job_id: i32,
        records: &[SnapshotRecord],
    ) -> Result<ReconcileReport, DieselError> {
        let mut conn = self.ctx.pool().get().await?;

        // Write lock up front: a deferred BEGIN fails its lock upgrade with
        // SQLITE_BUSY without consulting busy_timeout.
        conn.batch_execute("BEGIN IMMEDIATE").await?;

        let applied = async {
            let mut report = ReconcileReport::new(job_id, records.len());
            for record in records {
                apply_record(&mut conn, job_id, record, &mut report).await?;
            }
            job::set_status(&mut conn, job_id, JobStatus::Done, None, Utc::now()).await?;
            conn.batch_execute("COMMIT").await?;
            Ok::<_, DieselError>(report)
        }
        .await;

        if applied.is_err() {
            if let Err(e) = conn.batch_execute("ROLLBACK").await {
                debug!(job_id, "rollback after failed reconciliation: {}", e);
            }
        }
        applied
    }

    /// Record the failure on the job outside the aborted transaction.
    async fn mark_failed(&self, job_id: i32, message: &str) {
        warn!(job_id, "reconciliation failed: {}", message);
        match self.ctx.jobs().fail_unless_done(job_id, message).await {
            Ok(true) => {}
            Ok(false) => warn!(job_id, "job already done; leaving status unchanged"),
            Err(e) => warn!(job_id, "could not mark job failed: {}", e),
        }
    }
}

async fn apply_record(
    conn: &mut SqliteConn,
    job_id: i32,
    record: &SnapshotRecord,
    report: &mut ReconcileReport,
) -> Result<(), DieselError> {
    if let Some(existing) = product::find_by_url(conn, &record.url).await? {
        return update_existing(conn, existing.id, job_id, record, report).await;
    }

    match product::insert(conn, record, job_id).await {
        Ok(created) => {
            debug!(product_id = created.id, url = %record.url, "created product");
            report.products_created += 1;
            if price::append(conn, created.id, job_id, record.price).await? {
                report.prices_appended += 1;
            } else {
                report.prices_skipped += 1;
            }
            Ok(())
        }
        Err(e) if is_unique_violation(&e) => {
            // Another writer claimed the URL between lookup and insert.
            let existing = product::find_by_url(conn, &record.url).await?.ok_or(e)?;
            update_existing(conn, existing.id, job_id, record, report).await
        }
        Err(e) => Err(e),
    }
}

async fn update_existing(
    conn: &mut SqliteConn,
    product_id: i32,
    job_id: i32,
    record: &SnapshotRecord,
    report: &mut ReconcileReport,
) -> Result<(), DieselError> {
    let appended = if price::exists_for(conn, product_id, job_id).await? {
        false
    } else {
        price::append(conn, product_id, job_id, record.price).await?
    };

    if appended {
        report.prices_appended += 1;
    } else {
        debug!(product_id, job_id, "price already recorded for job");
        report.prices_skipped += 1;
    }

    product::apply_snapshot(conn, product_id, record, job_id).await?;
    report.products_updated += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewJob;
    use tempfile::tempdir;

    async fn setup() -> (tempfile::TempDir, DbContext) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (dir, ctx)
    }

    fn widget(price: f64) -> SnapshotRecord {
        SnapshotRecord::new(
            "Widget",
            "https://img.example/w.jpg",
            "https://shop.example/w",
            price,
        )
    }

    #[tokio::test]
    async fn test_reconcile_creates_and_finishes_job() {
        let (_dir, ctx) = setup().await;
        let job = ctx
            .jobs()
            .create(&NewJob::pending("s_1", &["widget".to_string()]))
            .await
            .unwrap();

        let report = SnapshotReconciler::new(&ctx)
            .reconcile(job.id, &[widget(10.0)])
            .await
            .unwrap();

        assert_eq!(report.products_created, 1);
        assert_eq!(report.prices_appended, 1);
        let job = ctx.jobs().get(job.id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert!(job.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_url_in_one_snapshot() {
        let (_dir, ctx) = setup().await;
        let job = ctx
            .jobs()
            .create(&NewJob::pending("s_1", &["widget".to_string()]))
            .await
            .unwrap();

        let report = SnapshotReconciler::new(&ctx)
            .reconcile(job.id, &[widget(10.0), widget(12.0)])
            .await
            .unwrap();

        assert_eq!(report.products_created, 1);
        assert_eq!(report.products_updated, 1);
        assert_eq!(report.prices_appended, 1);
        assert_eq!(report.prices_skipped, 1);

        let products = ctx.products().list(None).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price, 12.0);
        assert_eq!(ctx.prices().count_for_job(job.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let (_dir, ctx) = setup().await;
        let err = SnapshotReconciler::new(&ctx)
            .reconcile(99, &[widget(1.0)])
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
        assert_eq!(ctx.products().count().await.unwrap(), 0);
    }
}
