//! Diesel-based scrape job repository.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewScrapeJob, ScrapeJobRecord};
use super::pool::{DbPool, DieselError, SqliteConn};
use super::util::format_datetime;
use crate::models::{JobStatus, NewJob, ScrapeJob};
use crate::schema::scrape_job;

/// Fetch a job row by ID.
pub async fn find(conn: &mut SqliteConn, id: i32) -> Result<Option<ScrapeJob>, DieselError> {
    scrape_job::table
        .find(id)
        .first::<ScrapeJobRecord>(conn)
        .await
        .optional()
        .map(|opt| opt.map(ScrapeJob::from))
}

/// Write a status change.
///
/// Terminal states stamp `finished_at`; `last_error` is replaced by `error`.
pub async fn set_status(
    conn: &mut SqliteConn,
    id: i32,
    status: JobStatus,
    error: Option<&str>,
    at: DateTime<Utc>,
) -> Result<(), DieselError> {
    let finished_at = status.is_terminal().then(|| format_datetime(&at));

    diesel::update(scrape_job::table.find(id))
        .set((
            scrape_job::status.eq(status.as_str()),
            scrape_job::finished_at.eq(finished_at),
            scrape_job::last_error.eq(error),
        ))
        .execute(conn)
        .await?;

    Ok(())
}

/// Diesel-based scrape job repository.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: DbPool,
}

impl JobRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new pending job and return it.
    ///
    /// Fails with a unique violation if the snapshot ID is already known.
    pub async fn create(&self, job: &NewJob) -> Result<ScrapeJob, DieselError> {
        let mut conn = self.pool.get().await?;
        let created_at = format_datetime(&job.created_at);

        diesel::insert_into(scrape_job::table)
            .values(&NewScrapeJob {
                snapshot_id: &job.snapshot_id,
                keyword: &job.keyword,
                status: JobStatus::Pending.as_str(),
                created_at: &created_at,
            })
            .execute(&mut conn)
            .await?;

        scrape_job::table
            .filter(scrape_job::snapshot_id.eq(&job.snapshot_id))
            .first::<ScrapeJobRecord>(&mut conn)
            .await
            .map(ScrapeJob::from)
    }

    /// Get a job by ID.
    pub async fn get(&self, id: i32) -> Result<Option<ScrapeJob>, DieselError> {
        let mut conn = self.pool.get().await?;
        find(&mut conn, id).await
    }

    /// Get a job by its provider snapshot ID.
    pub async fn get_by_snapshot(&self, snapshot_id: &str) -> Result<Option<ScrapeJob>, DieselError> {
        let mut conn = self.pool.get().await?;

        scrape_job::table
            .filter(scrape_job::snapshot_id.eq(snapshot_id))
            .first::<ScrapeJobRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(ScrapeJob::from))
    }

    /// List all jobs, oldest first.
    pub async fn list(&self) -> Result<Vec<ScrapeJob>, DieselError> {
        let mut conn = self.pool.get().await?;

        scrape_job::table
            .order((scrape_job::created_at.asc(), scrape_job::id.asc()))
            .load::<ScrapeJobRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(ScrapeJob::from).collect())
    }

    /// List jobs in a given status, oldest first.
    pub async fn list_by_status(&self, status: JobStatus) -> Result<Vec<ScrapeJob>, DieselError> {
        let mut conn = self.pool.get().await?;

        scrape_job::table
            .filter(scrape_job::status.eq(status.as_str()))
            .order((scrape_job::created_at.asc(), scrape_job::id.asc()))
            .load::<ScrapeJobRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(ScrapeJob::from).collect())
    }

    /// Write a status change outside of any reconciliation transaction.
    pub async fn update_status(
        &self,
        id: i32,
        status: JobStatus,
        error: Option<&str>,
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        set_status(&mut conn, id, status, error, Utc::now()).await
    }

    /// Mark a job failed unless it is already `done`.
    ///
    /// The status check happens in the UPDATE itself, so a run that committed
    /// after the caller gave up on it keeps its `done` status. Returns whether
    /// the row changed.
    pub async fn fail_unless_done(&self, id: i32, error: &str) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;
        let finished_at = format_datetime(&Utc::now());

        let updated = diesel::update(
            scrape_job::table
                .filter(scrape_job::id.eq(id))
                .filter(scrape_job::status.ne(JobStatus::Done.as_str())),
        )
        .set((
            scrape_job::status.eq(JobStatus::Failed.as_str()),
            scrape_job::finished_at.eq(Some(finished_at)),
            scrape_job::last_error.eq(Some(error)),
        ))
        .execute(&mut conn)
        .await?;

        Ok(updated > 0)
    }
}
