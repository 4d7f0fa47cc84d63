//! Catalog reconciliation behaviour, exercised through the public API.

use std::time::Duration;

use async_trait::async_trait;
use tempfile::{tempdir, TempDir};

use pricewatch::models::{JobStatus, NewJob, ScrapeJob, SnapshotRecord, ValidatedSnapshot};
use pricewatch::provider::{FileSnapshotSource, ProviderError, SnapshotSource};
use pricewatch::repository::DbContext;
use pricewatch::services::{CatalogService, JobService, SnapshotReconciler};
use pricewatch::{CatalogError, IngestionError};

async fn setup() -> (TempDir, DbContext) {
    let dir = tempdir().unwrap();
    let ctx = DbContext::from_path(&dir.path().join("pricewatch.db"));
    ctx.init_schema().await.unwrap();
    (dir, ctx)
}

async fn new_job(ctx: &DbContext, snapshot_id: &str) -> ScrapeJob {
    JobService::new(ctx)
        .register(NewJob::pending(snapshot_id, &["widget".to_string()]))
        .await
        .unwrap()
}

fn record(url: &str, title: &str, price: f64) -> SnapshotRecord {
    SnapshotRecord::new(title, "https://img.example/p.jpg", url, price)
}

/// Serves a fixed set of records for any snapshot.
struct StaticSource(Vec<SnapshotRecord>);

#[async_trait]
impl SnapshotSource for StaticSource {
    async fn fetch(&self, _snapshot_id: &str) -> Result<ValidatedSnapshot, ProviderError> {
        Ok(ValidatedSnapshot {
            records: self.0.clone(),
            skipped: Vec::new(),
        })
    }
}

#[tokio::test]
async fn test_first_job_creates_product_and_price() {
    let (_dir, ctx) = setup().await;
    let j1 = new_job(&ctx, "s_j1").await;

    SnapshotReconciler::new(&ctx)
        .reconcile(j1.id, &[record("a", "Widget", 10.0)])
        .await
        .unwrap();

    let product = ctx.products().get_by_url("a").await.unwrap().unwrap();
    assert_eq!(product.name, "Widget");
    assert_eq!(product.price, 10.0);
    assert_eq!(product.job_id, j1.id);

    let history = ctx.prices().history(product.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].job_id, j1.id);

    let j1 = ctx.jobs().get(j1.id).await.unwrap().unwrap();
    assert_eq!(j1.status, JobStatus::Done);
}

#[tokio::test]
async fn test_second_job_appends_history() {
    let (_dir, ctx) = setup().await;
    let reconciler = SnapshotReconciler::new(&ctx);

    let j1 = new_job(&ctx, "s_j1").await;
    reconciler
        .reconcile(j1.id, &[record("a", "Widget", 10.0)])
        .await
        .unwrap();

    let j2 = new_job(&ctx, "s_j2").await;
    reconciler
        .reconcile(j2.id, &[record("a", "Widget", 12.0)])
        .await
        .unwrap();

    assert_eq!(ctx.products().count().await.unwrap(), 1);
    let product = ctx.products().get_by_url("a").await.unwrap().unwrap();
    assert_eq!(product.price, 12.0);
    assert_eq!(product.job_id, j2.id);

    let prices: Vec<f64> = ctx
        .prices()
        .history(product.id)
        .await
        .unwrap()
        .iter()
        .map(|p| p.price)
        .collect();
    assert_eq!(prices, vec![10.0, 12.0]);
}

#[tokio::test]
async fn test_reconciling_twice_is_idempotent() {
    let (_dir, ctx) = setup().await;
    let job = new_job(&ctx, "s_1").await;
    let records = vec![
        record("a", "Widget", 10.0),
        record("b", "Gadget", 20.0),
        record("c", "Doohickey", 5.0),
    ];
    let reconciler = SnapshotReconciler::new(&ctx);

    let first = reconciler.reconcile(job.id, &records).await.unwrap();
    let count_after_first = ctx.prices().count().await.unwrap();

    let second = reconciler.reconcile(job.id, &records).await.unwrap();
    let count_after_second = ctx.prices().count().await.unwrap();

    assert_eq!(first.prices_appended, 3);
    assert_eq!(second.prices_appended, 0);
    assert_eq!(second.prices_skipped, 3);
    assert_eq!(count_after_first, count_after_second);
    assert_eq!(ctx.products().count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_latest_job_wins_displayed_fields() {
    let (_dir, ctx) = setup().await;
    let reconciler = SnapshotReconciler::new(&ctx);

    let j1 = new_job(&ctx, "s_1").await;
    reconciler
        .reconcile(j1.id, &[record("a", "Old Name", 10.0)])
        .await
        .unwrap();

    let j2 = new_job(&ctx, "s_2").await;
    reconciler
        .reconcile(
            j2.id,
            &[record("a", "Interim Name", 11.0), record("a", "New Name", 9.5)],
        )
        .await
        .unwrap();

    let products = ctx.products().list(None).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "New Name");
    assert_eq!(products[0].price, 9.5);

    // one observation per job, not per record
    assert_eq!(ctx.prices().count_for_product(products[0].id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_price_rows_bounded_by_jobs() {
    let (_dir, ctx) = setup().await;
    let reconciler = SnapshotReconciler::new(&ctx);

    let mut jobs = Vec::new();
    for (i, price) in [10.0, 11.0, 12.0].into_iter().enumerate() {
        let job = new_job(&ctx, &format!("s_{}", i)).await;
        let records = vec![record("a", "Widget", price), record("a", "Widget", price + 1.0)];
        reconciler.reconcile(job.id, &records).await.unwrap();
        // re-run the same job
        reconciler.reconcile(job.id, &records).await.unwrap();
        jobs.push(job.id);
    }

    let product = ctx.products().get_by_url("a").await.unwrap().unwrap();
    let count = ctx.prices().count_for_product(product.id).await.unwrap();
    assert!(count as usize <= jobs.len());
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_delete_product_removes_children() {
    let (_dir, ctx) = setup().await;
    let catalog = CatalogService::new(&ctx);

    let job = new_job(&ctx, "s_1").await;
    SnapshotReconciler::new(&ctx)
        .reconcile(job.id, &[record("a", "Widget", 10.0), record("b", "Gadget", 3.0)])
        .await
        .unwrap();
    let product = ctx.products().get_by_url("a").await.unwrap().unwrap();

    catalog.favourite(product.id).await.unwrap();
    catalog.track(product.id).await.unwrap();

    catalog.delete_product(product.id).await.unwrap();

    assert!(ctx.products().get(product.id).await.unwrap().is_none());
    assert_eq!(ctx.prices().count_for_product(product.id).await.unwrap(), 0);
    assert!(!catalog.is_favourite(product.id).await.unwrap());
    assert!(!catalog.is_tracked(product.id).await.unwrap());

    // the other product is untouched
    assert_eq!(ctx.products().count().await.unwrap(), 1);
    assert_eq!(ctx.prices().count().await.unwrap(), 1);

    let err = catalog.delete_product(product.id).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[tokio::test]
async fn test_favourite_twice_conflicts() {
    let (_dir, ctx) = setup().await;
    let catalog = CatalogService::new(&ctx);

    let job = new_job(&ctx, "s_1").await;
    SnapshotReconciler::new(&ctx)
        .reconcile(job.id, &[record("a", "Widget", 10.0)])
        .await
        .unwrap();
    let product = ctx.products().get_by_url("a").await.unwrap().unwrap();

    catalog.favourite(product.id).await.unwrap();
    let err = catalog.favourite(product.id).await.unwrap_err();
    assert!(matches!(err, CatalogError::Conflict(_)));
    assert_eq!(ctx.favourites().count().await.unwrap(), 1);

    catalog.track(product.id).await.unwrap();
    assert!(matches!(
        catalog.track(product.id).await,
        Err(CatalogError::Conflict(_))
    ));

    let favourites = catalog.favourites().await.unwrap();
    assert_eq!(favourites.len(), 1);
    assert_eq!(favourites[0].1.url, "a");

    catalog.unfavourite(product.id).await.unwrap();
    assert!(matches!(
        catalog.unfavourite(product.id).await,
        Err(CatalogError::NotFound { .. })
    ));
}

fn numbered_records(count: usize) -> Vec<SnapshotRecord> {
    (0..count)
        .map(|i| record(&format!("https://shop.example/{}", i), "Item", i as f64))
        .collect()
}

#[tokio::test]
async fn test_timeout_mid_run_marks_job_failed_and_rolls_back() {
    let (_dir, ctx) = setup().await;
    let job = new_job(&ctx, "s_1").await;
    let records = numbered_records(20_000);
    let deadline = Duration::from_millis(50);

    let err = SnapshotReconciler::new(&ctx)
        .with_timeout(deadline)
        .reconcile(job.id, &records)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CatalogError::Ingestion {
            source: IngestionError::Timeout(d),
            ..
        } if d == deadline
    ));

    let failed = ctx.jobs().get(job.id).await.unwrap().unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert!(failed.last_error.as_deref().unwrap().contains("50ms"));
    assert!(failed.finished_at.is_some());
    assert_eq!(ctx.products().count().await.unwrap(), 0);
    assert_eq!(ctx.prices().count().await.unwrap(), 0);

    // the lock is released and the same job can be retried
    let report = SnapshotReconciler::new(&ctx)
        .reconcile(job.id, &records[..50])
        .await
        .unwrap();
    assert_eq!(report.products_created, 50);
    assert_eq!(
        ctx.jobs().get(job.id).await.unwrap().unwrap().status,
        JobStatus::Done
    );
}

#[tokio::test]
async fn test_database_error_mid_run_rolls_back_earlier_records() {
    let (dir, ctx) = setup().await;
    let job = new_job(&ctx, "s_1").await;

    let conn = rusqlite::Connection::open(dir.path().join("pricewatch.db")).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_bad_url BEFORE INSERT ON product
         WHEN NEW.url = 'bad'
         BEGIN SELECT RAISE(ABORT, 'rejected by trigger'); END;",
    )
    .unwrap();
    drop(conn);

    let records = vec![
        record("a", "Widget", 10.0),
        record("b", "Gadget", 20.0),
        record("bad", "Broken", 1.0),
        record("c", "Doohickey", 5.0),
    ];
    let err = SnapshotReconciler::new(&ctx)
        .reconcile(job.id, &records)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CatalogError::Ingestion {
            source: IngestionError::Database(_),
            ..
        }
    ));
    assert_eq!(ctx.products().count().await.unwrap(), 0);
    assert_eq!(ctx.prices().count().await.unwrap(), 0);

    let failed = ctx.jobs().get(job.id).await.unwrap().unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert!(failed
        .last_error
        .as_deref()
        .unwrap()
        .contains("rejected by trigger"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_jobs_over_shared_products() {
    let (_dir, ctx) = setup().await;
    let records = numbered_records(200);

    for round in 0..5 {
        let j1 = new_job(&ctx, &format!("s_{}_a", round)).await;
        let j2 = new_job(&ctx, &format!("s_{}_b", round)).await;
        let reconciler = SnapshotReconciler::new(&ctx);

        let (first, second) = tokio::join!(
            reconciler.reconcile(j1.id, &records),
            reconciler.reconcile(j2.id, &records)
        );
        first.unwrap();
        second.unwrap();

        for id in [j1.id, j2.id] {
            let job = ctx.jobs().get(id).await.unwrap().unwrap();
            assert_eq!(job.status, JobStatus::Done, "round {}", round);
            assert_eq!(ctx.prices().count_for_job(id).await.unwrap(), 200);
        }
    }

    assert_eq!(ctx.products().count().await.unwrap(), 200);
    assert_eq!(ctx.prices().count().await.unwrap(), 2_000);
}

#[tokio::test]
async fn test_failed_job_can_be_retried() {
    let (_dir, ctx) = setup().await;
    let job = new_job(&ctx, "s_1").await;
    ctx.jobs()
        .update_status(job.id, JobStatus::Failed, Some("database is locked"))
        .await
        .unwrap();

    let summary = JobService::new(&ctx)
        .import(job.id, &StaticSource(vec![record("a", "Widget", 10.0)]))
        .await
        .unwrap();

    assert_eq!(summary.job.status, JobStatus::Done);
    assert!(summary.job.last_error.is_none());
    assert_eq!(summary.report.prices_appended, 1);
}

#[tokio::test]
async fn test_import_pending_jobs() {
    let (_dir, ctx) = setup().await;
    let j1 = new_job(&ctx, "s_1").await;
    let j2 = new_job(&ctx, "s_2").await;

    let results = JobService::new(&ctx)
        .import_pending(&StaticSource(vec![record("a", "Widget", 10.0)]))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|(_, r)| r.is_ok()));
    assert!(ctx
        .jobs()
        .list_by_status(JobStatus::Pending)
        .await
        .unwrap()
        .is_empty());

    let product = ctx.products().get_by_url("a").await.unwrap().unwrap();
    assert_eq!(product.job_id, j2.id);
    let history = ctx.prices().history(product.id).await.unwrap();
    assert_eq!(
        history.iter().map(|p| p.job_id).collect::<Vec<_>>(),
        vec![j1.id, j2.id]
    );
}

#[tokio::test]
async fn test_import_from_ndjson_file() {
    let (dir, ctx) = setup().await;
    let path = dir.path().join("snapshot.ndjson");
    std::fs::write(
        &path,
        concat!(
            r#"{"title":"Kettle","image_url":"https://img.example/k.jpg","url":"https://shop.example/k","initial_price":24.99}"#,
            "\n",
            r#"{"title":"Toaster","url":"https://shop.example/t","initial_price":null}"#,
            "\n",
            r#"{"title":"Mug","url":"","initial_price":4}"#,
            "\n",
        ),
    )
    .unwrap();

    let source = FileSnapshotSource::new(&path);
    let service = JobService::new(&ctx);
    let job = service
        .register(NewJob::pending(source.local_snapshot_id(), &["file".to_string()]))
        .await
        .unwrap();

    let summary = service.import(job.id, &source).await.unwrap();
    assert_eq!(summary.report.records, 1);
    assert_eq!(summary.skipped.len(), 2);
    assert_eq!(ctx.products().count().await.unwrap(), 1);

    let series = CatalogService::new(&ctx)
        .price_series(ctx.products().list(None).await.unwrap()[0].id)
        .await
        .unwrap();
    assert_eq!(series.prices, vec![24.99]);
    assert_eq!(series.title, "Kettle");
}
