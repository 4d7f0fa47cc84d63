//! Scrape and import commands.

use std::path::Path;

use console::style;

use pricewatch::config::Settings;
use pricewatch::models::{JobStatus, NewJob, ScrapeJob};
use pricewatch::provider::{BrightDataClient, FileSnapshotSource};
use pricewatch::services::{ImportSummary, JobService};

use crate::cli::helpers::{format_time, open_db, truncate, warn_on_user_error};

fn provider_client(settings: &Settings) -> anyhow::Result<BrightDataClient> {
    Ok(BrightDataClient::new(
        &settings.provider,
        settings.http_timeout(),
    )?)
}

/// Trigger a scrape and record the pending job.
pub async fn cmd_scrape(settings: &Settings, keywords: &[String]) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let client = provider_client(settings)?;

    let job = JobService::new(&ctx).trigger(&client, keywords).await?;

    println!(
        "{} Job {} created for snapshot {}",
        style("✓").green(),
        job.id,
        style(&job.snapshot_id).cyan()
    );
    println!(
        "  Run 'pricewatch import {}' once the snapshot is ready",
        job.id
    );
    Ok(())
}

/// Fetch and reconcile one job's snapshot from the provider.
pub async fn cmd_import(settings: &Settings, job_id: i32, force: bool) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let service = JobService::new(&ctx).with_reconcile_timeout(settings.reconcile_timeout());

    let Some(job) = warn_on_user_error(service.job(job_id).await)? else {
        return Ok(());
    };
    if job.status == JobStatus::Done && !force {
        println!(
            "{} Job {} is already done; use --force to import it again",
            style("!").yellow(),
            job_id
        );
        return Ok(());
    }

    let client = provider_client(settings)?;
    let summary = service.import(job_id, &client).await?;
    print_summary(&summary);
    Ok(())
}

/// Import every pending job from the provider.
pub async fn cmd_import_pending(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let service = JobService::new(&ctx).with_reconcile_timeout(settings.reconcile_timeout());
    let client = provider_client(settings)?;

    let results = service.import_pending(&client).await?;
    if results.is_empty() {
        println!("{} No pending jobs", style("!").yellow());
        return Ok(());
    }

    let mut failed = 0;
    for (job_id, result) in results {
        match result {
            Ok(summary) => print_summary(&summary),
            Err(e) => {
                failed += 1;
                println!("{} Job {}: {}", style("✗").red(), job_id, e);
            }
        }
    }

    if failed > 0 {
        println!("{} {} job(s) not imported", style("!").yellow(), failed);
    }
    Ok(())
}

/// Reconcile a local snapshot file, creating a job for it unless one is given.
pub async fn cmd_import_file(
    settings: &Settings,
    path: &Path,
    job_id: Option<i32>,
) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let service = JobService::new(&ctx).with_reconcile_timeout(settings.reconcile_timeout());
    let source = FileSnapshotSource::new(path);

    let job = match job_id {
        Some(id) => match warn_on_user_error(service.job(id).await)? {
            Some(job) => job,
            None => return Ok(()),
        },
        None => {
            let keyword = format!("file:{}", path.display());
            let job = service
                .register(NewJob::pending(source.local_snapshot_id(), &[keyword]))
                .await?;
            println!(
                "{} Job {} created for {}",
                style("✓").green(),
                job.id,
                path.display()
            );
            job
        }
    };

    let summary = service.import(job.id, &source).await?;
    print_summary(&summary);
    Ok(())
}

/// List scrape jobs.
pub async fn cmd_jobs(settings: &Settings, status: Option<&str>) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;

    let jobs = match status {
        Some(s) => {
            let status = JobStatus::from_str(s)
                .ok_or_else(|| anyhow::anyhow!("Unknown job status '{}'", s))?;
            ctx.jobs().list_by_status(status).await?
        }
        None => JobService::new(&ctx).jobs().await?,
    };

    if jobs.is_empty() {
        println!(
            "{} No jobs yet. Run 'pricewatch scrape <keywords>' first.",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("\n{}", style("Scrape Jobs").bold());
    println!("{}", "-".repeat(78));
    println!(
        "{:<5} {:<24} {:<20} {:<9} Created",
        "ID", "Snapshot", "Keyword", "Status"
    );
    println!("{}", "-".repeat(78));

    for job in &jobs {
        println!(
            "{:<5} {:<24} {:<20} {:<9} {}",
            job.id,
            truncate(&job.snapshot_id, 23),
            truncate(&job.keyword, 19),
            styled_status(job),
            format_time(&job.created_at)
        );
        if let Some(ref error) = job.last_error {
            println!("      {} {}", style("└").dim(), style(truncate(error, 70)).red());
        }
    }

    Ok(())
}

fn styled_status(job: &ScrapeJob) -> String {
    let padded = format!("{:<9}", job.status.as_str());
    match job.status {
        JobStatus::Pending => style(padded).yellow().to_string(),
        JobStatus::Done => style(padded).green().to_string(),
        JobStatus::Failed => style(padded).red().to_string(),
    }
}

fn print_summary(summary: &ImportSummary) {
    let report = &summary.report;
    println!(
        "{} Job {} {}: {} record(s), {} new product(s), {} updated, {} price(s) recorded",
        style("✓").green(),
        summary.job.id,
        summary.job.status,
        report.records,
        report.products_created,
        report.products_updated,
        report.prices_appended
    );
    if report.prices_skipped > 0 {
        println!(
            "  {} price(s) already recorded for this job",
            report.prices_skipped
        );
    }
    if !summary.skipped.is_empty() {
        println!(
            "  {} {} row(s) dropped during validation",
            style("!").yellow(),
            summary.skipped.len()
        );
    }
}
