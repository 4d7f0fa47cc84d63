//! Initialize command.

use console::style;

use pricewatch::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context()?;
    ctx.test_connection().await?;
    let applied = ctx.init_schema().await?;

    for name in &applied {
        println!("  {} Applied migration {}", style("✓").green(), name);
    }

    if !settings.provider.is_configured() {
        println!(
            "{} Provider credentials not set; 'scrape' needs API_KEY and DATASET_ID",
            style("!").yellow()
        );
        println!("  Local snapshots can still be loaded with 'pricewatch import --file'");
    }

    println!(
        "{} Initialized pricewatch in {}",
        style("✓").green(),
        settings.data_dir.display()
    );

    Ok(())
}
