//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod init;
mod jobs;
mod marks;
mod products;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use pricewatch::config::{load_settings_with_options, LoadOptions};

use marks::MarkKind;

#[derive(Parser)]
#[command(name = "pricewatch")]
#[command(about = "Track product prices from e-commerce scrape snapshots")]
#[command(version)]
pub struct Cli {
    /// Data directory or database file
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative config paths against the current directory
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Trigger a keyword scrape at the provider
    Scrape {
        /// Search keywords, one discovery input each
        #[arg(required = true)]
        keywords: Vec<String>,
    },

    /// Fetch a job's snapshot and reconcile it into the catalog
    Import {
        /// Job ID to import
        job_id: Option<i32>,
        /// Read records from a local JSON or NDJSON file instead of the provider
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Import every pending job
        #[arg(long, conflicts_with_all = ["job_id", "file"])]
        pending: bool,
        /// Re-import a job that is already done
        #[arg(long)]
        force: bool,
    },

    /// List scrape jobs
    Jobs {
        /// Only show jobs in this status (pending, done, failed)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// List products
    Products {
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Show every product on one page
        #[arg(short, long)]
        all: bool,
    },

    /// Show a product
    Product {
        /// Product ID
        id: i32,
    },

    /// Show a product's price history
    History {
        /// Product ID
        id: i32,
    },

    /// Delete a product with its price history
    Delete {
        /// Product ID
        id: i32,
        /// Skip confirmation prompt
        #[arg(long)]
        confirm: bool,
    },

    /// Manage favourite products
    Favourite {
        #[command(subcommand)]
        command: MarkCommands,
    },

    /// Manage products under price tracking
    Track {
        #[command(subcommand)]
        command: MarkCommands,
    },
}

#[derive(Subcommand)]
enum MarkCommands {
    /// Mark a product
    Add {
        /// Product ID
        product_id: i32,
    },
    /// Remove the mark from a product
    Remove {
        /// Product ID
        product_id: i32,
    },
    /// List marked products
    List,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        data: cli.target,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Scrape { keywords } => jobs::cmd_scrape(&settings, &keywords).await,
        Commands::Import {
            job_id,
            file,
            pending,
            force,
        } => {
            if pending {
                jobs::cmd_import_pending(&settings).await
            } else if let Some(path) = file {
                jobs::cmd_import_file(&settings, &path, job_id).await
            } else if let Some(job_id) = job_id {
                jobs::cmd_import(&settings, job_id, force).await
            } else {
                anyhow::bail!("Specify a job ID, --file or --pending")
            }
        }
        Commands::Jobs { status } => jobs::cmd_jobs(&settings, status.as_deref()).await,
        Commands::Products { page, all } => products::cmd_products(&settings, page, all).await,
        Commands::Product { id } => products::cmd_product(&settings, id).await,
        Commands::History { id } => products::cmd_history(&settings, id).await,
        Commands::Delete { id, confirm } => products::cmd_delete(&settings, id, confirm).await,
        Commands::Favourite { command } => dispatch_marks(&settings, MarkKind::Favourite, command).await,
        Commands::Track { command } => dispatch_marks(&settings, MarkKind::Tracked, command).await,
    }
}

async fn dispatch_marks(
    settings: &pricewatch::config::Settings,
    kind: MarkKind,
    command: MarkCommands,
) -> anyhow::Result<()> {
    match command {
        MarkCommands::Add { product_id } => marks::cmd_mark_add(settings, kind, product_id).await,
        MarkCommands::Remove { product_id } => {
            marks::cmd_mark_remove(settings, kind, product_id).await
        }
        MarkCommands::List => marks::cmd_mark_list(settings, kind).await,
    }
}
