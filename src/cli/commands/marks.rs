//! Favourite and tracking commands.

use console::style;

use pricewatch::config::Settings;
use pricewatch::models::Product;
use pricewatch::services::CatalogService;

use crate::cli::helpers::{format_price, format_time, open_db, truncate, warn_on_user_error};

/// Which mark a command operates on.
#[derive(Debug, Clone, Copy)]
pub enum MarkKind {
    Favourite,
    Tracked,
}

impl MarkKind {
    fn title(&self) -> &'static str {
        match self {
            Self::Favourite => "Favourites",
            Self::Tracked => "Tracked Products",
        }
    }
}

pub async fn cmd_mark_add(settings: &Settings, kind: MarkKind, product_id: i32) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let catalog = CatalogService::new(&ctx);

    let added = match kind {
        MarkKind::Favourite => warn_on_user_error(catalog.favourite(product_id).await)?.is_some(),
        MarkKind::Tracked => warn_on_user_error(catalog.track(product_id).await)?.is_some(),
    };

    if added {
        let verb = match kind {
            MarkKind::Favourite => "favourited",
            MarkKind::Tracked => "is now tracked",
        };
        println!("{} Product {} {}", style("✓").green(), product_id, verb);
    }
    Ok(())
}

pub async fn cmd_mark_remove(
    settings: &Settings,
    kind: MarkKind,
    product_id: i32,
) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let catalog = CatalogService::new(&ctx);

    let removed = match kind {
        MarkKind::Favourite => warn_on_user_error(catalog.unfavourite(product_id).await)?,
        MarkKind::Tracked => warn_on_user_error(catalog.untrack(product_id).await)?,
    };

    if removed.is_some() {
        println!("{} Removed mark from product {}", style("✓").green(), product_id);
    }
    Ok(())
}

pub async fn cmd_mark_list(settings: &Settings, kind: MarkKind) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let catalog = CatalogService::new(&ctx);

    let rows: Vec<(chrono::DateTime<chrono::Utc>, Product)> = match kind {
        MarkKind::Favourite => catalog
            .favourites()
            .await?
            .into_iter()
            .map(|(mark, product)| (mark.created_at, product))
            .collect(),
        MarkKind::Tracked => catalog
            .tracked()
            .await?
            .into_iter()
            .map(|(mark, product)| (mark.created_at, product))
            .collect(),
    };

    if rows.is_empty() {
        println!("{} Nothing in {}", style("!").yellow(), kind.title().to_lowercase());
        return Ok(());
    }

    println!("\n{}", style(kind.title()).bold());
    println!("{}", "-".repeat(76));
    println!("{:<6} {:<40} {:>10}  Since", "ID", "Name", "Price");
    println!("{}", "-".repeat(76));

    for (since, product) in &rows {
        println!(
            "{:<6} {:<40} {:>10}  {}",
            product.id,
            truncate(&product.name, 39),
            format_price(product.price),
            format_time(since)
        );
    }

    Ok(())
}
