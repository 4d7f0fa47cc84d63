//! Product listing and maintenance commands.

use console::style;

use pricewatch::config::Settings;
use pricewatch::models::Page;
use pricewatch::services::CatalogService;

use crate::cli::helpers::{format_price, format_time, open_db, truncate, warn_on_user_error};

/// List products ordered by name.
pub async fn cmd_products(settings: &Settings, page: u32, all: bool) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let catalog = CatalogService::new(&ctx);

    let (products, footer) = if all {
        (catalog.products().await?, None)
    } else {
        let listing = catalog
            .product_page(Page::new(page, settings.page_size))
            .await?;
        let footer = format!(
            "Page {} of {} ({} products)",
            listing.page.number,
            listing.page_count().max(1),
            listing.total
        );
        (listing.products, Some(footer))
    };

    if products.is_empty() {
        println!(
            "{} No products. Import a snapshot with 'pricewatch import'.",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("\n{}", style("Products").bold());
    println!("{}", "-".repeat(80));
    println!("{:<6} {:<40} {:>10}  Updated by job", "ID", "Name", "Price");
    println!("{}", "-".repeat(80));

    for product in &products {
        println!(
            "{:<6} {:<40} {:>10}  {}",
            product.id,
            truncate(&product.name, 39),
            format_price(product.price),
            product.job_id
        );
    }

    if let Some(footer) = footer {
        println!("{}", "-".repeat(80));
        println!("{}", style(footer).dim());
    }

    Ok(())
}

/// Show a product's details.
pub async fn cmd_product(settings: &Settings, id: i32) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let catalog = CatalogService::new(&ctx);

    let Some(product) = warn_on_user_error(catalog.product(id).await)? else {
        return Ok(());
    };
    let observations = ctx.prices().count_for_product(id).await?;

    println!("\n{}", style(&product.name).bold());
    println!("{}", "-".repeat(60));
    println!("{:<14} {}", "ID:", product.id);
    println!("{:<14} {}", "Price:", style(format_price(product.price)).green());
    println!("{:<14} {}", "URL:", product.url);
    if !product.img_url.is_empty() {
        println!("{:<14} {}", "Image:", product.img_url);
    }
    println!("{:<14} {}", "First seen:", format_time(&product.created_at));
    println!("{:<14} {}", "Last job:", product.job_id);
    println!("{:<14} {}", "Observations:", observations);
    println!(
        "{:<14} {}",
        "Favourite:",
        if catalog.is_favourite(id).await? { "yes" } else { "no" }
    );
    println!(
        "{:<14} {}",
        "Tracked:",
        if catalog.is_tracked(id).await? { "yes" } else { "no" }
    );

    Ok(())
}

/// Show a product's price history.
pub async fn cmd_history(settings: &Settings, id: i32) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let catalog = CatalogService::new(&ctx);

    let Some(series) = warn_on_user_error(catalog.price_series(id).await)? else {
        return Ok(());
    };

    println!("\n{}", style(format!("Price history: {}", series.title)).bold());
    println!("{}", "-".repeat(40));

    if series.is_empty() {
        println!("{} No observations recorded", style("!").yellow());
        return Ok(());
    }

    for (date, price) in series.dates.iter().zip(&series.prices) {
        println!("{:<20} {:>12}", format_time(date), format_price(*price));
    }

    println!("{}", "-".repeat(40));
    if let (Some(min), Some(max)) = (series.min(), series.max()) {
        println!(
            "Low {}  High {}",
            format_price(min),
            format_price(max)
        );
    }
    if let Some(change) = series.change() {
        let text = format!("{:+.2}", change);
        let styled = if change < 0.0 {
            style(text).green()
        } else if change > 0.0 {
            style(text).red()
        } else {
            style(text).dim()
        };
        println!("Change since first observation: {}", styled);
    }

    Ok(())
}

/// Delete a product with its price history and marks.
pub async fn cmd_delete(settings: &Settings, id: i32, confirm: bool) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let ctx = open_db(settings).await?;
    let catalog = CatalogService::new(&ctx);

    let Some(product) = warn_on_user_error(catalog.product(id).await)? else {
        return Ok(());
    };

    if !confirm {
        print!(
            "Delete '{}' and its price history? [y/N] ",
            truncate(&product.name, 50)
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if warn_on_user_error(catalog.delete_product(id).await)?.is_some() {
        println!("{} Deleted product {}", style("✓").green(), id);
    }
    Ok(())
}
