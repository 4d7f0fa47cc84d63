//! Shared helper functions for CLI commands.

use chrono::{DateTime, Utc};
use console::style;

use pricewatch::config::Settings;
use pricewatch::repository::DbContext;
use pricewatch::CatalogResult;

/// Truncate a string to `max` characters, adding "..." if truncated.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

pub fn format_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Open the database, failing with a hint if it was never initialized.
pub async fn open_db(settings: &Settings) -> anyhow::Result<DbContext> {
    if !settings.database_exists() {
        anyhow::bail!(
            "No database at {}. Run 'pricewatch init' first.",
            settings.database_path().display()
        );
    }

    let ctx = settings.create_db_context()?;
    ctx.init_schema().await?;
    Ok(ctx)
}

/// Print NotFound / Conflict as a warning; propagate everything else.
pub fn warn_on_user_error<T>(result: CatalogResult<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_user_facing() => {
            println!("{} {}", style("!").yellow(), e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("kettle", 10), "kettle");
        assert_eq!(truncate("stainless steel kettle", 10), "stainle...");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(12.5), "$12.50");
    }
}
