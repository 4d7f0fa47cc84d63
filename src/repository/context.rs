//! Database context for managing the connection pool and repository access.

use std::path::Path;

use super::job::JobRepository;
use super::marks::{FavouriteRepository, TrackedRepository};
use super::migrations;
use super::pool::{DbPool, DieselError};
use super::price::PriceRepository;
use super::product::ProductRepository;

/// Database context that owns the connection pool and hands out repositories.
///
/// Create one context at startup and pass it by reference to the services
/// that need it.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_url("sqlite:pricewatch.db")?;
/// ctx.init_schema().await?;
/// let products = ctx.products().list(None).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    /// Create a context from a database URL or SQLite file path.
    pub fn from_url(database_url: &str) -> Result<Self, DieselError> {
        Ok(Self {
            pool: DbPool::from_url(database_url)?,
        })
    }

    /// Create a context for a SQLite file.
    pub fn from_path(db_path: &Path) -> Self {
        Self {
            pool: DbPool::from_path(db_path),
        }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn prices(&self) -> PriceRepository {
        PriceRepository::new(self.pool.clone())
    }

    pub fn jobs(&self) -> JobRepository {
        JobRepository::new(self.pool.clone())
    }

    pub fn favourites(&self) -> FavouriteRepository {
        FavouriteRepository::new(self.pool.clone())
    }

    pub fn tracked(&self) -> TrackedRepository {
        TrackedRepository::new(self.pool.clone())
    }

    /// Apply pending migrations. Returns the names applied by this call.
    pub async fn init_schema(&self) -> Result<Vec<String>, DieselError> {
        migrations::run_migrations(self.pool.database_url()).await
    }

    /// Test that the database connection works.
    ///
    /// For SQLite this creates the database file if it doesn't exist.
    pub async fn test_connection(&self) -> Result<(), DieselError> {
        self.pool.get().await.map(|_| ())
    }

    /// Get list of all user tables in the database.
    pub async fn list_tables(&self) -> Result<Vec<String>, DieselError> {
        use diesel_async::RunQueryDsl;

        let mut conn = self.pool.get().await?;
        let rows: Vec<TableName> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .load(&mut conn)
        .await?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }
}

#[derive(diesel::QueryableByName)]
struct TableName {
    #[diesel(sql_type = diesel::sql_types::Text)]
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_db_context() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let ctx = DbContext::from_url(&format!("sqlite:{}", db_path.display())).unwrap();
        ctx.init_schema().await.unwrap();

        let tables = ctx.list_tables().await.unwrap();
        for table in [
            "favourites",
            "product",
            "product_price",
            "scrape_job",
            "tracked_products",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }

        assert!(ctx.products().list(None).await.unwrap().is_empty());
        assert!(ctx.jobs().list().await.unwrap().is_empty());
    }
}
