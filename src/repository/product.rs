//! Diesel-based product repository.
//!
//! The free functions taking a connection are the building blocks the
//! reconciler runs inside its transaction; the repository methods wrap
//! them with a pooled connection for standalone use.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{NewProduct, ProductRecord, ProductSnapshotChanges};
use super::pool::{DbPool, DieselError, SqliteConn};
use super::util::format_datetime;
use crate::models::{Page, Product, SnapshotRecord};
use crate::schema::{favourites, product, product_price, tracked_products};

/// Look up a product by its natural key.
pub async fn find_by_url(
    conn: &mut SqliteConn,
    url: &str,
) -> Result<Option<ProductRecord>, DieselError> {
    product::table
        .filter(product::url.eq(url))
        .first::<ProductRecord>(conn)
        .await
        .optional()
}

/// Insert a product for a snapshot record and return the stored row.
///
/// Fails with a unique violation if another product already owns the URL.
pub async fn insert(
    conn: &mut SqliteConn,
    record: &SnapshotRecord,
    job_id: i32,
) -> Result<ProductRecord, DieselError> {
    let created_at = format_datetime(&Utc::now());

    diesel::insert_into(product::table)
        .values(&NewProduct {
            name: &record.title,
            img_url: &record.image_url,
            url: &record.url,
            price: record.price,
            created_at: &created_at,
            job_id,
        })
        .execute(conn)
        .await?;

    product::table
        .filter(product::url.eq(&record.url))
        .first::<ProductRecord>(conn)
        .await
}

/// Overwrite the displayed snapshot fields of a product.
pub async fn apply_snapshot(
    conn: &mut SqliteConn,
    product_id: i32,
    record: &SnapshotRecord,
    job_id: i32,
) -> Result<(), DieselError> {
    diesel::update(product::table.find(product_id))
        .set(&ProductSnapshotChanges {
            name: &record.title,
            img_url: &record.image_url,
            price: record.price,
            job_id,
        })
        .execute(conn)
        .await?;
    Ok(())
}

/// Diesel-based product repository.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: DbPool,
}

impl ProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    pub async fn get(&self, id: i32) -> Result<Option<Product>, DieselError> {
        let mut conn = self.pool.get().await?;

        product::table
            .find(id)
            .first::<ProductRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Product::from))
    }

    /// Get a product by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Product>, DieselError> {
        let mut conn = self.pool.get().await?;
        find_by_url(&mut conn, url)
            .await
            .map(|opt| opt.map(Product::from))
    }

    /// List products ordered by name, optionally paged.
    pub async fn list(&self, page: Option<Page>) -> Result<Vec<Product>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = product::table
            .order((product::name.asc(), product::id.asc()))
            .into_boxed();

        if let Some(page) = page {
            query = query.limit(page.limit()).offset(page.offset());
        }

        query
            .load::<ProductRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(Product::from).collect())
    }

    /// Count all products.
    pub async fn count(&self) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        product::table
            .select(count_star())
            .first(&mut conn)
            .await
    }

    /// Delete a product together with its price history and marks.
    ///
    /// Returns false if the product did not exist.
    pub async fn delete(&self, id: i32) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        conn.transaction(|conn| {
            Box::pin(async move {
                diesel::delete(product_price::table.filter(product_price::product_id.eq(id)))
                    .execute(conn)
                    .await?;

                diesel::delete(favourites::table.filter(favourites::product_id.eq(id)))
                    .execute(conn)
                    .await?;

                diesel::delete(
                    tracked_products::table.filter(tracked_products::product_id.eq(id)),
                )
                .execute(conn)
                .await?;

                let rows = diesel::delete(product::table.find(id))
                    .execute(conn)
                    .await?;

                Ok(rows > 0)
            })
        })
        .await
    }
}
