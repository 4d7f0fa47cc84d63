//! Diesel-based price history repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use super::models::{NewProductPrice, ProductPriceRecord};
use super::pool::{DbPool, DieselError, SqliteConn};
use super::util::{format_datetime, is_unique_violation};
use crate::models::ProductPrice;
use crate::schema::product_price;

/// Check whether a job already recorded a price for a product.
pub async fn exists_for(
    conn: &mut SqliteConn,
    product_id: i32,
    job_id: i32,
) -> Result<bool, DieselError> {
    use diesel::dsl::count_star;
    let count: i64 = product_price::table
        .filter(product_price::product_id.eq(product_id))
        .filter(product_price::job_id.eq(job_id))
        .select(count_star())
        .first(conn)
        .await?;

    Ok(count > 0)
}

/// Append a price observation stamped with the current time.
///
/// Returns false when the (product, job) pair already has a row; the
/// unique constraint is treated as "already recorded".
pub async fn append(
    conn: &mut SqliteConn,
    product_id: i32,
    job_id: i32,
    price: f64,
) -> Result<bool, DieselError> {
    let observed_at = format_datetime(&Utc::now());

    let result = diesel::insert_into(product_price::table)
        .values(&NewProductPrice {
            product_id,
            job_id,
            price,
            observed_at: &observed_at,
        })
        .execute(conn)
        .await;

    match result {
        Ok(_) => Ok(true),
        Err(e) if is_unique_violation(&e) => {
            debug!(product_id, job_id, "price already recorded for job");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Diesel-based price history repository.
#[derive(Debug, Clone)]
pub struct PriceRepository {
    pool: DbPool,
}

impl PriceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Price history of a product, oldest observation first.
    pub async fn history(&self, product_id: i32) -> Result<Vec<ProductPrice>, DieselError> {
        let mut conn = self.pool.get().await?;

        product_price::table
            .filter(product_price::product_id.eq(product_id))
            .order((product_price::observed_at.asc(), product_price::id.asc()))
            .load::<ProductPriceRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(ProductPrice::from).collect())
    }

    /// Number of observations recorded by a job.
    pub async fn count_for_job(&self, job_id: i32) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        product_price::table
            .filter(product_price::job_id.eq(job_id))
            .select(count_star())
            .first(&mut conn)
            .await
    }

    /// Number of observations recorded for a product.
    pub async fn count_for_product(&self, product_id: i32) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        product_price::table
            .filter(product_price::product_id.eq(product_id))
            .select(count_star())
            .first(&mut conn)
            .await
    }

    /// Total number of observations.
    pub async fn count(&self) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        product_price::table
            .select(count_star())
            .first(&mut conn)
            .await
    }
}
