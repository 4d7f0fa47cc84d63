//! Favourite and tracked-product repositories.
//!
//! Both tables hold at most one row per product and differ only in name,
//! so the repositories are generated from one definition.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{FavouriteRecord, ProductRecord, TrackedProductRecord};
use super::pool::{DbPool, DieselError};
use super::util::format_datetime;
use crate::models::{Favourite, Product, TrackedProduct};
use crate::schema::{favourites, product, tracked_products};

macro_rules! mark_repository {
    ($(#[$meta:meta])* $name:ident, $table:ident, $record:ty, $model:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            pool: DbPool,
        }

        impl $name {
            pub fn new(pool: DbPool) -> Self {
                Self { pool }
            }

            /// Check whether a product is marked.
            pub async fn exists(&self, product_id: i32) -> Result<bool, DieselError> {
                let mut conn = self.pool.get().await?;

                use diesel::dsl::count_star;
                let count: i64 = $table::table
                    .filter($table::product_id.eq(product_id))
                    .select(count_star())
                    .first(&mut conn)
                    .await?;

                Ok(count > 0)
            }

            /// Mark a product.
            ///
            /// Fails with a unique violation if the product is already marked.
            pub async fn insert(&self, product_id: i32) -> Result<$model, DieselError> {
                let mut conn = self.pool.get().await?;
                let created_at = format_datetime(&Utc::now());

                diesel::insert_into($table::table)
                    .values((
                        $table::product_id.eq(product_id),
                        $table::created_at.eq(&created_at),
                    ))
                    .execute(&mut conn)
                    .await?;

                $table::table
                    .filter($table::product_id.eq(product_id))
                    .first::<$record>(&mut conn)
                    .await
                    .map(<$model>::from)
            }

            /// Remove the mark from a product. Returns false if it was not marked.
            pub async fn remove(&self, product_id: i32) -> Result<bool, DieselError> {
                let mut conn = self.pool.get().await?;

                let rows = diesel::delete($table::table.filter($table::product_id.eq(product_id)))
                    .execute(&mut conn)
                    .await?;

                Ok(rows > 0)
            }

            /// All marked products, ordered by product name.
            pub async fn list(&self) -> Result<Vec<($model, Product)>, DieselError> {
                let mut conn = self.pool.get().await?;

                $table::table
                    .inner_join(product::table)
                    .order((product::name.asc(), product::id.asc()))
                    .select(($table::all_columns, product::all_columns))
                    .load::<($record, ProductRecord)>(&mut conn)
                    .await
                    .map(|rows| {
                        rows.into_iter()
                            .map(|(mark, product)| (<$model>::from(mark), Product::from(product)))
                            .collect()
                    })
            }

            /// Number of marked products.
            pub async fn count(&self) -> Result<i64, DieselError> {
                let mut conn = self.pool.get().await?;

                use diesel::dsl::count_star;
                $table::table.select(count_star()).first(&mut conn).await
            }
        }
    };
}

mark_repository!(
    /// Repository for favourited products.
    FavouriteRepository,
    favourites,
    FavouriteRecord,
    Favourite
);

mark_repository!(
    /// Repository for products under price tracking.
    TrackedRepository,
    tracked_products,
    TrackedProductRecord,
    TrackedProduct
);
