//! Diesel ORM models for database tables.
//!
//! These records mirror the table layout; domain models in [`crate::models`]
//! are built from them via `From` impls.

use diesel::prelude::*;

use super::util::{parse_datetime, parse_datetime_opt};
use crate::models::{
    Favourite, JobStatus, Product, ProductPrice, ScrapeJob, TrackedProduct,
};
use crate::schema;

/// Product record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::product)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductRecord {
    pub id: i32,
    pub name: String,
    pub img_url: String,
    pub url: String,
    pub price: f64,
    pub created_at: String,
    pub job_id: i32,
}

/// New product for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::product)]
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub img_url: &'a str,
    pub url: &'a str,
    pub price: f64,
    pub created_at: &'a str,
    pub job_id: i32,
}

/// Snapshot fields overwritten on every re-scrape.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = schema::product)]
pub struct ProductSnapshotChanges<'a> {
    pub name: &'a str,
    pub img_url: &'a str,
    pub price: f64,
    pub job_id: i32,
}

/// Price observation record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::product_price)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductPriceRecord {
    pub id: i32,
    pub product_id: i32,
    pub job_id: i32,
    pub price: f64,
    pub observed_at: String,
}

/// New price observation for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::product_price)]
pub struct NewProductPrice<'a> {
    pub product_id: i32,
    pub job_id: i32,
    pub price: f64,
    pub observed_at: &'a str,
}

/// Scrape job record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::scrape_job)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ScrapeJobRecord {
    pub id: i32,
    pub snapshot_id: String,
    pub keyword: String,
    pub status: String,
    pub created_at: String,
    pub finished_at: Option<String>,
    pub last_error: Option<String>,
}

/// New scrape job for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::scrape_job)]
pub struct NewScrapeJob<'a> {
    pub snapshot_id: &'a str,
    pub keyword: &'a str,
    pub status: &'a str,
    pub created_at: &'a str,
}

/// Favourite record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::favourites)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FavouriteRecord {
    pub id: i32,
    pub product_id: i32,
    pub created_at: String,
}

/// Tracked product record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::tracked_products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TrackedProductRecord {
    pub id: i32,
    pub product_id: i32,
    pub created_at: String,
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        Product {
            id: record.id,
            name: record.name,
            img_url: record.img_url,
            url: record.url,
            price: record.price,
            created_at: parse_datetime(&record.created_at),
            job_id: record.job_id,
        }
    }
}

impl From<ProductPriceRecord> for ProductPrice {
    fn from(record: ProductPriceRecord) -> Self {
        ProductPrice {
            id: record.id,
            product_id: record.product_id,
            job_id: record.job_id,
            price: record.price,
            observed_at: parse_datetime(&record.observed_at),
        }
    }
}

impl From<ScrapeJobRecord> for ScrapeJob {
    fn from(record: ScrapeJobRecord) -> Self {
        ScrapeJob {
            id: record.id,
            snapshot_id: record.snapshot_id,
            keyword: record.keyword,
            status: JobStatus::from_str(&record.status).unwrap_or(JobStatus::Pending),
            created_at: parse_datetime(&record.created_at),
            finished_at: parse_datetime_opt(record.finished_at),
            last_error: record.last_error,
        }
    }
}

impl From<FavouriteRecord> for Favourite {
    fn from(record: FavouriteRecord) -> Self {
        Favourite {
            id: record.id,
            product_id: record.product_id,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

impl From<TrackedProductRecord> for TrackedProduct {
    fn from(record: TrackedProductRecord) -> Self {
        TrackedProduct {
            id: record.id,
            product_id: record.product_id,
            created_at: parse_datetime(&record.created_at),
        }
    }
}
