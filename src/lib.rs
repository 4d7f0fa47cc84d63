//! pricewatch - e-commerce product price tracking.
//!
//! Scrape snapshots are triggered at a provider, fetched once ready and
//! reconciled into a local catalog of products with an append-only price
//! history per scrape job.

pub mod config;
pub mod error;
pub mod migrations;
pub mod models;
pub mod provider;
pub mod repository;
pub mod schema;
pub mod services;

pub use error::{CatalogError, CatalogResult, IngestionError};
