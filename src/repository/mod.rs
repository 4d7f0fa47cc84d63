//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! against a SQLite database.

pub mod context;
pub mod job;
pub mod marks;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod price;
pub mod product;
pub mod util;

pub use context::DbContext;
pub use job::JobRepository;
pub use marks::{FavouriteRepository, TrackedRepository};
pub use pool::{DbPool, DieselError, SqliteConn};
pub use price::PriceRepository;
pub use product::ProductRepository;

pub use util::{parse_datetime, parse_datetime_opt};
