//! Data models for pricewatch.

mod job;
mod product;
mod snapshot;

pub use job::{JobStatus, NewJob, ScrapeJob};
pub use product::{Favourite, Page, PriceSeries, Product, ProductPrice, TrackedProduct};
pub use snapshot::{RawSnapshotRow, SkipReason, SnapshotRecord, ValidatedSnapshot};
