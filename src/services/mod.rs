//! Service layer for pricewatch business logic.
//!
//! Services sit between the repositories and the CLI and translate
//! storage outcomes into [`CatalogError`](crate::error::CatalogError)s.

pub mod catalog;
pub mod jobs;
pub mod reconcile;

pub use catalog::{CatalogService, ProductPage};
pub use jobs::{ImportSummary, JobService};
pub use reconcile::{ReconcileReport, SnapshotReconciler, DEFAULT_RECONCILE_TIMEOUT};
