//! Product catalog models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked product, unique by URL.
///
/// Name, image and price reflect the most recently reconciled snapshot;
/// the full price history lives in [`ProductPrice`] rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub img_url: String,
    pub url: String,
    /// Current (latest observed) price.
    pub price: f64,
    pub created_at: DateTime<Utc>,
    /// Job that last touched this product.
    pub job_id: i32,
}

/// An immutable price observation for one product in one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPrice {
    pub id: i32,
    pub product_id: i32,
    pub job_id: i32,
    pub price: f64,
    pub observed_at: DateTime<Utc>,
}

/// Marks a product as favourited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favourite {
    pub id: i32,
    pub product_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Marks a product for ongoing price tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedProduct {
    pub id: i32,
    pub product_id: i32,
    pub created_at: DateTime<Utc>,
}

/// A page request for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub fn new(number: u32, size: u32) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }

    /// Number of pages needed to show `total` items.
    pub fn page_count(&self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        (total + self.limit() - 1) / self.limit()
    }
}

/// Price history of a product, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub product_id: i32,
    pub title: String,
    pub dates: Vec<DateTime<Utc>>,
    pub prices: Vec<f64>,
}

impl PriceSeries {
    /// Build a series from observations already ordered by time.
    pub fn from_history(product: &Product, history: &[ProductPrice]) -> Self {
        Self {
            product_id: product.id,
            title: product.name.clone(),
            dates: history.iter().map(|p| p.observed_at).collect(),
            prices: history.iter().map(|p| p.price).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn min(&self) -> Option<f64> {
        self.prices.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.prices.iter().copied().reduce(f64::max)
    }

    pub fn latest(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    /// Change from the first to the latest observation.
    pub fn change(&self) -> Option<f64> {
        match (self.prices.first(), self.prices.last()) {
            (Some(first), Some(last)) if self.prices.len() > 1 => Some(last - first),
            _ => None,
        }
    }
}
