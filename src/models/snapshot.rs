//! Snapshot records as delivered by the scrape provider.
//!
//! Provider rows are loosely typed; [`RawSnapshotRow`] accepts whatever the
//! provider sends and [`SnapshotRecord`] is the validated shape the
//! reconciler works with.

use serde::{Deserialize, Serialize};

/// A row exactly as returned by the provider.
///
/// Unknown columns are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSnapshotRow {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub initial_price: Option<serde_json::Value>,
}

/// Why a raw row was dropped before reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingPrice,
    InvalidPrice,
    MissingUrl,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingPrice => "missing price",
            Self::InvalidPrice => "invalid price",
            Self::MissingUrl => "missing url",
        }
    }
}

/// A validated scraped product observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub title: String,
    pub image_url: String,
    pub url: String,
    pub price: f64,
}

impl SnapshotRecord {
    pub fn new(
        title: impl Into<String>,
        image_url: impl Into<String>,
        url: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            title: title.into(),
            image_url: image_url.into(),
            url: url.into(),
            price,
        }
    }
}

impl TryFrom<RawSnapshotRow> for SnapshotRecord {
    type Error = SkipReason;

    fn try_from(row: RawSnapshotRow) -> Result<Self, Self::Error> {
        let price = match row.initial_price {
            None | Some(serde_json::Value::Null) => return Err(SkipReason::MissingPrice),
            Some(value) => parse_price(&value).ok_or(SkipReason::InvalidPrice)?,
        };

        let url = row
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(SkipReason::MissingUrl)?;

        let title = row
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| url.clone());

        Ok(Self {
            title,
            image_url: row.image_url.unwrap_or_default(),
            url,
            price,
        })
    }
}

/// Parse a provider price value (number or numeric string).
fn parse_price(value: &serde_json::Value) -> Option<f64> {
    let price = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .parse::<f64>()
            .ok()?,
        _ => return None,
    };

    (price.is_finite() && price >= 0.0).then_some(price)
}

/// Result of validating a batch of raw rows.
#[derive(Debug, Clone, Default)]
pub struct ValidatedSnapshot {
    pub records: Vec<SnapshotRecord>,
    pub skipped: Vec<SkipReason>,
}

impl ValidatedSnapshot {
    /// Validate raw rows, keeping the valid ones in order.
    pub fn from_rows(rows: impl IntoIterator<Item = RawSnapshotRow>) -> Self {
        let mut out = Self::default();
        for row in rows {
            match SnapshotRecord::try_from(row) {
                Ok(record) => out.records.push(record),
                Err(reason) => out.skipped.push(reason),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> RawSnapshotRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_row() {
        let record = SnapshotRecord::try_from(row(json!({
            "title": "Widget",
            "image_url": "https://img.example/w.jpg",
            "url": "https://shop.example/w",
            "initial_price": 10.5,
            "rating": 4.2
        })))
        .unwrap();

        assert_eq!(record.title, "Widget");
        assert_eq!(record.url, "https://shop.example/w");
        assert_eq!(record.price, 10.5);
    }

    #[test]
    fn test_null_price_is_skipped() {
        let result = SnapshotRecord::try_from(row(json!({
            "title": "Widget",
            "url": "https://shop.example/w",
            "initial_price": null
        })));
        assert_eq!(result, Err(SkipReason::MissingPrice));

        let result = SnapshotRecord::try_from(row(json!({"url": "https://shop.example/w"})));
        assert_eq!(result, Err(SkipReason::MissingPrice));
    }

    #[test]
    fn test_string_prices() {
        let record = SnapshotRecord::try_from(row(json!({
            "url": "https://shop.example/w",
            "initial_price": "$1,299.99"
        })))
        .unwrap();
        assert_eq!(record.price, 1299.99);

        let result = SnapshotRecord::try_from(row(json!({
            "url": "https://shop.example/w",
            "initial_price": "call for price"
        })));
        assert_eq!(result, Err(SkipReason::InvalidPrice));
    }

    #[test]
    fn test_negative_price_is_invalid() {
        let result = SnapshotRecord::try_from(row(json!({
            "url": "https://shop.example/w",
            "initial_price": -3
        })));
        assert_eq!(result, Err(SkipReason::InvalidPrice));
    }

    #[test]
    fn test_missing_url() {
        let result = SnapshotRecord::try_from(row(json!({
            "title": "Widget",
            "url": "   ",
            "initial_price": 3
        })));
        assert_eq!(result, Err(SkipReason::MissingUrl));
    }

    #[test]
    fn test_title_falls_back_to_url() {
        let record = SnapshotRecord::try_from(row(json!({
            "url": "https://shop.example/w",
            "initial_price": 3
        })))
        .unwrap();
        assert_eq!(record.title, "https://shop.example/w");
        assert_eq!(record.image_url, "");
    }

    #[test]
    fn test_validate_batch() {
        let batch = ValidatedSnapshot::from_rows(vec![
            row(json!({"url": "a", "initial_price": 1})),
            row(json!({"url": "b", "initial_price": null})),
            row(json!({"initial_price": 2})),
            row(json!({"url": "c", "initial_price": 3})),
        ]);

        let urls: Vec<_> = batch.records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["a", "c"]);
        assert_eq!(
            batch.skipped,
            vec![SkipReason::MissingPrice, SkipReason::MissingUrl]
        );
    }
}
