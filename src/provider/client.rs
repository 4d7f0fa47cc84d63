//! Bright Data datasets API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::{parse_rows, ProviderError, SnapshotSource, SnapshotTrigger};
use crate::config::ProviderConfig;
use crate::models::ValidatedSnapshot;

/// Discovery request body entry.
#[derive(Debug, Serialize)]
struct KeywordInput<'a> {
    keyword: &'a str,
}

#[derive(Debug, Deserialize)]
struct TriggerResponse {
    snapshot_id: Option<String>,
}

/// Client for the datasets v3 trigger and snapshot endpoints.
#[derive(Debug, Clone)]
pub struct BrightDataClient {
    client: Client,
    endpoint: String,
    api_key: String,
    dataset_id: String,
}

impl BrightDataClient {
    /// Build a client from provider configuration.
    ///
    /// Fails if the API key or dataset ID is missing or the endpoint is not a URL.
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| ProviderError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::NotConfigured("API_KEY"))?;
        let dataset_id = config
            .dataset_id
            .clone()
            .filter(|d| !d.is_empty())
            .ok_or(ProviderError::NotConfigured("DATASET_ID"))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
            api_key,
            dataset_id,
        })
    }

    fn trigger_url(&self) -> String {
        format!("{}/datasets/v3/trigger", self.endpoint)
    }

    fn snapshot_url(&self, snapshot_id: &str) -> String {
        format!("{}/datasets/v3/snapshot/{}", self.endpoint, snapshot_id)
    }
}

#[async_trait]
impl SnapshotTrigger for BrightDataClient {
    async fn trigger(&self, keywords: &[String]) -> Result<String, ProviderError> {
        let body: Vec<KeywordInput<'_>> = keywords
            .iter()
            .map(|k| KeywordInput { keyword: k })
            .collect();

        debug!(keywords = ?keywords, "triggering discovery");
        let resp = self
            .client
            .post(self.trigger_url())
            .bearer_auth(&self.api_key)
            .query(&[
                ("dataset_id", self.dataset_id.as_str()),
                ("include_errors", "true"),
                ("type", "discover_new"),
                ("discover_by", "keyword"),
            ])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TriggerResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        let snapshot_id = parsed
            .snapshot_id
            .filter(|id| !id.is_empty())
            .ok_or(ProviderError::MissingSnapshotId)?;

        info!(snapshot_id = %snapshot_id, "scrape triggered");
        Ok(snapshot_id)
    }
}

#[async_trait]
impl SnapshotSource for BrightDataClient {
    async fn fetch(&self, snapshot_id: &str) -> Result<ValidatedSnapshot, ProviderError> {
        let resp = self
            .client
            .get(self.snapshot_url(snapshot_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::ACCEPTED {
            return Err(ProviderError::NotReady(snapshot_id.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        let rows = parse_rows(&text, snapshot_id)?;
        let snapshot = ValidatedSnapshot::from_rows(rows);

        debug!(
            snapshot_id,
            records = snapshot.records.len(),
            skipped = snapshot.skipped.len(),
            "fetched snapshot"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig {
            endpoint: "https://api.example.test/".to_string(),
            api_key: Some("key".to_string()),
            dataset_id: Some("gd_123".to_string()),
        }
    }

    #[test]
    fn test_urls() {
        let client = BrightDataClient::new(&config(), Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.trigger_url(),
            "https://api.example.test/datasets/v3/trigger"
        );
        assert_eq!(
            client.snapshot_url("s_abc"),
            "https://api.example.test/datasets/v3/snapshot/s_abc"
        );
    }

    #[test]
    fn test_requires_credentials() {
        let mut cfg = config();
        cfg.api_key = None;
        let err = BrightDataClient::new(&cfg, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured("API_KEY")));

        let mut cfg = config();
        cfg.dataset_id = Some(String::new());
        let err = BrightDataClient::new(&cfg, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured("DATASET_ID")));

        let mut cfg = config();
        cfg.endpoint = "not a url".to_string();
        let err = BrightDataClient::new(&cfg, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidEndpoint(_)));
    }
}
