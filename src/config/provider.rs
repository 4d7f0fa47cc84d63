//! Scrape provider configuration.

use serde::{Deserialize, Serialize};

/// Default datasets API endpoint.
pub const DEFAULT_PROVIDER_ENDPOINT: &str = "https://api.brightdata.com";

/// Credentials and endpoint for the scrape provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct ProviderConfig {
    /// API base URL.
    #[serde(default = "default_endpoint")]
    #[prefer(default = "https://api.brightdata.com")]
    pub endpoint: String,
    /// Bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Dataset the discovery runs against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
}

fn default_endpoint() -> String {
    DEFAULT_PROVIDER_ENDPOINT.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl ProviderConfig {
    /// Base default without env overrides.
    fn base_default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            dataset_id: None,
        }
    }

    /// Check if the config equals the default (for skip_serializing_if).
    pub fn is_default(&self) -> bool {
        *self == Self::base_default()
    }

    /// Whether trigger and fetch can be attempted.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
            && self.dataset_id.as_deref().is_some_and(|d| !d.is_empty())
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `API_KEY`: provider bearer token
    /// - `DATASET_ID`: dataset to trigger discovery on
    /// - `PROVIDER_ENDPOINT`: API base URL
    ///
    /// Explicit env vars always win over the config file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(endpoint) = non_empty_env("PROVIDER_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(key) = non_empty_env("API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(dataset) = non_empty_env("DATASET_ID") {
            self.dataset_id = Some(dataset);
        }
        self
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_configured() {
        let mut config = ProviderConfig::base_default();
        assert!(!config.is_configured());
        assert!(config.is_default());

        config.api_key = Some("key".into());
        assert!(!config.is_configured());

        config.dataset_id = Some("gd_1".into());
        assert!(config.is_configured());
        assert!(!config.is_default());
    }

    #[test]
    fn test_deserialize_defaults_endpoint() {
        let config: ProviderConfig = serde_json::from_str(r#"{"dataset_id": "gd_1"}"#).unwrap();
        assert_eq!(config.endpoint, DEFAULT_PROVIDER_ENDPOINT);
        assert_eq!(config.dataset_id.as_deref(), Some("gd_1"));
    }
}
