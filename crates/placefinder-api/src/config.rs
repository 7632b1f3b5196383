use std::time::Duration;

use crate::{ApiError, Result};

pub const DEFAULT_BASE_URL: &str = "https://opentripmap-places-v1.p.rapidapi.com/en";
pub const DEFAULT_API_HOST: &str = "opentripmap-places-v1.p.rapidapi.com";
/// Radius searches always cover this many meters around the geocoded center.
pub const SEARCH_RADIUS_METERS: u32 = 10_000;
pub const DEFAULT_RESULT_LIMIT: u32 = 50;
pub const DEFAULT_MIN_RATING: u8 = 2;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the places provider.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Value of the `X-RapidAPI-Host` header
    pub api_host: String,
    /// Value of the `X-RapidAPI-Key` header
    pub api_key: String,
    /// Result cap for radius searches
    pub limit: u32,
    /// Minimum popularity rating for radius searches (1-3)
    pub min_rating: u8,
    /// Upper bound for a single request, connection included
    pub timeout: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_host", &self.api_host)
            .field("api_key", &"<redacted>")
            .field("limit", &self.limit)
            .field("min_rating", &self.min_rating)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    pub fn builder(api_key: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(api_key)
    }
}

/// Builder for [`ClientConfig`] with the provider's defaults filled in.
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                api_host: DEFAULT_API_HOST.to_string(),
                api_key: api_key.into(),
                limit: DEFAULT_RESULT_LIMIT,
                min_rating: DEFAULT_MIN_RATING,
                timeout: DEFAULT_TIMEOUT,
            },
        }
    }

    /// Point the client at a different deployment of the same API
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn api_host(mut self, api_host: impl Into<String>) -> Self {
        self.config.api_host = api_host.into();
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.config.limit = limit;
        self
    }

    /// Set the minimum rating (clamped to the provider's 1-3 scale)
    pub fn min_rating(mut self, rating: u8) -> Self {
        self.config.min_rating = rating.clamp(1, 3);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Validate and build the final configuration
    pub fn build(self) -> Result<ClientConfig> {
        let config = self.config;
        if config.api_key.trim().is_empty() {
            return Err(ApiError::Config("API key must not be empty".to_string()));
        }
        if config.limit == 0 {
            return Err(ApiError::Config("Result limit must be at least 1".to_string()));
        }
        if config.timeout.is_zero() {
            return Err(ApiError::Config("Timeout must be non-zero".to_string()));
        }
        Ok(ClientConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        })
    }
}
