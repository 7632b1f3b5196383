use std::time::Duration;

use crate::error::PlacefinderError;

/// Query searched on startup, before the user has typed anything.
pub const DEFAULT_QUERY: &str = "Alicante";
pub const LOCATION_NOT_FOUND_MESSAGE: &str = "Location not found. Please try a different name.";
pub const DETAIL_ERROR_MESSAGE: &str = "Could not load place details.";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const API_KEY_ENV: &str = "RAPIDAPI_KEY";
pub const MAP_TOKEN_ENV: &str = "MAPBOX_TOKEN";

/// Behaviour of the search store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Query the store starts with
    pub default_query: String,
    /// Upper bound for each remote call made by a store action
    pub request_timeout: Duration,
    /// Shown when geocoding or the radius search fails
    pub not_found_message: String,
    /// Shown when a place detail cannot be loaded
    pub detail_error_message: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_query: DEFAULT_QUERY.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            not_found_message: LOCATION_NOT_FOUND_MESSAGE.to_string(),
            detail_error_message: DETAIL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::new()
    }
}

/// Builder for creating store configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: StoreConfig::default(),
        }
    }

    pub fn default_query(mut self, query: impl Into<String>) -> Self {
        self.config.default_query = query.into();
        self
    }

    /// Bound every remote call; a call exceeding it fails like a network error
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn not_found_message(mut self, message: impl Into<String>) -> Self {
        self.config.not_found_message = message.into();
        self
    }

    pub fn detail_error_message(mut self, message: impl Into<String>) -> Self {
        self.config.detail_error_message = message.into();
        self
    }

    pub fn build(self) -> Result<StoreConfig, PlacefinderError> {
        if self.config.request_timeout.is_zero() {
            return Err(PlacefinderError::ConfigError(
                "Request timeout must be non-zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}

/// Provider credentials, read once at startup.
#[derive(Clone)]
pub struct Secrets {
    pub api_key: String,
    pub map_token: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("api_key", &"<redacted>")
            .field("map_token", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    /// Read [`API_KEY_ENV`] and [`MAP_TOKEN_ENV`] from the process environment.
    pub fn from_env() -> Result<Self, PlacefinderError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the secrets through `lookup`; blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PlacefinderError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    PlacefinderError::ConfigError(format!("Environment variable {key} is not set"))
                })
        };
        Ok(Self {
            api_key: read(API_KEY_ENV)?,
            map_token: read(MAP_TOKEN_ENV)?,
        })
    }
}
