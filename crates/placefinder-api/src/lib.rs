//! Geocoding and points-of-interest client for Placefinder.
//!
//! This crate owns everything that crosses the network boundary: the typed data model
//! ([`GeoLocation`], [`Place`], [`PlaceDetail`]), validation of the raw JSON payloads,
//! and the [`PlacesApi`] trait that the search store is written against.
//!
//! With the default `http` feature enabled, [`OpenTripMapClient`] implements
//! [`PlacesApi`] on top of the OpenTripMap API served through RapidAPI.
use std::{future::Future, sync::Arc};

mod config;
pub mod models;
mod wire;

#[cfg(feature = "http")]
mod client;

#[cfg(feature = "http")]
pub use client::OpenTripMapClient;
pub use config::{
    ClientConfig, ClientConfigBuilder, DEFAULT_API_HOST, DEFAULT_BASE_URL, DEFAULT_MIN_RATING,
    DEFAULT_RESULT_LIMIT, DEFAULT_TIMEOUT, SEARCH_RADIUS_METERS,
};
pub use error::{ApiError, Result};
pub use models::{Address, Coordinate, GeoLocation, Place, PlaceDetail, Preview};

mod error {
    use std::time::Duration;

    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum ApiError {
        #[error("Not found: {0}")]
        NotFound(String),
        #[error("Network error: {0}")]
        Network(String),
        #[error("Request timed out after {0:?}")]
        Timeout(Duration),
        #[error("Invalid response: {0}")]
        InvalidResponse(String),
        #[error("Serialization error: {0}")]
        Serde(#[from] serde_json::Error),
        #[error("Configuration error: {0}")]
        Config(String),
    }

    impl ApiError {
        /// `true` when the remote side answered but had nothing for the request.
        #[must_use]
        pub const fn is_not_found(&self) -> bool {
            matches!(self, Self::NotFound(_))
        }

        /// `true` for transport-level failures, timeouts included.
        #[must_use]
        pub const fn is_network(&self) -> bool {
            matches!(self, Self::Network(_) | Self::Timeout(_))
        }
    }

    #[cfg(feature = "http")]
    impl From<reqwest::Error> for ApiError {
        fn from(err: reqwest::Error) -> Self {
            if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
                Self::NotFound(
                    err.url()
                        .map_or_else(|| "resource".to_string(), ToString::to_string),
                )
            } else {
                Self::Network(err.to_string())
            }
        }
    }

    pub type Result<T> = std::result::Result<T, ApiError>;
}

/// The three read operations the places provider exposes.
///
/// Every call is a single attempt: implementations must not retry, and must surface
/// transport failures as [`ApiError::Network`] (or [`ApiError::Timeout`]) rather than
/// swallowing them.
pub trait PlacesApi {
    /// Resolve a free-text location name to coordinates.
    ///
    /// Fails with [`ApiError::NotFound`] when the provider has no valid, non-zero
    /// coordinate for the name.
    fn geocode(&self, name: &str) -> impl Future<Output = Result<GeoLocation>> + Send;

    /// Points of interest within [`SEARCH_RADIUS_METERS`] of the coordinate.
    fn find_nearby(&self, lat: f64, lon: f64) -> impl Future<Output = Result<Vec<Place>>> + Send;

    /// Extended detail for one point of interest.
    fn get_detail(&self, id: &str) -> impl Future<Output = Result<PlaceDetail>> + Send;
}

impl<T: PlacesApi + Send + Sync> PlacesApi for Arc<T> {
    fn geocode(&self, name: &str) -> impl Future<Output = Result<GeoLocation>> + Send {
        (**self).geocode(name)
    }

    fn find_nearby(&self, lat: f64, lon: f64) -> impl Future<Output = Result<Vec<Place>>> + Send {
        (**self).find_nearby(lat, lon)
    }

    fn get_detail(&self, id: &str) -> impl Future<Output = Result<PlaceDetail>> + Send {
        (**self).get_detail(id)
    }
}
