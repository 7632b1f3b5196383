//! Placefinder: type a place name, get the points of interest around it.
//!
//! The crate is organised around a single [`PlacesStore`] that owns the search state.
//! It geocodes the query through a [`PlacesApi`] implementation, loads the places within
//! a fixed radius, drops unusable and duplicate entries ([`filter_places`]), and loads
//! detail records on demand. [`MapView`] mirrors the current results as markers on
//! whatever map widget a [`MapProvider`] supplies, and [`format`] holds the text helpers
//! used to present places.
pub mod config;
pub mod error;
mod filter;
pub mod format;
pub mod map;
mod store;

pub use config::{Secrets, StoreConfig, StoreConfigBuilder};
pub use error::PlacefinderError;
pub use filter::filter_places;
pub use map::{MapError, MapOptions, MapProvider, MapView, MapWidget, MarkerHandle, SelectCallback};
use once_cell::sync::OnceCell;
#[cfg(feature = "http")]
pub use placefinder_api::OpenTripMapClient;
pub use placefinder_api::{
    Address, ApiError, ClientConfig, Coordinate, GeoLocation, Place, PlaceDetail, PlacesApi,
    Preview,
};
pub use store::{PlacesStore, SearchOutcome, SearchState, SelectOutcome};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

static LOGGING: OnceCell<()> = OnceCell::new();

/// Install the global `tracing` subscriber. `RUST_LOG` takes precedence over `level`.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_logging(level: impl Into<LevelFilter>) -> error::Result<&'static ()> {
    LOGGING.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| PlacefinderError::Other(anyhow::anyhow!(e)))?;
        Ok(())
    })
}
