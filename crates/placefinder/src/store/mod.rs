//! The search store: sole owner and writer of [`SearchState`].
//!
//! Actions follow `Idle -> Searching -> (Success | Failed)` and always end with
//! `loading == false`. Every action is tagged with a generation number; when a newer
//! action of the same kind has been issued in the meantime, the older completion is
//! discarded, so the last *issued* search or selection wins no matter which network
//! call finishes first.
//!
//! ```rust,no_run
//! use placefinder::{OpenTripMapClient, ClientConfig, PlacesStore, StoreConfig};
//!
//! # async fn run() -> Result<(), placefinder::error::PlacefinderError> {
//! let client = OpenTripMapClient::new(ClientConfig::builder("key").build()?)?;
//! let store = PlacesStore::new(client, StoreConfig::default());
//!
//! store.search("Alicante").await;
//! let state = store.state();
//! println!("{} places", state.total_places());
//! # Ok(())
//! # }
//! ```
use std::{
    future::Future,
    sync::{PoisonError, RwLock, RwLockWriteGuard},
};

use placefinder_api::{ApiError, GeoLocation, Place, PlacesApi};
use tracing::{debug, info, instrument, warn};

use crate::{config::StoreConfig, filter::filter_places};

mod state;

pub use state::SearchState;

/// How a [`PlacesStore::search`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank query; state untouched
    Skipped,
    /// Results stored
    Completed { places: usize },
    /// Error message stored, no results
    Failed,
    /// A newer search was issued while this one was in flight; state untouched
    Superseded,
}

/// How a [`PlacesStore::select_place`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Skipped,
    Selected,
    /// Error message stored, previous selection kept
    Failed,
    Superseded,
}

struct Inner {
    state: SearchState,
    search_generation: u64,
    detail_generation: u64,
}

pub struct PlacesStore<A> {
    api: A,
    config: StoreConfig,
    inner: RwLock<Inner>,
}

/// Clears `loading` when the search that set it ends, on every exit path including
/// cancellation of the future. A search that has been superseded leaves the flag to
/// its successor.
struct LoadingGuard<'a, A> {
    store: &'a PlacesStore<A>,
    generation: u64,
}

impl<A> Drop for LoadingGuard<'_, A> {
    fn drop(&mut self) {
        let mut inner = self.store.write();
        if inner.search_generation == self.generation {
            inner.state.loading = false;
        }
    }
}

impl<A> PlacesStore<A> {
    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Borrow the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&SearchState) -> R) -> R {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&inner.state)
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SearchState {
        self.read(Clone::clone)
    }

    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Update the text bound to the search input without searching.
    pub fn set_query(&self, query: impl Into<String>) {
        self.write().state.query = query.into();
    }

    /// Close the detail view. Also discards any detail fetch still in flight.
    pub fn clear_selection(&self) {
        let mut inner = self.write();
        inner.detail_generation += 1;
        inner.state.selected_detail = None;
    }
}

impl<A: PlacesApi> PlacesStore<A> {
    pub fn new(api: A, config: StoreConfig) -> Self {
        let state = SearchState::new(config.default_query.clone());
        Self {
            api,
            config,
            inner: RwLock::new(Inner {
                state,
                search_generation: 0,
                detail_generation: 0,
            }),
        }
    }

    /// Run `call` under the configured request timeout.
    async fn bounded<T>(&self, call: impl Future<Output = Result<T, ApiError>>) -> Result<T, ApiError> {
        let limit = self.config.request_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(ApiError::Timeout(limit)))
    }

    async fn fetch_places(&self, query: &str) -> Result<(GeoLocation, Vec<Place>), ApiError> {
        let location = self.bounded(self.api.geocode(query)).await?;
        debug!(%location, "Geocoded query");
        let raw = self
            .bounded(self.api.find_nearby(location.lat, location.lon))
            .await?;
        let raw_count = raw.len();
        let places = filter_places(raw, &location);
        debug!(raw_count, kept = places.len(), "Filtered nearby places");
        Ok((location, places))
    }

    /// Geocode `query` and load the points of interest around it.
    ///
    /// A blank query is ignored. Otherwise the previous results, error and selection
    /// are cleared and `loading` is set until the search ends. Any failure, whether the
    /// name is unknown or the network is down, stores the same user-facing message.
    #[instrument(name = "Search places", skip(self), level = "info")]
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            debug!("Ignoring blank query");
            return SearchOutcome::Skipped;
        }

        let generation = {
            let mut inner = self.write();
            inner.search_generation += 1;
            // Results are about to be replaced, so any detail in flight is stale too
            inner.detail_generation += 1;
            let state = &mut inner.state;
            state.query = query.to_string();
            state.loading = true;
            state.error = None;
            state.location = None;
            state.places.clear();
            state.selected_detail = None;
            inner.search_generation
        };
        let _loading = LoadingGuard {
            store: self,
            generation,
        };

        let result = self.fetch_places(query).await;

        let mut inner = self.write();
        if inner.search_generation != generation {
            debug!(generation, "Discarding superseded search");
            return SearchOutcome::Superseded;
        }
        match result {
            Ok((location, places)) => {
                info!(%location, count = places.len(), "Search complete");
                let count = places.len();
                inner.state.location = Some(location);
                inner.state.places = places;
                SearchOutcome::Completed { places: count }
            }
            Err(err) => {
                warn!(error = %err, "Search failed");
                inner.state.error = Some(self.config.not_found_message.clone());
                SearchOutcome::Failed
            }
        }
    }

    /// Search for whatever query is currently stored, as done on startup.
    pub async fn search_current(&self) -> SearchOutcome {
        let query = self.read(|state| state.query.clone());
        self.search(&query).await
    }

    /// Load the detail record for `id` and open it.
    ///
    /// Ignored while a search is in flight, since its results are about to be replaced.
    /// On failure the error message is set and the currently open detail, if any,
    /// stays open. A search issued before the detail arrives discards it.
    #[instrument(name = "Select place", skip(self), level = "info")]
    pub async fn select_place(&self, id: &str) -> SelectOutcome {
        if id.trim().is_empty() {
            return SelectOutcome::Skipped;
        }

        let (generation, search_generation) = {
            let mut inner = self.write();
            if inner.state.loading {
                debug!("Search in flight, ignoring selection");
                return SelectOutcome::Skipped;
            }
            inner.detail_generation += 1;
            (inner.detail_generation, inner.search_generation)
        };

        let result = self.bounded(self.api.get_detail(id)).await;

        let mut inner = self.write();
        if inner.detail_generation != generation
            || inner.search_generation != search_generation
            || inner.state.loading
        {
            debug!(generation, "Discarding superseded detail");
            return SelectOutcome::Superseded;
        }
        match result {
            Ok(detail) => {
                debug!(name = %detail.name, "Detail loaded");
                inner.state.selected_detail = Some(detail);
                inner.state.error = None;
                SelectOutcome::Selected
            }
            Err(err) => {
                warn!(error = %err, "Detail fetch failed");
                inner.state.error = Some(self.config.detail_error_message.clone());
                SelectOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use placefinder_api::{Coordinate, PlaceDetail};
    use tokio::sync::Notify;

    use super::*;
    use crate::config::{DETAIL_ERROR_MESSAGE, LOCATION_NOT_FOUND_MESSAGE};

    #[derive(Default)]
    struct FakeApi {
        locations: HashMap<String, GeoLocation>,
        nearby: HashMap<String, Vec<Place>>,
        details: HashMap<String, PlaceDetail>,
        gates: Mutex<HashMap<String, Arc<Notify>>>,
        offline: bool,
    }

    impl FakeApi {
        fn with_city(mut self, name: &str, lat: f64, lon: f64, places: Vec<Place>) -> Self {
            self.locations.insert(
                name.to_string(),
                GeoLocation {
                    lat,
                    lon,
                    name: name.to_string(),
                    country: "ES".to_string(),
                },
            );
            self.nearby.insert(format!("{lat},{lon}"), places);
            self
        }

        fn with_detail(mut self, id: &str) -> Self {
            self.details.insert(id.to_string(), detail(id));
            self
        }

        /// Calls for `key` block until the returned handle is notified.
        fn gate(&self, key: &str) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.gates
                .lock()
                .unwrap()
                .insert(key.to_string(), gate.clone());
            gate
        }

        async fn pass_gate(&self, key: &str) {
            let gate = self.gates.lock().unwrap().get(key).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }
        }
    }

    impl PlacesApi for FakeApi {
        async fn geocode(&self, name: &str) -> placefinder_api::Result<GeoLocation> {
            self.pass_gate(name).await;
            if self.offline {
                return Err(ApiError::Network("offline".into()));
            }
            self.locations
                .get(name)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(name.to_string()))
        }

        async fn find_nearby(&self, lat: f64, lon: f64) -> placefinder_api::Result<Vec<Place>> {
            Ok(self
                .nearby
                .get(&format!("{lat},{lon}"))
                .cloned()
                .unwrap_or_default())
        }

        async fn get_detail(&self, id: &str) -> placefinder_api::Result<PlaceDetail> {
            self.pass_gate(id).await;
            self.details
                .get(id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(id.to_string()))
        }
    }

    fn place(id: &str, lat: f64, lon: f64) -> Place {
        Place {
            id: id.to_string(),
            name: format!("Place {id}"),
            distance_meters: Some(250.0),
            rating: 3,
            category_tags: "historic_architecture,museums".to_string(),
            coordinate: Some(Coordinate::new(lon, lat)),
        }
    }

    fn detail(id: &str) -> PlaceDetail {
        PlaceDetail {
            id: id.to_string(),
            name: format!("Detail {id}"),
            category_tags: "historic".to_string(),
            rating: 3,
            coordinate: None,
            address: None,
            preview: None,
            wikipedia_extract: None,
            url: None,
        }
    }

    fn alicante_api() -> FakeApi {
        FakeApi::default()
            .with_city(
                "Alicante",
                38.34,
                -0.48,
                vec![
                    place("center", 38.34, -0.48),
                    place("castle", 38.349, -0.478),
                    place("castle-dup", 38.34901, -0.47801),
                    place("museum", 38.345, -0.483),
                ],
            )
            .with_detail("castle")
            .with_detail("museum")
    }

    fn store(api: FakeApi) -> PlacesStore<FakeApi> {
        PlacesStore::new(api, StoreConfig::default())
    }

    #[tokio::test]
    async fn test_search_success() {
        let store = store(alicante_api());

        let outcome = store.search("Alicante").await;
        let state = store.state();

        assert_eq!(outcome, SearchOutcome::Completed { places: 2 });
        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert_eq!(state.location.as_ref().unwrap().name, "Alicante");
        let ids: Vec<_> = state.places.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["castle", "museum"]);
    }

    #[tokio::test]
    async fn test_blank_search_is_noop() {
        let store = store(alicante_api());
        let before = store.state();

        assert_eq!(store.search("").await, SearchOutcome::Skipped);
        assert_eq!(store.search("   ").await, SearchOutcome::Skipped);
        assert_eq!(store.state(), before);
    }

    #[tokio::test]
    async fn test_unknown_location_sets_error() {
        let store = store(alicante_api());

        assert_eq!(store.search("Atlantis").await, SearchOutcome::Failed);
        let state = store.state();
        assert_eq!(state.error.as_deref(), Some(LOCATION_NOT_FOUND_MESSAGE));
        assert!(!state.loading);
        assert!(state.places.is_empty());
        assert_eq!(state.location, None);
    }

    #[tokio::test]
    async fn test_network_failure_uses_same_message() {
        let api = FakeApi {
            offline: true,
            ..alicante_api()
        };
        let store = store(api);

        assert_eq!(store.search("Alicante").await, SearchOutcome::Failed);
        assert_eq!(
            store.state().error.as_deref(),
            Some(LOCATION_NOT_FOUND_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_new_search_clears_previous_results_and_selection() {
        let store = store(alicante_api());
        store.search("Alicante").await;
        store.select_place("castle").await;
        assert!(store.state().selected_detail.is_some());

        store.search("Atlantis").await;
        let state = store.state();
        assert!(state.places.is_empty());
        assert_eq!(state.selected_detail, None);
        assert_eq!(state.query, "Atlantis");
    }

    #[tokio::test]
    async fn test_search_current_uses_default_query() {
        let store = store(alicante_api());
        assert_eq!(store.state().query, "Alicante");

        let outcome = store.search_current().await;
        assert_eq!(outcome, SearchOutcome::Completed { places: 2 });

        store.set_query("  ");
        assert_eq!(store.search_current().await, SearchOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_loading_visible_while_in_flight() {
        let api = alicante_api();
        let gate = api.gate("Alicante");
        let store = store(api);

        let (outcome, observed) = tokio::join!(store.search("Alicante"), async {
            tokio::task::yield_now().await;
            let state = store.state();
            gate.notify_one();
            state
        });

        assert!(observed.loading);
        assert!(observed.places.is_empty());
        assert_eq!(observed.error, None);
        assert!(!observed.can_search());
        assert_eq!(outcome, SearchOutcome::Completed { places: 2 });
        assert!(!store.state().loading);
    }

    #[tokio::test]
    async fn test_later_search_wins_over_slow_earlier_one() {
        let api = alicante_api().with_city("Barcelona", 41.38, 2.17, vec![place("sagrada", 41.4036, 2.1744)]);
        let gate = api.gate("Alicante");
        let store = store(api);

        let (slow, fast) = tokio::join!(store.search("Alicante"), async {
            let outcome = store.search("Barcelona").await;
            gate.notify_one();
            outcome
        });

        assert_eq!(slow, SearchOutcome::Superseded);
        assert_eq!(fast, SearchOutcome::Completed { places: 1 });
        let state = store.state();
        assert_eq!(state.location.unwrap().name, "Barcelona");
        assert_eq!(state.places[0].id, "sagrada");
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let api = alicante_api();
        let _gate = api.gate("Alicante");
        let config = StoreConfig::builder()
            .request_timeout(Duration::from_millis(20))
            .build()
            .unwrap();
        let store = PlacesStore::new(api, config);

        assert_eq!(store.search("Alicante").await, SearchOutcome::Failed);
        let state = store.state();
        assert_eq!(state.error.as_deref(), Some(LOCATION_NOT_FOUND_MESSAGE));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_cancelled_search_releases_loading() {
        let api = alicante_api();
        let _gate = api.gate("Alicante");
        let store = store(api);

        let mut search = Box::pin(store.search("Alicante"));
        let pending = tokio::time::timeout(Duration::from_millis(10), search.as_mut()).await;
        assert!(pending.is_err());
        assert!(store.state().loading);

        drop(search);
        assert!(!store.state().loading);
    }

    #[tokio::test]
    async fn test_select_place() {
        let store = store(alicante_api());
        store.search("Alicante").await;

        assert_eq!(store.select_place("castle").await, SelectOutcome::Selected);
        let state = store.state();
        assert_eq!(state.selected_id(), Some("castle"));
        assert!(state.place("castle").is_some());
    }

    #[tokio::test]
    async fn test_failed_select_keeps_previous_detail() {
        let store = store(alicante_api());
        store.search("Alicante").await;
        store.select_place("castle").await;

        assert_eq!(store.select_place("zzz").await, SelectOutcome::Failed);
        let state = store.state();
        assert_eq!(state.error.as_deref(), Some(DETAIL_ERROR_MESSAGE));
        assert_eq!(state.selected_id(), Some("castle"));
    }

    #[tokio::test]
    async fn test_successful_select_clears_detail_error() {
        let store = store(alicante_api());
        store.search("Alicante").await;
        store.select_place("zzz").await;
        assert!(store.state().error.is_some());

        store.select_place("museum").await;
        assert_eq!(store.state().error, None);
    }

    #[tokio::test]
    async fn test_later_selection_wins() {
        let api = alicante_api();
        let gate = api.gate("castle");
        let store = store(api);
        store.search("Alicante").await;

        let (slow, fast) = tokio::join!(store.select_place("castle"), async {
            let outcome = store.select_place("museum").await;
            gate.notify_one();
            outcome
        });

        assert_eq!(slow, SelectOutcome::Superseded);
        assert_eq!(fast, SelectOutcome::Selected);
        assert_eq!(store.state().selected_id(), Some("museum"));
    }

    #[tokio::test]
    async fn test_clear_selection() {
        let store = store(alicante_api());
        store.search("Alicante").await;
        store.select_place("castle").await;

        store.clear_selection();
        assert_eq!(store.state().selected_detail, None);

        // Total even with nothing selected
        store.clear_selection();
        assert_eq!(store.state().selected_detail, None);
    }

    #[tokio::test]
    async fn test_clear_selection_discards_detail_in_flight() {
        let api = alicante_api();
        let gate = api.gate("castle");
        let store = store(api);
        store.search("Alicante").await;

        let (outcome, ()) = tokio::join!(store.select_place("castle"), async {
            store.clear_selection();
            gate.notify_one();
        });

        assert_eq!(outcome, SelectOutcome::Superseded);
        assert_eq!(store.state().selected_detail, None);
    }

    #[tokio::test]
    async fn test_blank_select_is_skipped() {
        let store = store(alicante_api());
        assert_eq!(store.select_place(" ").await, SelectOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_select_during_search_is_skipped() {
        // "castle" resolves, "zzz" fails; neither may touch the state mid-search
        for id in ["castle", "zzz"] {
            let api = alicante_api();
            let gate = api.gate("Alicante");
            let store = store(api);

            let (searched, (selected, observed)) = tokio::join!(store.search("Alicante"), async {
                tokio::task::yield_now().await;
                let outcome = store.select_place(id).await;
                let state = store.state();
                gate.notify_one();
                (outcome, state)
            });

            assert_eq!(selected, SelectOutcome::Skipped, "{id}");
            assert!(observed.loading);
            assert_eq!(observed.error, None);
            assert_eq!(observed.selected_detail, None);

            assert_eq!(searched, SearchOutcome::Completed { places: 2 });
            let state = store.state();
            assert_eq!(state.error, None, "{id}");
            assert_eq!(state.selected_detail, None, "{id}");
        }
    }

    #[tokio::test]
    async fn test_search_discards_detail_in_flight() {
        let api = alicante_api().with_detail("sagrada").with_city(
            "Barcelona",
            41.38,
            2.17,
            vec![place("sagrada", 41.4036, 2.1744)],
        );
        let gate = api.gate("castle");
        let store = store(api);
        store.search("Alicante").await;

        let (selected, searched) = tokio::join!(store.select_place("castle"), async {
            let outcome = store.search("Barcelona").await;
            gate.notify_one();
            outcome
        });

        assert_eq!(selected, SelectOutcome::Superseded);
        assert_eq!(searched, SearchOutcome::Completed { places: 1 });
        let state = store.state();
        assert_eq!(state.selected_detail, None);
        assert_eq!(state.error, None);
        assert_eq!(state.places[0].id, "sagrada");
    }
}
