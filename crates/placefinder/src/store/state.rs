use placefinder_api::{GeoLocation, Place, PlaceDetail};

/// Everything the presentation layer renders.
///
/// Only [`PlacesStore`](super::PlacesStore) writes to it; readers get snapshots via
/// [`PlacesStore::state`](super::PlacesStore::state) or borrow through
/// [`PlacesStore::read`](super::PlacesStore::read).
///
/// Invariants maintained by the store:
/// - while `loading`, `places` is empty and `error` is `None`;
/// - `places` holds no two entries on the same ~10 m spot and none on the searched
///   center itself;
/// - `selected_detail` belongs to the current result set or is `None`.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    /// Text bound to the search input
    pub query: String,
    /// Geocoded center of the last successful search
    pub location: Option<GeoLocation>,
    /// Filtered results of the last successful search, in provider order
    pub places: Vec<Place>,
    /// Detail of the place the user opened
    pub selected_detail: Option<PlaceDetail>,
    pub loading: bool,
    /// User-facing message for the last failed action
    pub error: Option<String>,
}

impl SearchState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            location: None,
            places: Vec::new(),
            selected_detail: None,
            loading: false,
            error: None,
        }
    }

    #[must_use]
    pub fn total_places(&self) -> usize {
        self.places.len()
    }

    /// Whether a search may be started: nothing in flight and a non-blank query.
    #[must_use]
    pub fn can_search(&self) -> bool {
        !self.loading && !self.query.trim().is_empty()
    }

    /// Identifier of the opened place, used to highlight it in the list.
    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_detail.as_ref().map(|detail| detail.id.as_str())
    }

    #[must_use]
    pub fn place(&self, id: &str) -> Option<&Place> {
        self.places.iter().find(|place| place.id == id)
    }
}
