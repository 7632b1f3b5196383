//! Map widget abstraction and marker reconciliation.
//!
//! The map itself is an external collaborator. This module only depends on the shape
//! described by [`MapProvider`], [`MapWidget`] and [`MarkerHandle`]; any concrete
//! renderer (a browser widget binding, a terminal renderer, a test double) plugs in
//! behind those traits.
//!
//! [`MapView`] owns the widget and an arena of marker handles. Every call to
//! [`MapView::set_markers`] disposes of all existing markers before creating the new
//! set, and the view releases markers and widget when unmounted or dropped.
use std::{fmt, sync::Arc, time::Duration};

use placefinder_api::{Coordinate, Place};
use tracing::{debug, instrument};

use crate::format::{display_name, escape_html, primary_category};

pub use error::MapError;

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum MapError {
        #[error("Invalid map options: {0}")]
        InvalidOptions(String),
        #[error("Failed to create map: {0}")]
        Create(String),
    }
}

pub const DEFAULT_STYLE: &str = "mapbox://styles/mapbox/streets-v12";
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(4.9, 52.37);
pub const DEFAULT_ZOOM: f64 = 11.0;
pub const FLY_TO_ZOOM: f64 = 15.0;
pub const FLY_TO_DURATION: Duration = Duration::from_millis(1500);
pub const POPUP_OFFSET: u32 = 25;
const MAX_ZOOM: f64 = 22.0;

/// Construction options for the underlying widget.
#[derive(Clone)]
pub struct MapOptions {
    pub style: String,
    pub center: Coordinate,
    pub zoom: f64,
    /// Map provider access token
    pub access_token: Option<String>,
}

impl fmt::Debug for MapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapOptions")
            .field("style", &self.style)
            .field("center", &self.center)
            .field("zoom", &self.zoom)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            style: DEFAULT_STYLE.to_string(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            access_token: None,
        }
    }
}

impl MapOptions {
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn validate(&self) -> Result<(), MapError> {
        if !(0.0..=MAX_ZOOM).contains(&self.zoom) {
            return Err(MapError::InvalidOptions(format!(
                "zoom {} outside 0..={MAX_ZOOM}",
                self.zoom
            )));
        }
        if !self.center.lat.is_finite()
            || !self.center.lon.is_finite()
            || !(-90.0..=90.0).contains(&self.center.lat)
            || !(-180.0..=180.0).contains(&self.center.lon)
        {
            return Err(MapError::InvalidOptions(format!(
                "center {} is not a valid position",
                self.center
            )));
        }
        Ok(())
    }
}

/// Camera animation requested by [`MapView::fly_to`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyToOptions {
    pub center: Coordinate,
    pub zoom: f64,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapControl {
    Navigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ControlPosition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }
}

/// Popup attached to a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupSpec {
    pub offset: u32,
    pub close_button: bool,
    pub html: String,
}

/// Callback invoked with the identifier of the clicked place.
pub type SelectCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Click handler bound to one marker.
#[derive(Clone)]
pub struct MarkerClick {
    place_id: String,
    callback: SelectCallback,
}

impl MarkerClick {
    #[must_use]
    pub fn place_id(&self) -> &str {
        &self.place_id
    }

    /// Called by the widget when the marker is clicked.
    pub fn fire(&self) {
        (self.callback)(&self.place_id);
    }
}

impl fmt::Debug for MarkerClick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerClick")
            .field("place_id", &self.place_id)
            .finish_non_exhaustive()
    }
}

/// Everything the widget needs to place one marker.
#[derive(Debug, Clone)]
pub struct MarkerSpec {
    pub position: Coordinate,
    pub popup: PopupSpec,
    pub on_click: MarkerClick,
}

/// Native marker resource. Must be released explicitly through [`MarkerHandle::remove`].
pub trait MarkerHandle {
    fn remove(self);
}

/// A constructed map.
pub trait MapWidget {
    type Marker: MarkerHandle;

    fn add_control(&mut self, control: MapControl, position: ControlPosition);

    fn fly_to(&mut self, options: &FlyToOptions);

    fn add_marker(&mut self, spec: MarkerSpec) -> Self::Marker;

    /// Tear the map down, releasing its native resources.
    fn remove(self);
}

/// Constructs widgets inside a host container.
pub trait MapProvider {
    /// Handle to whatever the map is rendered into
    type Container;
    type Widget: MapWidget;

    fn create(
        &self,
        container: Self::Container,
        options: &MapOptions,
    ) -> Result<Self::Widget, MapError>;
}

type MarkerOf<P> = <<P as MapProvider>::Widget as MapWidget>::Marker;

/// Popup markup for a place: name (or a placeholder) and its primary category.
#[must_use]
pub fn popup_html(place: &Place) -> String {
    format!(
        "<strong>{}</strong><br/><span>{}</span>",
        escape_html(display_name(&place.name)),
        escape_html(&primary_category(&place.category_tags)),
    )
}

/// Owns the map widget and keeps its markers in sync with the result list.
pub struct MapView<P: MapProvider> {
    provider: P,
    options: MapOptions,
    widget: Option<P::Widget>,
    markers: Vec<MarkerOf<P>>,
}

impl<P: MapProvider> MapView<P> {
    pub fn new(provider: P, options: MapOptions) -> Self {
        Self {
            provider,
            options,
            widget: None,
            markers: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.widget.is_some()
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Create the widget once the host container is available and attach navigation
    /// controls. Does nothing without a container or when already mounted.
    #[instrument(name = "Mount map", skip_all, level = "debug")]
    pub fn mount(&mut self, container: Option<P::Container>) -> Result<(), MapError> {
        if self.widget.is_some() {
            debug!("Map already mounted");
            return Ok(());
        }
        let Some(container) = container else {
            debug!("No container to mount into");
            return Ok(());
        };
        self.options.validate()?;

        let mut widget = self.provider.create(container, &self.options)?;
        widget.add_control(MapControl::Navigation, ControlPosition::TopRight);
        self.widget = Some(widget);
        debug!(style = %self.options.style, "Map mounted");
        Ok(())
    }

    /// Pan and zoom to `(lon, lat)`. No-op while unmounted.
    pub fn fly_to(&mut self, lon: f64, lat: f64) {
        let Some(widget) = self.widget.as_mut() else {
            return;
        };
        widget.fly_to(&FlyToOptions {
            center: Coordinate::new(lon, lat),
            zoom: FLY_TO_ZOOM,
            duration: FLY_TO_DURATION,
        });
    }

    fn dispose_markers(&mut self) {
        for marker in self.markers.drain(..) {
            marker.remove();
        }
    }

    /// Replace every marker with one per place that has a usable coordinate.
    ///
    /// Existing markers are removed first, unconditionally. Clicking a marker calls
    /// `on_select` with its place id. Returns the number of markers created, which is
    /// zero while unmounted.
    #[instrument(name = "Reconcile markers", skip_all, fields(places = places.len()), level = "debug")]
    pub fn set_markers(&mut self, places: &[Place], on_select: &SelectCallback) -> usize {
        self.dispose_markers();
        let Some(widget) = self.widget.as_mut() else {
            return 0;
        };

        for place in places {
            let Some(position) = place.coordinate.filter(Coordinate::is_valid) else {
                continue;
            };
            let spec = MarkerSpec {
                position,
                popup: PopupSpec {
                    offset: POPUP_OFFSET,
                    close_button: false,
                    html: popup_html(place),
                },
                on_click: MarkerClick {
                    place_id: place.id.clone(),
                    callback: Arc::clone(on_select),
                },
            };
            self.markers.push(widget.add_marker(spec));
        }
        debug!(markers = self.markers.len(), "Markers reconciled");
        self.markers.len()
    }

    /// Release all markers and the widget. The view can be mounted again afterwards.
    pub fn unmount(&mut self) {
        self.dispose_markers();
        if let Some(widget) = self.widget.take() {
            widget.remove();
            debug!("Map removed");
        }
    }
}

impl<P: MapProvider> Drop for MapView<P> {
    fn drop(&mut self) {
        self.unmount();
    }
}
