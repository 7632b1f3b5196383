//! Search a place name and print what is around it.
//!
//! ```sh
//! RAPIDAPI_KEY=... MAPBOX_TOKEN=... cargo run --example explore -- "Valencia"
//! ```
use std::sync::{Arc, Mutex};

use anyhow::Result;
use placefinder::{
    ClientConfig, MapError, MapOptions, MapProvider, MapView, MapWidget, MarkerHandle,
    OpenTripMapClient, PlacesStore, SearchOutcome, Secrets, SelectCallback, StoreConfig,
    format::{card_category, category_badges, display_name, format_address, format_distance, results_summary},
    map::{ControlPosition, FlyToOptions, MapControl, MarkerClick, MarkerSpec},
};
use tokio::sync::mpsc;
use tracing::{Level, debug, info};

/// Stands in for a real map by logging what would be drawn.
struct ConsoleMap {
    clicks: Arc<Mutex<Vec<MarkerClick>>>,
}

struct ConsoleWidget {
    clicks: Arc<Mutex<Vec<MarkerClick>>>,
}

struct ConsoleMarker(String);

impl MarkerHandle for ConsoleMarker {
    fn remove(self) {
        debug!(place_id = %self.0, "Marker removed");
    }
}

impl MapWidget for ConsoleWidget {
    type Marker = ConsoleMarker;

    fn add_control(&mut self, control: MapControl, position: ControlPosition) {
        debug!(?control, position = position.as_str(), "Control added");
    }

    fn fly_to(&mut self, options: &FlyToOptions) {
        info!(center = %options.center, zoom = options.zoom, "Flying to");
    }

    fn add_marker(&mut self, spec: MarkerSpec) -> ConsoleMarker {
        let id = spec.on_click.place_id().to_string();
        debug!(place_id = %id, position = %spec.position, "Marker added");
        self.clicks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(spec.on_click);
        ConsoleMarker(id)
    }

    fn remove(self) {
        debug!("Map removed");
    }
}

impl MapProvider for ConsoleMap {
    type Container = ();
    type Widget = ConsoleWidget;

    fn create(&self, (): (), options: &MapOptions) -> Result<ConsoleWidget, MapError> {
        if options.access_token.is_none() {
            return Err(MapError::Create("missing access token".to_string()));
        }
        info!(?options, "Map created");
        Ok(ConsoleWidget {
            clicks: Arc::clone(&self.clicks),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    placefinder::init_logging(Level::INFO)?;

    let secrets = Secrets::from_env()?;
    let client = OpenTripMapClient::new(ClientConfig::builder(secrets.api_key.clone()).build()?)?;
    let store = PlacesStore::new(client, StoreConfig::default());

    let clicks = Arc::new(Mutex::new(Vec::new()));
    let mut map = MapView::new(
        ConsoleMap {
            clicks: Arc::clone(&clicks),
        },
        MapOptions::default().with_access_token(secrets.map_token),
    );
    map.mount(Some(()))?;

    if let Some(query) = std::env::args().nth(1) {
        store.set_query(query);
    }

    match store.search_current().await {
        SearchOutcome::Completed { .. } => {}
        outcome => {
            let error = store.read(|state| state.error.clone()).unwrap_or_default();
            info!(?outcome, %error, "No results");
            return Ok(());
        }
    }

    let state = store.state();
    if let Some(summary) = results_summary(&state) {
        println!("{summary}");
    }
    for place in &state.places {
        println!(
            "  {:<40} {:<28} {:>8}  {}",
            display_name(&place.name),
            card_category(&place.category_tags),
            format_distance(place.distance_meters),
            "★".repeat(usize::try_from(place.rating.clamp(0, 7)).unwrap_or_default()),
        );
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let on_select: SelectCallback = Arc::new(move |id: &str| {
        let _ = tx.send(id.to_string());
    });
    map.set_markers(&state.places, &on_select);

    // Simulate a click on the first marker.
    let first = clicks
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .first()
        .cloned();
    if let Some(click) = first {
        click.fire();
    }
    drop(on_select);

    if let Some(id) = rx.recv().await {
        store.select_place(&id).await;
        if let Some(detail) = store.state().selected_detail {
            if let Some(coordinate) = detail.coordinate {
                map.fly_to(coordinate.lon, coordinate.lat);
            }
            println!("\n{}", display_name(&detail.name));
            println!("  {}", category_badges(&detail.category_tags).join(" | "));
            if let Some(address) = detail.address.as_ref().and_then(format_address) {
                println!("  {address}");
            }
            if let Some(extract) = &detail.wikipedia_extract {
                println!("  {extract}");
            }
        }
    }

    map.unmount();
    Ok(())
}
