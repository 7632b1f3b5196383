//! Cleanup of raw radius-search results.
//!
//! The provider happily returns the searched city itself, entries without a position,
//! and several entries stacked on the same spot. None of those are useful points of
//! interest, so [`filter_places`] drops them in a single forward pass.
use ahash::AHashSet;
use placefinder_api::{Coordinate, GeoLocation, Place};

/// Two coordinates closer than this on both axes are the same spot (~11 m).
pub const CENTER_TOLERANCE: f64 = 1e-4;

/// Decimal places kept when bucketing positions for deduplication (~10 m).
pub const DEDUP_DECIMALS: i32 = 4;

/// Position bucket used to detect stacked entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PositionKey {
    lat: i64,
    lon: i64,
}

impl PositionKey {
    fn of(coordinate: Coordinate) -> Self {
        let scale = 10f64.powi(DEDUP_DECIMALS);
        Self {
            lat: (coordinate.lat * scale).round() as i64,
            lon: (coordinate.lon * scale).round() as i64,
        }
    }
}

fn is_center(coordinate: Coordinate, center: &GeoLocation) -> bool {
    (coordinate.lat - center.lat).abs() < CENTER_TOLERANCE
        && (coordinate.lon - center.lon).abs() < CENTER_TOLERANCE
}

/// Drop invalid, center-coincident and duplicate-position places, preserving order.
///
/// Applied per candidate in input order:
/// 1. drop when the coordinate is absent or either component is the `0.0` sentinel;
/// 2. drop when it lies within [`CENTER_TOLERANCE`] of `center` on both axes;
/// 3. drop when its position rounded to [`DEDUP_DECIMALS`] places was already kept.
///
/// The result is a subset of `raw` and filtering it again returns it unchanged.
pub fn filter_places(raw: Vec<Place>, center: &GeoLocation) -> Vec<Place> {
    let mut seen = AHashSet::with_capacity(raw.len());
    raw.into_iter()
        .filter(|place| {
            let Some(coordinate) = place.coordinate.filter(Coordinate::is_valid) else {
                return false;
            };
            if is_center(coordinate, center) {
                return false;
            }
            seen.insert(PositionKey::of(coordinate))
        })
        .collect()
}
