//! Typed data model shared by the client and the search store.
//!
//! Values in this module have already passed boundary validation; the raw payload
//! shapes live in the private `wire` module.
use std::fmt;

use serde::Serialize;

/// A WGS84 position, longitude first as the map widget expects it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// A coordinate is usable when both components are finite and neither is the
    /// `0.0` "not found" sentinel the provider returns.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && self.lat != 0.0 && self.lon != 0.0
    }

    /// Longitude/latitude pair in the order map widgets take it.
    #[must_use]
    pub const fn lng_lat(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

/// Result of geocoding a free-text location name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    /// ISO country code as reported by the provider
    pub country: String,
}

impl GeoLocation {
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lon, self.lat)
    }

    /// `false` for the zero sentinel the provider uses for unknown names.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.coordinate().is_valid()
    }
}

impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.country.is_empty() {
            write!(f, "{} {}", self.name, self.coordinate())
        } else {
            write!(f, "{}, {} {}", self.name, self.country, self.coordinate())
        }
    }
}

/// Summary of a point of interest as returned by a radius search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    /// Provider identifier (`xid`)
    pub id: String,
    pub name: String,
    /// Distance from the search center; absent when the provider omitted it
    pub distance_meters: Option<f64>,
    /// Popularity rating, 0 when unrated
    pub rating: i32,
    /// Comma-separated provider categories, most specific first
    pub category_tags: String,
    /// Absent when the provider returned no `point`
    pub coordinate: Option<Coordinate>,
}

impl Place {
    /// Category tags split on commas with blanks removed.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        split_tags(&self.category_tags)
    }
}

/// Postal address attached to a place detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    pub city: Option<String>,
    pub road: Option<String>,
    pub house_number: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

impl Address {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            &self.city,
            &self.road,
            &self.house_number,
            &self.postcode,
            &self.country,
        ]
        .iter()
        .all(|part| part.as_deref().is_none_or(|s| s.trim().is_empty()))
    }
}

/// Thumbnail descriptor for a place detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub source: String,
    pub height: u32,
    pub width: u32,
}

/// Extended information about one point of interest, fetched lazily by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceDetail {
    pub id: String,
    pub name: String,
    pub category_tags: String,
    pub rating: i32,
    pub coordinate: Option<Coordinate>,
    pub address: Option<Address>,
    pub preview: Option<Preview>,
    pub wikipedia_extract: Option<String>,
    pub url: Option<String>,
}

impl PlaceDetail {
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        split_tags(&self.category_tags)
    }
}

fn split_tags(tags: &str) -> impl Iterator<Item = &str> {
    tags.split(',').map(str::trim).filter(|tag| !tag.is_empty())
}
