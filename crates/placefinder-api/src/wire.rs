//! Raw payload shapes returned by the provider and their validation into the typed
//! model. Nothing from here escapes the crate unvalidated.
use serde::Deserialize;
use tracing::warn;

use crate::{
    ApiError, Result,
    models::{Address, Coordinate, GeoLocation, Place, PlaceDetail, Preview},
};

#[derive(Debug, Deserialize)]
pub(crate) struct RawPoint {
    lon: f64,
    lat: f64,
}

impl RawPoint {
    fn validate(self) -> Result<Coordinate> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lon) {
            return Err(ApiError::InvalidResponse(format!(
                "coordinate out of range: lat {}, lon {}",
                self.lat, self.lon
            )));
        }
        Ok(Coordinate::new(self.lon, self.lat))
    }
}

/// The provider reports ratings as integers in list responses and as strings such as
/// `"3h"` (rating plus heritage flag) in detail responses.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawRating {
    Number(f64),
    Text(String),
}

impl RawRating {
    fn value(&self) -> i32 {
        match self {
            Self::Number(n) => n.round() as i32,
            Self::Text(s) => {
                let digits: String = s.chars().take_while(char::is_ascii_digit).collect();
                digits.parse().unwrap_or(0)
            }
        }
    }
}

fn rating(raw: Option<&RawRating>) -> i32 {
    raw.map_or(0, RawRating::value)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGeoname {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl RawGeoname {
    /// A missing or zero coordinate is how the provider signals an unknown name.
    pub(crate) fn into_location(self, query: &str) -> Result<GeoLocation> {
        let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
            return Err(ApiError::NotFound(query.to_string()));
        };
        let location = GeoLocation {
            lat,
            lon,
            name: non_blank(self.name).unwrap_or_else(|| query.trim().to_string()),
            country: self.country.unwrap_or_default(),
        };
        if !location.is_valid() {
            return Err(ApiError::NotFound(query.to_string()));
        }
        RawPoint { lon, lat }.validate()?;
        Ok(location)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPlace {
    #[serde(default)]
    xid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    dist: Option<f64>,
    #[serde(default)]
    rate: Option<RawRating>,
    #[serde(default)]
    kinds: String,
    #[serde(default)]
    point: Option<RawPoint>,
}

impl TryFrom<RawPlace> for Place {
    type Error = ApiError;

    fn try_from(raw: RawPlace) -> Result<Self> {
        if raw.xid.trim().is_empty() {
            return Err(ApiError::InvalidResponse(format!(
                "place '{}' has no identifier",
                raw.name
            )));
        }
        Ok(Self {
            rating: rating(raw.rate.as_ref()),
            coordinate: raw.point.map(RawPoint::validate).transpose()?,
            id: raw.xid,
            name: raw.name,
            distance_meters: raw.dist,
            category_tags: raw.kinds,
        })
    }
}

/// Validate a radius response entry by entry. Unusable entries are logged and dropped
/// so one bad record does not cost the whole result list.
pub(crate) fn places_from_raw(raw: Vec<RawPlace>) -> Vec<Place> {
    raw.into_iter()
        .filter_map(|entry| {
            Place::try_from(entry)
                .inspect_err(|err| warn!(error = %err, "Skipping unusable place"))
                .ok()
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAddress {
    city: Option<String>,
    road: Option<String>,
    house_number: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPreview {
    source: String,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    width: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawExtract {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPlaceDetail {
    #[serde(default)]
    xid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    kinds: String,
    #[serde(default)]
    rate: Option<RawRating>,
    #[serde(default)]
    point: Option<RawPoint>,
    #[serde(default)]
    address: Option<RawAddress>,
    #[serde(default)]
    preview: Option<RawPreview>,
    #[serde(default)]
    wikipedia_extracts: Option<RawExtract>,
    #[serde(default)]
    url: Option<String>,
}

impl RawPlaceDetail {
    /// An empty identifier means the provider did not recognise `requested`; a
    /// different identifier means the payload belongs to another place.
    pub(crate) fn into_detail(self, requested: &str) -> Result<PlaceDetail> {
        if self.xid.trim().is_empty() {
            return Err(ApiError::NotFound(requested.to_string()));
        }
        if self.xid != requested {
            return Err(ApiError::InvalidResponse(format!(
                "requested place '{requested}' but received '{}'",
                self.xid
            )));
        }

        let address = self
            .address
            .map(|a| Address {
                city: non_blank(a.city),
                road: non_blank(a.road),
                house_number: non_blank(a.house_number),
                postcode: non_blank(a.postcode),
                country: non_blank(a.country),
            })
            .filter(|a| !a.is_empty());
        let preview = self
            .preview
            .filter(|p| !p.source.trim().is_empty())
            .map(|p| Preview {
                source: p.source,
                height: p.height,
                width: p.width,
            });

        Ok(PlaceDetail {
            rating: rating(self.rate.as_ref()),
            coordinate: self.point.map(RawPoint::validate).transpose()?,
            id: self.xid,
            name: self.name,
            category_tags: self.kinds,
            address,
            preview,
            wikipedia_extract: self.wikipedia_extracts.and_then(|e| non_blank(e.text)),
            url: non_blank(self.url),
        })
    }
}
