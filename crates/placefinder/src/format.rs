//! Text shown for places in lists, popups and the detail view.
use itertools::Itertools;
use placefinder_api::Address;

use crate::store::SearchState;

pub const UNNAMED_PLACE: &str = "Unnamed place";
pub const GENERIC_CATEGORY: &str = "Point of interest";
pub const MAX_CATEGORY_BADGES: usize = 3;

/// The place name, or [`UNNAMED_PLACE`] when blank.
#[must_use]
pub fn display_name(name: &str) -> &str {
    let name = name.trim();
    if name.is_empty() { UNNAMED_PLACE } else { name }
}

/// Provider tags use underscores between words (`historic_architecture`).
fn humanize(tag: &str) -> String {
    tag.trim().replace('_', " ")
}

/// First category tag in readable form; empty when there are no tags.
#[must_use]
pub fn primary_category(tags: &str) -> String {
    tags.split(',')
        .map(str::trim)
        .find(|tag| !tag.is_empty())
        .map(humanize)
        .unwrap_or_default()
}

/// [`primary_category`] with [`GENERIC_CATEGORY`] as fallback, as shown on list cards.
#[must_use]
pub fn card_category(tags: &str) -> String {
    let category = primary_category(tags);
    if category.is_empty() {
        GENERIC_CATEGORY.to_string()
    } else {
        category
    }
}

/// Up to [`MAX_CATEGORY_BADGES`] readable tags for the detail view.
#[must_use]
pub fn category_badges(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .take(MAX_CATEGORY_BADGES)
        .map(humanize)
        .collect()
}

/// `"450 m"` below one kilometer, `"2.5 km"` from there on, `""` when unknown.
#[must_use]
pub fn format_distance(meters: Option<f64>) -> String {
    match meters {
        Some(m) if m.is_finite() && m >= 1000.0 => format!("{:.1} km", m / 1000.0),
        Some(m) if m.is_finite() => format!("{} m", m.round()),
        _ => String::new(),
    }
}

/// Single-line postal address: street and number, postcode and city, country.
///
/// Returns `None` when every part is blank.
#[must_use]
pub fn format_address(address: &Address) -> Option<String> {
    let part = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    };
    let street = [part(address.road.as_deref()), part(address.house_number.as_deref())]
        .into_iter()
        .flatten()
        .join(" ");
    let locality = [part(address.postcode.as_deref()), part(address.city.as_deref())]
        .into_iter()
        .flatten()
        .join(" ");

    let line = [Some(street), Some(locality), part(address.country.as_deref())]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .join(", ");
    (!line.is_empty()).then_some(line)
}

/// `"12 places near Alicante"`, shown once a search has resolved a location.
#[must_use]
pub fn results_summary(state: &SearchState) -> Option<String> {
    if state.loading {
        return None;
    }
    state.location.as_ref().map(|location| {
        let noun = if state.total_places() == 1 { "place" } else { "places" };
        format!("{} {noun} near {}", state.total_places(), location.name)
    })
}

/// Escape text for inclusion in popup HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
