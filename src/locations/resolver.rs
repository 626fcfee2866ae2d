//! Exact-match location resolution with abbreviation expansion, plus the
//! substring search powering the interactive location picker. Resolution
//! never does fuzzy matching; every lookup is an exact normalized key.

use tracing::debug;

use crate::locations::index::{normalize_key, Coordinate, LocationIndex};

/// Two-letter USPS abbreviations, all 50 states plus DC.
const STATE_ABBREVIATIONS: [(&str, &str); 51] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// City-name abbreviation expansions. Currently just the Saint variants.
const CITY_ABBREVIATIONS: [(&str, &str); 2] = [("St. ", "Saint "), ("St ", "Saint ")];

fn expand_state(state: &str) -> Option<&'static str> {
    let trimmed = state.trim();
    if trimmed.len() != 2 {
        return None;
    }
    STATE_ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(trimmed))
        .map(|(_, full)| *full)
}

fn expand_city(city: &str) -> String {
    let trimmed = city.trim();
    for (abbr, full) in CITY_ABBREVIATIONS {
        if let Some(rest) = trimmed.strip_prefix(abbr) {
            return format!("{full}{rest}");
        }
    }
    trimmed.to_string()
}

/// Split "City, State" at the last comma. No comma means no state part.
fn split_location(key: &str) -> (String, Option<String>) {
    match key.rsplit_once(',') {
        Some((city, state)) => (city.trim().to_string(), Some(state.trim().to_string())),
        None => (key.trim().to_string(), None),
    }
}

/// Resolve a "City, State" label to a coordinate via exact lookups, tried in
/// order: fully expanded (state + city abbreviations), state-expanded only,
/// the raw string, then the bare city name when it is not ambiguous. A miss
/// returns None and is logged, never an error.
pub fn resolve(index: &LocationIndex, location_key: &str) -> Option<Coordinate> {
    let raw = location_key.trim();
    if raw.is_empty() {
        return None;
    }
    let (city, state) = split_location(raw);

    if let Some(state) = &state {
        if let Some(full_state) = expand_state(state) {
            let expanded = format!("{}, {}", expand_city(&city), full_state);
            if let Some(coordinate) = index.get(&expanded) {
                return Some(coordinate);
            }
            let state_only = format!("{city}, {full_state}");
            if let Some(coordinate) = index.get(&state_only) {
                return Some(coordinate);
            }
        }
    }

    if let Some(coordinate) = index.get(raw) {
        return Some(coordinate);
    }

    if !index.is_ambiguous_city(&city) {
        if let Some(coordinate) = index.get(&city) {
            return Some(coordinate);
        }
    }

    debug!(location = raw, "no coordinate match");
    None
}

/// One interactive search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationMatch {
    pub key: String,
    pub coordinate: Coordinate,
}

const FUZZY_RESULT_CAP: usize = 8;

/// Case-insensitive substring search over "City, State" keys only, for the
/// interactive picker (never used for resolution). Prefix matches rank ahead
/// of containment matches; shorter keys break ties.
pub fn fuzzy_search(index: &LocationIndex, term: &str) -> Vec<LocationMatch> {
    let needle = normalize_key(term);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<(&String, bool)> = index
        .display_keys()
        .iter()
        .filter(|key| key.contains(','))
        .filter_map(|key| {
            let normalized = normalize_key(key);
            if normalized.contains(&needle) {
                Some((key, normalized.starts_with(&needle)))
            } else {
                None
            }
        })
        .collect();

    hits.sort_by(|(a_key, a_prefix), (b_key, b_prefix)| {
        b_prefix
            .cmp(a_prefix)
            .then(a_key.len().cmp(&b_key.len()))
            .then(a_key.cmp(b_key))
    });

    hits.into_iter()
        .take(FUZZY_RESULT_CAP)
        .filter_map(|(key, _)| {
            index.get(key).map(|coordinate| LocationMatch {
                key: key.clone(),
                coordinate,
            })
        })
        .collect()
}
