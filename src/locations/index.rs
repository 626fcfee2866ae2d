//! Location index: normalized "City, State" (and bare city) keys mapped to
//! coordinates, built once at startup from the bundled dataset and read-only
//! afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Bundled table of (countryCode, state, name, lat, lng) rows, tab-separated.
const BUNDLED_CITIES_TSV: &str = include_str!("../../data/us_cities.tsv");

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct CityRow {
    country: String,
    state: String,
    name: String,
    lat: f64,
    lng: f64,
}

/// Keys are stored lowercased for lookup; the display form is kept for
/// interactive search results.
#[derive(Debug, Clone, Default)]
pub struct LocationIndex {
    entries: HashMap<String, Coordinate>,
    display_keys: Vec<String>,
}

pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

impl LocationIndex {
    /// Build from the dataset shipped in the binary. Malformed rows are
    /// skipped, never fatal.
    pub fn bundled() -> Self {
        Self::from_tsv(BUNDLED_CITIES_TSV)
    }

    /// Only US rows with a state produce a "City, State" key. Every row also
    /// produces a bare-city key; later rows overwrite earlier ones sharing a
    /// bare name, which is the one source of ambiguity the resolver guards
    /// against.
    pub fn from_tsv(text: &str) -> Self {
        let mut index = LocationIndex::default();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(text.as_bytes());

        for (line, result) in reader.deserialize::<CityRow>().enumerate() {
            let row = match result {
                Ok(row) => row,
                Err(err) => {
                    warn!(line = line + 2, %err, "skipping malformed city row");
                    continue;
                }
            };
            let coordinate = Coordinate {
                lat: row.lat,
                lng: row.lng,
            };
            if row.country == "US" && !row.state.trim().is_empty() {
                index.insert(&format!("{}, {}", row.name.trim(), row.state.trim()), coordinate);
            }
            index.insert(row.name.trim(), coordinate);
        }

        index.display_keys.sort();
        index.display_keys.dedup();
        index
    }

    fn insert(&mut self, key: &str, coordinate: Coordinate) {
        let normalized = normalize_key(key);
        if self.entries.insert(normalized, coordinate).is_none() {
            self.display_keys.push(key.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<Coordinate> {
        self.entries.get(&normalize_key(key)).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize_key(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted display-cased keys, for interactive search.
    pub fn display_keys(&self) -> &[String] {
        &self.display_keys
    }

    /// True when any "City, <something>" key other than the bare name exists
    /// for this city. Known heuristic: this also counts same-named cities
    /// from rows without a usable state.
    pub fn is_ambiguous_city(&self, city: &str) -> bool {
        let prefix = format!("{},", normalize_key(city));
        self.entries.keys().any(|key| key.starts_with(&prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "country\tstate\tname\tlat\tlng\n\
US\tTexas\tParis\t33.6609\t-95.5555\n\
US\tMissouri\tSaint Louis\t38.6270\t-90.1994\n\
US\tIdaho\tBoise\t43.6150\t-116.2023\n\
FR\t\tParis\t48.8566\t2.3522\n";

    #[test]
    fn us_rows_with_state_get_city_state_keys() {
        let index = LocationIndex::from_tsv(SAMPLE);
        assert!(index.contains("Paris, Texas"));
        assert!(index.contains("saint louis, missouri"));
        assert!(!index.contains("Paris, FR"));
    }

    #[test]
    fn later_bare_city_rows_overwrite_earlier_ones() {
        let index = LocationIndex::from_tsv(SAMPLE);
        let bare = index.get("Paris").unwrap();
        // The FR row came last, so the bare "Paris" entry is French.
        assert!((bare.lat - 48.8566).abs() < 1e-9);
        let keyed = index.get("Paris, Texas").unwrap();
        assert!((keyed.lat - 33.6609).abs() < 1e-9);
    }

    #[test]
    fn ambiguity_checks_comma_keys_only() {
        let index = LocationIndex::from_tsv(SAMPLE);
        assert!(index.is_ambiguous_city("Paris"));
        assert!(!index.is_ambiguous_city("nonexistent"));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let text = "country\tstate\tname\tlat\tlng\n\
US\tTexas\tParis\tnot-a-number\t-95.5\n\
US\tIdaho\tBoise\t43.6150\t-116.2023\n";
        let index = LocationIndex::from_tsv(text);
        assert!(!index.contains("Paris, Texas"));
        assert!(index.contains("Boise, Idaho"));
    }

    #[test]
    fn bundled_dataset_loads() {
        let index = LocationIndex::bundled();
        assert!(index.contains("Saint Louis, Missouri"));
        assert!(index.contains("Paris, Texas"));
        assert!(!index.is_empty());
    }
}
