//! Map-side projection: group venues by "City, State", resolve each label to
//! a coordinate, and keep only groups meeting the minimum-venue-count
//! threshold. Rendering pins is the map renderer's job; this computes the
//! groups it consumes.

use std::collections::HashMap;

use tracing::debug;

use crate::locations::{resolve, Coordinate, LocationIndex};
use crate::record::{cell, VenueRecord, COL_CITY, COL_STATE, COL_VENUE};

#[derive(Debug, Clone, PartialEq)]
pub struct MapGroup {
    /// "City, State" label as it appears in the records.
    pub label: String,
    pub coordinate: Coordinate,
    pub venue_names: Vec<String>,
}

impl MapGroup {
    pub fn venue_count(&self) -> usize {
        self.venue_names.len()
    }
}

/// Group the given rows (normally the current filtered view) into map pins.
/// Rows without a city are skipped; labels the resolver cannot place are
/// dropped with a log line. Groups come back sorted by label.
pub fn map_groups(
    rows: &[&VenueRecord],
    index: &LocationIndex,
    min_venue_count: usize,
) -> Vec<MapGroup> {
    let min_venue_count = min_venue_count.max(1);
    let mut by_label: HashMap<String, Vec<String>> = HashMap::new();

    for record in rows {
        let city = cell(record, COL_CITY);
        if city.is_empty() {
            continue;
        }
        let state = cell(record, COL_STATE);
        let label = if state.is_empty() {
            city.to_string()
        } else {
            format!("{city}, {state}")
        };
        by_label
            .entry(label)
            .or_default()
            .push(cell(record, COL_VENUE).to_string());
    }

    let mut groups: Vec<MapGroup> = by_label
        .into_iter()
        .filter(|(_, venues)| venues.len() >= min_venue_count)
        .filter_map(|(label, venue_names)| match resolve(index, &label) {
            Some(coordinate) => Some(MapGroup {
                label,
                coordinate,
                venue_names,
            }),
            None => {
                debug!(%label, "dropping unresolvable map group");
                None
            }
        })
        .collect();

    groups.sort_by(|a, b| a.label.cmp(&b.label));
    groups
}
