//! Location resolution against the bundled dataset.

use venuetrack::locations::{fuzzy_search, resolve, LocationIndex};

#[test]
fn st_louis_expands_to_saint_louis_missouri() {
    let index = LocationIndex::bundled();
    let hit = resolve(&index, "St. Louis, MO").expect("St. Louis should resolve");
    assert!((hit.lat - 38.6270).abs() < 1e-4);
    assert!((hit.lng + 90.1994).abs() < 1e-4);
}

#[test]
fn state_abbreviations_resolve_for_every_format_variant() {
    let index = LocationIndex::bundled();
    assert!(resolve(&index, "Austin, TX").is_some());
    assert!(resolve(&index, "austin, tx").is_some());
    assert!(resolve(&index, "Austin, Texas").is_some());
    assert!(resolve(&index, " Austin ,  TX ").is_some());
}

#[test]
fn springfield_without_a_usable_state_stays_unresolved() {
    let index = LocationIndex::bundled();
    // Three Springfields are bundled; the bare-city fallback must refuse.
    assert!(resolve(&index, "Springfield, Unknownia").is_none());
    assert!(resolve(&index, "Springfield, IL").is_some());
    assert!(resolve(&index, "Springfield, MA").is_some());
}

#[test]
fn unknown_locations_resolve_to_none() {
    let index = LocationIndex::bundled();
    assert!(resolve(&index, "Atlantis, ZZ").is_none());
    assert!(resolve(&index, "").is_none());
}

#[test]
fn fuzzy_search_ranks_prefix_matches_first_and_caps_at_eight() {
    let index = LocationIndex::bundled();

    let hits = fuzzy_search(&index, "char");
    assert!(!hits.is_empty());
    assert!(hits[0].key.starts_with("Charl"));

    let broad = fuzzy_search(&index, "a");
    assert!(broad.len() <= 8);
    assert!(broad.iter().all(|hit| hit.key.contains(',')));
}

#[test]
fn fuzzy_search_is_for_search_only_not_resolution() {
    let index = LocationIndex::bundled();
    // "Nashvill" finds Nashville interactively but does not resolve.
    assert!(!fuzzy_search(&index, "nashvill").is_empty());
    assert!(resolve(&index, "Nashvill, TN").is_none());
}

#[test]
fn blank_search_term_returns_nothing() {
    let index = LocationIndex::bundled();
    assert!(fuzzy_search(&index, "   ").is_empty());
}
