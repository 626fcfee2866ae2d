//! Import/export behavior end to end: duplicate skipping, schema locking and
//! the TSV round trip.

use venuetrack::history::ChangeLog;
use venuetrack::record::VenueRecord;
use venuetrack::store::{StoreError, VenueStore};

#[test]
fn identical_paris_rows_import_one_and_skip_one() {
    let mut store = VenueStore::new();
    let report = store
        .import_rows("Venue\tCity\tState\tStatus\nA\tParis\tTX\t\nA\tParis\tTX\t\n")
        .unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn duplicate_detection_survives_case_and_whitespace() {
    let mut store = VenueStore::new();
    store
        .import_rows("Venue\tCity\tState\nThe Ryman\tNashville\tTN\n")
        .unwrap();
    let report = store
        .import_rows("Venue\tCity\tState\n  THE RYMAN \t nashville\ttn \n")
        .unwrap();
    assert_eq!(report.imported, 0);
    assert_eq!(report.duplicates, 1);
}

#[test]
fn rows_missing_an_identity_field_are_never_duplicates() {
    let mut store = VenueStore::new();
    let report = store
        .import_rows("Venue\tCity\tState\nNameless\t\tTX\nNameless\t\tTX\n")
        .unwrap();
    // Both rows lack a city, so neither matches the other as a duplicate.
    assert_eq!(report.imported, 2);
    assert_eq!(report.duplicates, 0);
}

#[test]
fn schema_is_locked_after_first_import() {
    let mut store = VenueStore::new();
    store.import_rows("Venue\tCity\tState\nA\tAustin\tTX\n").unwrap();

    let err = store
        .import_rows("Venue\tRegion\tState\nB\tSouth\tTX\n")
        .unwrap_err();
    assert!(matches!(err, StoreError::SchemaMismatch { .. }));
    assert_eq!(store.len(), 1, "failed import must not partially write");

    // Same columns in a different order are also a mismatch.
    let err = store
        .import_rows("City\tVenue\tState\nAustin\tB\tTX\n")
        .unwrap_err();
    assert!(matches!(err, StoreError::SchemaMismatch { .. }));
}

#[test]
fn export_import_round_trip_preserves_records() {
    let mut store = VenueStore::new();
    store
        .import_rows(
            "Venue\tCity\tState\tRegion\tType\tStatus\n\
             Mohawk\tAustin\tTX\tSouth\tClub\tCANVAS\n\
             Bluebird\tNashville\tTN\tSouth\tListening Room\tBOOKED\n\
             First Avenue\tMinneapolis\tMN\tMidwest\tClub\t\n",
        )
        .unwrap();

    let exported = store.export_tsv();
    let mut restored = VenueStore::new();
    let report = restored.import_rows(&exported).unwrap();

    assert_eq!(report.imported, 3);
    assert_eq!(report.duplicates, 0);
    assert_eq!(store.len(), restored.len());
    for (a, b) in store.records().iter().zip(restored.records()) {
        for column in ["Venue", "City", "State", "Region", "Type", "Status"] {
            assert_eq!(a[column], b[column], "column {column} diverged");
        }
    }
}

#[test]
fn export_ignores_filters_and_contains_header_row() {
    let mut store = VenueStore::new();
    store
        .import_rows("Venue\tCity\tState\nA\tAustin\tTX\nB\tDallas\tTX\n")
        .unwrap();
    let exported = store.export_tsv();
    let lines: Vec<&str> = exported.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Venue\tCity\tState"));
}

#[test]
fn add_after_import_fills_schema_columns() {
    let mut store = VenueStore::new();
    let mut log = ChangeLog::new();
    store
        .import_rows("Venue\tCity\tState\tType\nA\tAustin\tTX\tClub\n")
        .unwrap();

    let mut record = VenueRecord::new();
    record.insert("Venue".to_string(), "B".to_string());
    record.insert("City".to_string(), "Dallas".to_string());
    record.insert("State".to_string(), "TX".to_string());
    store.add(record, &mut log);

    let added = store.records().last().unwrap();
    assert_eq!(added["Type"], "");
    assert!(!added["Last Updated"].is_empty());
}
