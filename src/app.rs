//! Explicit application state: one object owning the store, view, change log
//! and map/view settings, snapshotting to the key-value store after every
//! mutation. The presentation layer calls these operations and renders the
//! derived views; nothing here touches a rendering surface.

use std::collections::HashSet;

use tracing::warn;

use crate::history::{ChangeLog, FieldChange, HistoryEntry, HistoryPage};
use crate::locations::{self, Coordinate, LocationIndex, LocationMatch};
use crate::map::{map_groups, MapGroup};
use crate::persist::{self, Snapshot, SnapshotStore};
use crate::record::{VenueId, VenueRecord};
use crate::status::{self, PipelineOutcome};
use crate::store::{ImportReport, StoreError, VenueStore};
use crate::view::{PageView, ViewEngine};

pub struct App {
    store: VenueStore,
    log: ChangeLog,
    view: ViewEngine,
    locations: LocationIndex,
    storage: Box<dyn SnapshotStore>,
    min_venue_count: usize,
    map_center: [f64; 2],
    map_zoom: u8,
    history_page_size: usize,
    history_search: String,
}

impl App {
    /// Restore from whatever snapshot the storage holds; absent or malformed
    /// snapshots start the session empty. A hard storage read error is logged
    /// and also starts empty, with the store left in place for later saves.
    pub fn new(storage: Box<dyn SnapshotStore>) -> Self {
        let snapshot = match persist::load(storage.as_ref()) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%err, "snapshot load failed, starting empty");
                Snapshot::initial()
            }
        };

        let store = VenueStore::from_state(snapshot.headers, snapshot.venues);
        let log = ChangeLog::from_entries(snapshot.history);
        let mut view = ViewEngine::new();
        view.restore(
            &store,
            snapshot.status_filters,
            snapshot.region_filters,
            snapshot.type_filters,
            snapshot.hidden_columns,
            snapshot.sort_column,
            snapshot.sort_direction,
            snapshot.page_size,
        );

        App {
            store,
            log,
            view,
            locations: LocationIndex::bundled(),
            storage,
            min_venue_count: snapshot.min_venue_count.max(1),
            map_center: snapshot.map_center,
            map_zoom: snapshot.map_zoom,
            history_page_size: snapshot.history_page_size,
            history_search: snapshot.history_search_filter,
        }
    }

    pub fn store(&self) -> &VenueStore {
        &self.store
    }

    pub fn history(&self) -> &ChangeLog {
        &self.log
    }

    pub fn view(&self) -> &ViewEngine {
        &self.view
    }

    pub fn locations(&self) -> &LocationIndex {
        &self.locations
    }

    // ----- venue mutations ---------------------------------------------

    pub fn import(&mut self, text: &str) -> Result<ImportReport, StoreError> {
        let report = self.store.import_rows(text)?;
        self.after_mutation();
        Ok(report)
    }

    pub fn add_venue(&mut self, record: VenueRecord) {
        self.store.add(record, &mut self.log);
        self.after_mutation();
    }

    pub fn update_venue(
        &mut self,
        id: &VenueId,
        new_values: &VenueRecord,
    ) -> Result<Vec<FieldChange>, StoreError> {
        let changes = self.store.update(id, new_values, &mut self.log)?;
        if !changes.is_empty() {
            self.after_mutation();
        }
        Ok(changes)
    }

    /// Duplicate an existing venue as a fresh Add. `add` does not run
    /// duplicate detection (only import does), so the caller can rename the
    /// copy afterwards via `update_venue`.
    pub fn copy_venue(&mut self, id: &VenueId) -> Result<(), StoreError> {
        let record = self
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.add_venue(record);
        Ok(())
    }

    pub fn remove_venue(&mut self, id: &VenueId) -> Result<VenueRecord, StoreError> {
        let removed = self.store.remove(id, &mut self.log)?;
        self.after_mutation();
        Ok(removed)
    }

    /// Wipe venues, schema and history. The confirmation prompt preceding
    /// this belongs to the presentation layer.
    pub fn clear_all(&mut self) {
        self.store.clear(&mut self.log);
        self.after_mutation();
    }

    pub fn export_tsv(&self) -> String {
        self.store.export_tsv()
    }

    // ----- status pipeline ---------------------------------------------

    pub fn advance_status(&mut self, id: &VenueId) -> Result<PipelineOutcome, StoreError> {
        let outcome = status::advance(&mut self.store, id, &mut self.log)?;
        if matches!(outcome, PipelineOutcome::Advanced { .. }) {
            self.after_mutation();
        }
        Ok(outcome)
    }

    pub fn assign_to_canvas(&mut self, id: &VenueId) -> Result<PipelineOutcome, StoreError> {
        let outcome = status::assign_to_canvas(&mut self.store, id, &mut self.log)?;
        if matches!(outcome, PipelineOutcome::Advanced { .. }) {
            self.after_mutation();
        }
        Ok(outcome)
    }

    // ----- derived view ------------------------------------------------

    pub fn page(&self) -> PageView<'_> {
        self.view.page_view(&self.store)
    }

    pub fn filter_options(&self, column: &str) -> Vec<String> {
        self.view.filter_options(&self.store, column)
    }

    pub fn set_status_filters(&mut self, filters: HashSet<String>) {
        self.view.set_status_filters(filters, &self.store);
        self.save_settings();
    }

    pub fn set_region_filters(&mut self, filters: HashSet<String>) {
        self.view.set_region_filters(filters, &self.store);
        self.save_settings();
    }

    pub fn set_type_filters(&mut self, filters: HashSet<String>) {
        self.view.set_type_filters(filters, &self.store);
        self.save_settings();
    }

    /// Apply a settled search value (keystrokes are debounced upstream via
    /// [crate::debounce::Debouncer]). The query itself is not persisted.
    pub fn set_search(&mut self, query: &str) {
        self.view.set_search(query, &self.store);
    }

    pub fn toggle_sort(&mut self, column: &str) {
        self.view.toggle_sort(column, &self.store);
        self.save_settings();
    }

    pub fn set_page(&mut self, page: usize) {
        self.view.set_page(page);
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.view.set_page_size(size);
        self.save_settings();
    }

    pub fn set_hidden_columns(&mut self, hidden: HashSet<String>) {
        self.view.set_hidden_columns(hidden);
        self.save_settings();
    }

    // ----- history -----------------------------------------------------

    pub fn history_page(&self, page: usize) -> HistoryPage {
        self.log.query(&self.history_search, page, self.history_page_size)
    }

    pub fn venue_history(&self, id: &VenueId) -> Vec<HistoryEntry> {
        self.log.for_venue(id)
    }

    /// Settled history search value; persisted with the snapshot.
    pub fn set_history_search(&mut self, term: &str) {
        self.history_search = term.to_string();
        self.save_settings();
    }

    pub fn set_history_page_size(&mut self, size: usize) {
        self.history_page_size = size.max(1);
        self.save_settings();
    }

    /// Irreversible; confirmation is the caller's job.
    pub fn clear_history(&mut self) {
        self.log.clear();
        self.save_settings();
    }

    // ----- map ---------------------------------------------------------

    pub fn map_groups(&self) -> Vec<MapGroup> {
        let rows = self.view.matched_rows(&self.store);
        map_groups(&rows, &self.locations, self.min_venue_count)
    }

    pub fn min_venue_count(&self) -> usize {
        self.min_venue_count
    }

    pub fn set_min_venue_count(&mut self, count: usize) {
        self.min_venue_count = count.max(1);
        self.save_settings();
    }

    pub fn map_view(&self) -> ([f64; 2], u8) {
        (self.map_center, self.map_zoom)
    }

    pub fn set_map_view(&mut self, center: [f64; 2], zoom: u8) {
        self.map_center = center;
        self.map_zoom = zoom;
        self.save_settings();
    }

    pub fn resolve_location(&self, key: &str) -> Option<Coordinate> {
        locations::resolve(&self.locations, key)
    }

    pub fn search_locations(&self, term: &str) -> Vec<LocationMatch> {
        locations::fuzzy_search(&self.locations, term)
    }

    // ----- persistence -------------------------------------------------

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            venues: self.store.records().to_vec(),
            headers: self.store.headers().to_vec(),
            hidden_columns: self.view.hidden_columns().clone(),
            sort_column: self.view.sort_column().map(str::to_string),
            sort_direction: self.view.sort_direction(),
            page_size: self.view.page_size(),
            status_filters: self.view.status_filters().clone(),
            region_filters: self.view.region_filters().clone(),
            type_filters: self.view.type_filters().clone(),
            min_venue_count: self.min_venue_count,
            map_center: self.map_center,
            map_zoom: self.map_zoom,
            history: self.log.entries().to_vec(),
            history_page_size: self.history_page_size,
            history_search_filter: self.history_search.clone(),
        }
    }

    fn after_mutation(&mut self) {
        self.view.recompute(&self.store);
        self.save_settings();
    }

    /// Failed saves are logged and swallowed; the in-memory state stays
    /// authoritative for the session.
    fn save_settings(&mut self) {
        let snapshot = self.snapshot();
        if let Err(err) = persist::save(self.storage.as_mut(), &snapshot) {
            warn!(%err, "snapshot save failed, keeping in-memory state");
        }
    }
}
