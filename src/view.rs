//! Derived view over the venue store: conjunctive filters, a single sortable
//! column, and clamped pagination. The view holds store indices, not copies;
//! recompute after any store mutation.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::record::{cell, VenueRecord, COL_REGION, COL_STATUS, COL_TYPE};
use crate::store::VenueStore;

/// Allowed page sizes, mirrored by the page-size selector.
pub const PAGE_SIZES: [usize; 6] = [5, 10, 25, 50, 100, 200];
pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        Self::Ascending
    }
}

/// One displayable page of the current view.
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub rows: Vec<&'a VenueRecord>,
    pub total: usize,
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
}

const WIDTH_SAMPLE_ROWS: usize = 100;
const CHAR_WIDTH: usize = 8;
const CELL_PADDING: usize = 24;
const COLUMN_MIN_WIDTH: usize = 60;

/// Width hints are a display heuristic; the cache key only has to notice
/// schema or view-shape changes, not every cell edit.
#[derive(Debug, Clone)]
struct WidthCache {
    key: (usize, usize, usize),
    widths: HashMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct ViewEngine {
    status_filters: HashSet<String>,
    region_filters: HashSet<String>,
    type_filters: HashSet<String>,
    search: String,
    sort_column: Option<String>,
    sort_direction: SortDirection,
    hidden_columns: HashSet<String>,
    page: usize,
    page_size: usize,
    matches: Vec<usize>,
    width_cache: Option<WidthCache>,
}

/// True iff the whole string parses as a usable number (JS-style numeric
/// comparison applies only when both sides do).
fn parse_numeric(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

impl Default for ViewEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewEngine {
    pub fn new() -> Self {
        ViewEngine {
            status_filters: HashSet::new(),
            region_filters: HashSet::new(),
            type_filters: HashSet::new(),
            search: String::new(),
            sort_column: None,
            sort_direction: SortDirection::default(),
            hidden_columns: HashSet::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            matches: Vec::new(),
            width_cache: None,
        }
    }

    pub fn sort_column(&self) -> Option<&str> {
        self.sort_column.as_deref()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page_number(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn status_filters(&self) -> &HashSet<String> {
        &self.status_filters
    }

    pub fn region_filters(&self) -> &HashSet<String> {
        &self.region_filters
    }

    pub fn type_filters(&self) -> &HashSet<String> {
        &self.type_filters
    }

    pub fn hidden_columns(&self) -> &HashSet<String> {
        &self.hidden_columns
    }

    /// Restore persisted view settings from a snapshot, then recompute.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        &mut self,
        store: &VenueStore,
        status_filters: HashSet<String>,
        region_filters: HashSet<String>,
        type_filters: HashSet<String>,
        hidden_columns: HashSet<String>,
        sort_column: Option<String>,
        sort_direction: SortDirection,
        page_size: usize,
    ) {
        self.status_filters = status_filters;
        self.region_filters = region_filters;
        self.type_filters = type_filters;
        self.hidden_columns = hidden_columns;
        self.sort_column = sort_column;
        self.sort_direction = sort_direction;
        self.page_size = if PAGE_SIZES.contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        self.page = 1;
        self.recompute(store);
    }

    pub fn set_status_filters(&mut self, filters: HashSet<String>, store: &VenueStore) {
        self.status_filters = filters;
        self.filters_changed(store);
    }

    pub fn set_region_filters(&mut self, filters: HashSet<String>, store: &VenueStore) {
        self.region_filters = filters;
        self.filters_changed(store);
    }

    pub fn set_type_filters(&mut self, filters: HashSet<String>, store: &VenueStore) {
        self.type_filters = filters;
        self.filters_changed(store);
    }

    /// Free-text filter; callers debounce keystrokes upstream.
    pub fn set_search(&mut self, query: &str, store: &VenueStore) {
        self.search = query.to_string();
        self.filters_changed(store);
    }

    pub fn set_hidden_columns(&mut self, hidden: HashSet<String>) {
        self.hidden_columns = hidden;
        self.width_cache = None;
    }

    /// Selecting the active column toggles direction; any other column sorts
    /// ascending. Either way the page resets to 1.
    pub fn toggle_sort(&mut self, column: &str, store: &VenueStore) {
        if self.sort_column.as_deref() == Some(column) {
            self.sort_direction = match self.sort_direction {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::Ascending,
            };
        } else {
            self.sort_column = Some(column.to_string());
            self.sort_direction = SortDirection::Ascending;
        }
        self.filters_changed(store);
    }

    /// Pagination-only change: clamp, never reset.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count());
    }

    /// Unknown sizes are ignored; the page is re-clamped against the new
    /// page count.
    pub fn set_page_size(&mut self, size: usize) {
        if PAGE_SIZES.contains(&size) {
            self.page_size = size;
            self.page = self.page.clamp(1, self.page_count());
        }
    }

    fn filters_changed(&mut self, store: &VenueStore) {
        self.page = 1;
        self.recompute(store);
    }

    /// Recompute the filtered, sorted index list and re-clamp the page.
    /// Call after every store mutation; filter/sort setters call it
    /// themselves.
    pub fn recompute(&mut self, store: &VenueStore) {
        let needle = self.search.trim().to_lowercase();
        let records = store.records();

        let mut matches: Vec<usize> = (0..records.len())
            .filter(|&i| self.record_passes(&records[i], &needle))
            .collect();

        if let Some(column) = self.sort_column.clone() {
            let direction = self.sort_direction;
            matches.sort_by(|&a, &b| {
                let ordering = compare_cells(cell(&records[a], &column), cell(&records[b], &column));
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        self.matches = matches;
        self.page = self.page.clamp(1, self.page_count());
        self.width_cache = None;
    }

    fn record_passes(&self, record: &VenueRecord, needle: &str) -> bool {
        let in_set = |filters: &HashSet<String>, column: &str| {
            filters.is_empty() || filters.contains(cell(record, column))
        };
        if !in_set(&self.status_filters, COL_STATUS)
            || !in_set(&self.region_filters, COL_REGION)
            || !in_set(&self.type_filters, COL_TYPE)
        {
            return false;
        }
        if needle.is_empty() {
            return true;
        }
        record
            .values()
            .any(|value| value.to_lowercase().contains(needle))
    }

    pub fn total(&self) -> usize {
        self.matches.len()
    }

    pub fn page_count(&self) -> usize {
        self.total().div_ceil(self.page_size).max(1)
    }

    /// Current page slice plus totals. An out-of-range stored page has
    /// already been clamped, so this never fails.
    pub fn page_view<'a>(&self, store: &'a VenueStore) -> PageView<'a> {
        let records = store.records();
        let start = (self.page - 1) * self.page_size;
        let rows = self
            .matches
            .iter()
            .skip(start)
            .take(self.page_size)
            .map(|&i| &records[i])
            .collect();
        PageView {
            rows,
            total: self.total(),
            page: self.page,
            page_count: self.page_count(),
            page_size: self.page_size,
        }
    }

    /// Every row of the current view in view order, across all pages. Feeds
    /// the map grouping.
    pub fn matched_rows<'a>(&self, store: &'a VenueStore) -> Vec<&'a VenueRecord> {
        let records = store.records();
        self.matches.iter().map(|&i| &records[i]).collect()
    }

    /// Distinct, sorted values of a column across the whole store; feeds the
    /// filter dropdowns. Empty cells are skipped.
    pub fn filter_options(&self, store: &VenueStore, column: &str) -> Vec<String> {
        let values: BTreeSet<String> = store
            .records()
            .iter()
            .map(|r| cell(r, column).to_string())
            .filter(|v| !v.is_empty())
            .collect();
        values.into_iter().collect()
    }

    /// Per-column display width hint: the widest of the header and the cells
    /// of the first 100 view rows, in estimated pixels, floored at the column
    /// minimum. Pure heuristic, cached until the schema or view shape moves.
    pub fn column_widths(&mut self, store: &VenueStore) -> HashMap<String, usize> {
        let key = (
            store.headers().len(),
            self.hidden_columns.len(),
            self.matches.len(),
        );
        if let Some(cache) = &self.width_cache {
            if cache.key == key {
                return cache.widths.clone();
            }
        }

        let records = store.records();
        let mut widths = HashMap::new();
        for header in store.headers() {
            if self.hidden_columns.contains(header) {
                continue;
            }
            let mut longest = header.chars().count();
            for &i in self.matches.iter().take(WIDTH_SAMPLE_ROWS) {
                longest = longest.max(cell(&records[i], header).chars().count());
            }
            let estimate = longest * CHAR_WIDTH + CELL_PADDING;
            widths.insert(header.clone(), estimate.max(COLUMN_MIN_WIDTH));
        }

        self.width_cache = Some(WidthCache {
            key,
            widths: widths.clone(),
        });
        widths
    }
}

/// Numeric comparison when both cells parse fully as numbers, otherwise
/// case-insensitive lexicographic. Stable sort keeps tied rows in store
/// order.
fn compare_cells(a: &str, b: &str) -> Ordering {
    match (parse_numeric(a), parse_numeric(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}
