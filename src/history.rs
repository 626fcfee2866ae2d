//! Append-only change log: one entry per Add/Edit/Delete, newest first.
//! Entries are immutable once written; only a full clear removes them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{cell, now_stamp, VenueId, VenueRecord, COL_CITY, COL_STATE, COL_VENUE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryAction {
    Add,
    Edit,
    Delete,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Edit => "Edit",
            Self::Delete => "Delete",
        }
    }
}

/// Per-field diff carried by Edit entries (and omitted when nothing changed,
/// in which case no entry is written at all).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: String,
    pub action: HistoryAction,
    pub venue_id: VenueId,
    pub venue_name: String,
    pub city: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<FieldChange>>,
}

impl HistoryEntry {
    fn matches(&self, needle: &str) -> bool {
        let contains = |hay: &str| hay.to_lowercase().contains(needle);
        contains(&self.venue_name)
            || contains(&self.city)
            || contains(&self.state)
            || contains(self.action.as_str())
            || self.changes.iter().flatten().any(|change| {
                contains(&change.field)
                    || contains(&change.old_value)
                    || contains(&change.new_value)
            })
    }
}

/// One page of history query results.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub total: usize,
    pub page: usize,
    pub page_count: usize,
}

/// The log itself. Newest entries sit at the front so display order is the
/// storage order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeLog {
    entries: Vec<HistoryEntry>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        ChangeLog { entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prepend an entry for `record`. Identity columns are captured at call
    /// time so the entry survives later edits and deletes of the record.
    pub fn append(
        &mut self,
        action: HistoryAction,
        record: &VenueRecord,
        changes: Option<Vec<FieldChange>>,
    ) {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: now_stamp(),
            action,
            venue_id: VenueId::of(record),
            venue_name: cell(record, COL_VENUE).to_string(),
            city: cell(record, COL_CITY).to_string(),
            state: cell(record, COL_STATE).to_string(),
            changes,
        };
        self.entries.insert(0, entry);
    }

    /// Case-insensitive search over venue name, city, state, action label and
    /// any diffed field/old/new value, then paginate the (already newest-first)
    /// matches. An out-of-range page clamps instead of failing.
    pub fn query(&self, term: &str, page: usize, page_size: usize) -> HistoryPage {
        let needle = term.trim().to_lowercase();
        let matches: Vec<&HistoryEntry> = self
            .entries
            .iter()
            .filter(|entry| needle.is_empty() || entry.matches(&needle))
            .collect();

        let total = matches.len();
        let page_size = page_size.max(1);
        let page_count = total.div_ceil(page_size).max(1);
        let page = page.clamp(1, page_count);
        let start = (page - 1) * page_size;
        let entries = matches
            .into_iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();

        HistoryPage {
            entries,
            total,
            page,
            page_count,
        }
    }

    /// All entries for one venue, newest first. Insertion order already puts
    /// newer entries first; the timestamp sort is a defensive re-sort for
    /// display and restored snapshots.
    pub fn for_venue(&self, id: &VenueId) -> Vec<HistoryEntry> {
        let mut entries: Vec<HistoryEntry> = self
            .entries
            .iter()
            .filter(|entry| &entry.venue_id == id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }

    /// Irreversible. Callers own any confirmation step.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(venue: &str, city: &str, state: &str) -> VenueRecord {
        let mut r = VenueRecord::new();
        r.insert(COL_VENUE.to_string(), venue.to_string());
        r.insert(COL_CITY.to_string(), city.to_string());
        r.insert(COL_STATE.to_string(), state.to_string());
        r
    }

    #[test]
    fn append_prepends_newest_first() {
        let mut log = ChangeLog::new();
        log.append(HistoryAction::Add, &record("First", "Austin", "TX"), None);
        log.append(HistoryAction::Add, &record("Second", "Austin", "TX"), None);
        assert_eq!(log.entries()[0].venue_name, "Second");
        assert_eq!(log.entries()[1].venue_name, "First");
    }

    #[test]
    fn query_matches_changed_values_case_insensitively() {
        let mut log = ChangeLog::new();
        let changes = vec![FieldChange {
            field: "Status".to_string(),
            old_value: "CANVAS".to_string(),
            new_value: "FOLLOW-UP".to_string(),
        }];
        log.append(
            HistoryAction::Edit,
            &record("The Fillmore", "San Francisco", "CA"),
            Some(changes),
        );
        log.append(HistoryAction::Add, &record("Other", "Denver", "CO"), None);

        let page = log.query("follow-up", 1, 50);
        assert_eq!(page.total, 1);
        assert_eq!(page.entries[0].venue_name, "The Fillmore");
    }

    #[test]
    fn query_clamps_out_of_range_page() {
        let mut log = ChangeLog::new();
        for i in 0..7 {
            log.append(HistoryAction::Add, &record(&format!("V{i}"), "X", "Y"), None);
        }
        let page = log.query("", 99, 5);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_count, 2);
        assert_eq!(page.entries.len(), 2);
    }

    #[test]
    fn empty_log_queries_to_single_empty_page() {
        let log = ChangeLog::new();
        let page = log.query("anything", 1, 25);
        assert_eq!(page.total, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_count, 1);
        assert!(page.entries.is_empty());
    }

    #[test]
    fn for_venue_filters_by_derived_id() {
        let mut log = ChangeLog::new();
        log.append(HistoryAction::Add, &record("A", "Paris", "TX"), None);
        log.append(HistoryAction::Edit, &record("A", "Paris", "TX"), None);
        log.append(HistoryAction::Add, &record("B", "Paris", "TX"), None);

        let id = VenueId::from_parts("a", "paris", "tx");
        let entries = log.for_venue(&id);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.venue_id == id));
    }
}
