//! Authoritative venue collection: ordered records plus the dynamic header
//! schema adopted from the first import. Every mutating operation appends
//! exactly one change-log entry (a no-change edit appends none).

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::history::{ChangeLog, FieldChange, HistoryAction};
use crate::record::{cell, now_stamp, VenueId, VenueRecord, COL_CITY, COL_LAST_UPDATED, COL_STATE, COL_VENUE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Import headers disagree with the adopted schema; nothing is written.
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    /// No record with this derived id (e.g. already deleted).
    NotFound(VenueId),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaMismatch { expected, found } => write!(
                f,
                "import headers [{}] do not match existing schema [{}]",
                found.join(", "),
                expected.join(", ")
            ),
            Self::NotFound(id) => write!(f, "no venue with id '{id}'"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Outcome counts for one import. Duplicate rows are skipped, not fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub duplicates: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default)]
pub struct VenueStore {
    headers: Vec<String>,
    records: Vec<VenueRecord>,
}

fn split_tsv_row(line: &str) -> Vec<String> {
    line.split('\t').map(|s| s.trim().to_string()).collect()
}

/// Header comparison ignores the system-managed timestamp column.
fn schema_columns(headers: &[String]) -> Vec<&str> {
    headers
        .iter()
        .map(String::as_str)
        .filter(|h| *h != COL_LAST_UPDATED)
        .collect()
}

impl VenueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a restored snapshot. No history is emitted.
    pub fn from_state(headers: Vec<String>, records: Vec<VenueRecord>) -> Self {
        VenueStore { headers, records }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[VenueRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &VenueId) -> Option<&VenueRecord> {
        self.find_index(id).map(|i| &self.records[i])
    }

    fn find_index(&self, id: &VenueId) -> Option<usize> {
        self.records.iter().position(|r| &VenueId::of(r) == id)
    }

    /// True iff the candidate's Venue, City and State are all non-empty and
    /// all match an existing record, case-insensitively and trimmed. Other
    /// fields never participate.
    pub fn is_duplicate(&self, candidate: &VenueRecord) -> bool {
        let venue = cell(candidate, COL_VENUE);
        let city = cell(candidate, COL_CITY);
        let state = cell(candidate, COL_STATE);
        if venue.is_empty() || city.is_empty() || state.is_empty() {
            return false;
        }
        let id = VenueId::from_parts(venue, city, state);
        self.records.iter().any(|r| VenueId::of(r) == id)
    }

    /// Parse tab-delimited text (header line + data rows) into the store.
    ///
    /// The first import adopts the headers, appending `Last Updated` when the
    /// source lacks it. Later imports must present positionally identical
    /// headers (timestamp column aside) or the whole import is rejected with
    /// no partial write. Duplicate rows (by derived id) are counted and
    /// skipped; imported rows get `Last Updated` stamped with the import time.
    pub fn import_rows(&mut self, text: &str) -> Result<ImportReport, StoreError> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let Some(header_line) = lines.next() else {
            return Ok(ImportReport {
                imported: 0,
                duplicates: 0,
                total: 0,
            });
        };

        let mut incoming_headers = split_tsv_row(header_line);
        // Trailing tabs produce empty header cells; strip only those so a
        // blank header mid-row keeps later data cells positionally aligned.
        while incoming_headers.last().is_some_and(|h| h.is_empty()) {
            incoming_headers.pop();
        }

        if self.headers.is_empty() {
            self.headers = incoming_headers.clone();
            if !self.headers.iter().any(|h| h == COL_LAST_UPDATED) {
                self.headers.push(COL_LAST_UPDATED.to_string());
            }
        } else if schema_columns(&self.headers) != schema_columns(&incoming_headers) {
            return Err(StoreError::SchemaMismatch {
                expected: self.headers.clone(),
                found: incoming_headers,
            });
        }

        let stamp = now_stamp();
        let data_columns: Vec<String> = incoming_headers;
        let mut imported = 0usize;
        let mut duplicates = 0usize;
        let mut total = 0usize;

        for line in lines {
            total += 1;
            let cells = split_tsv_row(line);
            let mut record = VenueRecord::new();
            for (i, column) in data_columns.iter().enumerate() {
                let value = cells.get(i).cloned().unwrap_or_default();
                record.insert(column.clone(), value);
            }
            for column in &self.headers {
                record.entry(column.clone()).or_default();
            }
            record.insert(COL_LAST_UPDATED.to_string(), stamp.clone());

            if self.is_duplicate(&record) {
                duplicates += 1;
                continue;
            }
            self.records.push(record);
            imported += 1;
        }

        info!(imported, duplicates, total, "import complete");
        Ok(ImportReport {
            imported,
            duplicates,
            total,
        })
    }

    /// Append a record, filling every schema column (missing fields become
    /// empty strings) and stamping `Last Updated`. Emits one Add entry.
    pub fn add(&mut self, mut record: VenueRecord, log: &mut ChangeLog) {
        for column in &self.headers {
            record.entry(column.clone()).or_default();
        }
        record.insert(COL_LAST_UPDATED.to_string(), now_stamp());
        log.append(HistoryAction::Add, &record, None);
        self.records.push(record);
    }

    /// Replace the record's fields with `new_values` (schema columns only;
    /// a column missing from `new_values` is cleared). The diff runs over the
    /// union of old and new keys, empty-string-normalized, with the
    /// system-managed timestamp column excluded. When nothing changed the
    /// record is left untouched: no timestamp stamp, no history entry.
    pub fn update(
        &mut self,
        id: &VenueId,
        new_values: &VenueRecord,
        log: &mut ChangeLog,
    ) -> Result<Vec<FieldChange>, StoreError> {
        let index = self.find_index(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let old = &self.records[index];

        let mut fields: Vec<&String> = old.keys().chain(new_values.keys()).collect();
        fields.sort();
        fields.dedup();

        let mut changes = Vec::new();
        for field in fields {
            if field == COL_LAST_UPDATED {
                continue;
            }
            let old_value = old.get(field).map(String::as_str).unwrap_or("");
            let new_value = new_values.get(field).map(String::as_str).unwrap_or("");
            if old_value != new_value {
                changes.push(FieldChange {
                    field: field.clone(),
                    old_value: old_value.to_string(),
                    new_value: new_value.to_string(),
                });
            }
        }

        if changes.is_empty() {
            return Ok(changes);
        }

        let mut updated = VenueRecord::new();
        for column in &self.headers {
            if column == COL_LAST_UPDATED {
                continue;
            }
            updated.insert(
                column.clone(),
                new_values.get(column).cloned().unwrap_or_default(),
            );
        }
        updated.insert(COL_LAST_UPDATED.to_string(), now_stamp());

        log.append(HistoryAction::Edit, &updated, Some(changes.clone()));
        self.records[index] = updated;
        Ok(changes)
    }

    /// Delete by derived id. The Delete entry is written before removal so
    /// history captures the pre-delete state.
    pub fn remove(&mut self, id: &VenueId, log: &mut ChangeLog) -> Result<VenueRecord, StoreError> {
        let index = self.find_index(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        log.append(HistoryAction::Delete, &self.records[index], None);
        Ok(self.records.remove(index))
    }

    /// Empty records, schema and history. Callers own any confirmation step.
    pub fn clear(&mut self, log: &mut ChangeLog) {
        self.records.clear();
        self.headers.clear();
        log.clear();
    }

    /// Tab-delimited export of the full store in header order, ignoring any
    /// active filter or sort.
    pub fn export_tsv(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.headers.join("\t"));
        out.push('\n');
        for record in &self.records {
            let row: Vec<&str> = self
                .headers
                .iter()
                .map(|h| record.get(h).map(String::as_str).unwrap_or(""))
                .collect();
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out
    }
}
