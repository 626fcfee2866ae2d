//! Venue records and the derived identity used to re-find them.
//! A record is a plain column-name -> cell map; column order lives in the
//! store's header schema, shared by every record.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One venue row. Keys are column names from the header schema.
pub type VenueRecord = HashMap<String, String>;

/// Column recognized by the store and pipeline logic.
pub const COL_VENUE: &str = "Venue";
pub const COL_CITY: &str = "City";
pub const COL_STATE: &str = "State";
pub const COL_REGION: &str = "Region";
pub const COL_TYPE: &str = "Type";
pub const COL_STATUS: &str = "Status";
/// System-managed timestamp column, stamped on import/add/edit.
pub const COL_LAST_UPDATED: &str = "Last Updated";

/// Cell value for `column`, trimmed; empty string when the column is absent.
pub fn cell<'a>(record: &'a VenueRecord, column: &str) -> &'a str {
    record.get(column).map(|v| v.trim()).unwrap_or("")
}

/// Stable identity for a venue: lowercase, trimmed (Venue, City, State).
/// Records are plain value maps, so this tuple is what lets history and
/// edit flows find "the same venue" again across copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VenueId(String);

impl VenueId {
    pub fn from_parts(venue: &str, city: &str, state: &str) -> Self {
        let norm = |s: &str| s.trim().to_lowercase();
        VenueId(format!("{}|{}|{}", norm(venue), norm(city), norm(state)))
    }

    pub fn of(record: &VenueRecord) -> Self {
        Self::from_parts(
            cell(record, COL_VENUE),
            cell(record, COL_CITY),
            cell(record, COL_STATE),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current UTC time in the RFC 3339 form stored in `Last Updated` and
/// history timestamps.
pub fn now_stamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
