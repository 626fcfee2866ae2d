//! Booking status pipeline: a fixed four-stage cycle driven by substring
//! matches against the free-text Status column. Transitions go through the
//! store so the change log and timestamp rules apply unchanged.

use crate::history::ChangeLog;
use crate::record::{cell, VenueId, COL_STATUS};
use crate::store::{StoreError, VenueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Canvas,
    FollowUp,
    Booked,
    BookAgain,
}

/// Pipeline order; `detect_stage` checks tokens in this order and the first
/// containment match wins.
pub const STAGES: [Stage; 4] = [Stage::Canvas, Stage::FollowUp, Stage::Booked, Stage::BookAgain];

impl Stage {
    pub fn token(&self) -> &'static str {
        match self {
            Self::Canvas => "CANVAS",
            Self::FollowUp => "FOLLOW-UP",
            Self::Booked => "BOOKED",
            Self::BookAgain => "BOOK-AGAIN",
        }
    }

    pub fn next(&self) -> Stage {
        match self {
            Self::Canvas => Self::FollowUp,
            Self::FollowUp => Self::Booked,
            Self::Booked => Self::BookAgain,
            Self::BookAgain => Self::Canvas,
        }
    }
}

/// Stage of a free-text Status value, by case-insensitive containment of the
/// stage tokens in pipeline order. Values may carry extra text around the
/// token.
pub fn detect_stage(status: &str) -> Option<Stage> {
    let upper = status.to_uppercase();
    STAGES.iter().copied().find(|stage| upper.contains(stage.token()))
}

/// Outcome of a pipeline operation on one venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Status moved; carries the old and new values.
    Advanced { from: String, to: String },
    /// Status did not participate in the pipeline; nothing changed.
    NoStage,
    /// `assign_to_canvas` on a venue that already has a status.
    AlreadyAssigned,
}

/// Advance a venue to the next stage (wrapping after BOOK-AGAIN). A Status
/// with no recognizable stage is left alone; the pipeline never assigns an
/// initial stage.
pub fn advance(
    store: &mut VenueStore,
    id: &VenueId,
    log: &mut ChangeLog,
) -> Result<PipelineOutcome, StoreError> {
    let record = store.get(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
    let current = cell(record, COL_STATUS).to_string();
    let Some(stage) = detect_stage(&current) else {
        return Ok(PipelineOutcome::NoStage);
    };

    let next = stage.next().token().to_string();
    let mut new_values = record.clone();
    new_values.insert(COL_STATUS.to_string(), next.clone());
    store.update(id, &new_values, log)?;
    Ok(PipelineOutcome::Advanced {
        from: current,
        to: next,
    })
}

/// Put a venue with a blank Status onto the board at CANVAS. Venues that
/// already carry any status are left alone.
pub fn assign_to_canvas(
    store: &mut VenueStore,
    id: &VenueId,
    log: &mut ChangeLog,
) -> Result<PipelineOutcome, StoreError> {
    let record = store.get(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
    let current = cell(record, COL_STATUS);
    if !current.is_empty() {
        return Ok(PipelineOutcome::AlreadyAssigned);
    }

    let to = Stage::Canvas.token().to_string();
    let mut new_values = record.clone();
    new_values.insert(COL_STATUS.to_string(), to.clone());
    store.update(id, &new_values, log)?;
    Ok(PipelineOutcome::Advanced {
        from: String::new(),
        to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryAction;

    fn seeded() -> (VenueStore, ChangeLog, VenueId) {
        let mut store = VenueStore::new();
        store
            .import_rows("Venue\tCity\tState\tStatus\nMohawk\tAustin\tTX\tCANVAS\nBlank\tDallas\tTX\t\n")
            .unwrap();
        let id = VenueId::from_parts("Mohawk", "Austin", "TX");
        (store, ChangeLog::new(), id)
    }

    #[test]
    fn detect_stage_matches_substring_in_pipeline_order() {
        assert_eq!(detect_stage("CANVAS"), Some(Stage::Canvas));
        assert_eq!(detect_stage("booked for June"), Some(Stage::Booked));
        // BOOK-AGAIN contains no earlier token; BOOKED does not contain
        // BOOK-AGAIN. CANVAS wins over a later token when both appear.
        assert_eq!(detect_stage("canvas then book-again"), Some(Stage::Canvas));
        assert_eq!(detect_stage("pending call"), None);
        assert_eq!(detect_stage(""), None);
    }

    #[test]
    fn advance_cycles_back_to_canvas_in_four_steps() {
        let (mut store, mut log, id) = seeded();
        for _ in 0..4 {
            advance(&mut store, &id, &mut log).unwrap();
        }
        let status = store.get(&id).unwrap()["Status"].clone();
        assert!(status.contains("CANVAS"));
        assert_eq!(log.len(), 4);
        assert!(log.entries().iter().all(|e| e.action == HistoryAction::Edit));
    }

    #[test]
    fn advance_records_status_diff() {
        let (mut store, mut log, id) = seeded();
        let outcome = advance(&mut store, &id, &mut log).unwrap();
        assert_eq!(
            outcome,
            PipelineOutcome::Advanced {
                from: "CANVAS".to_string(),
                to: "FOLLOW-UP".to_string(),
            }
        );
        let changes = log.entries()[0].changes.as_ref().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "Status");
    }

    #[test]
    fn advance_without_stage_is_a_noop() {
        let (mut store, mut log, _) = seeded();
        let id = VenueId::from_parts("Blank", "Dallas", "TX");
        let outcome = advance(&mut store, &id, &mut log).unwrap();
        assert_eq!(outcome, PipelineOutcome::NoStage);
        assert!(log.is_empty());
        assert_eq!(store.get(&id).unwrap()["Status"], "");
    }

    #[test]
    fn advance_missing_venue_is_not_found() {
        let (mut store, mut log, _) = seeded();
        let id = VenueId::from_parts("ghost", "x", "y");
        assert!(advance(&mut store, &id, &mut log).is_err());
    }

    #[test]
    fn assign_to_canvas_only_when_blank() {
        let (mut store, mut log, booked_id) = seeded();
        let blank_id = VenueId::from_parts("Blank", "Dallas", "TX");

        let outcome = assign_to_canvas(&mut store, &blank_id, &mut log).unwrap();
        assert!(matches!(outcome, PipelineOutcome::Advanced { .. }));
        assert_eq!(store.get(&blank_id).unwrap()["Status"], "CANVAS");
        assert_eq!(log.len(), 1);

        let second = assign_to_canvas(&mut store, &booked_id, &mut log).unwrap();
        assert_eq!(second, PipelineOutcome::AlreadyAssigned);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn extra_text_around_token_still_advances() {
        let mut store = VenueStore::new();
        store
            .import_rows("Venue\tCity\tState\tStatus\nA\tAustin\tTX\tbooked (June, paid)\n")
            .unwrap();
        let mut log = ChangeLog::new();
        let id = VenueId::from_parts("A", "Austin", "TX");
        let outcome = advance(&mut store, &id, &mut log).unwrap();
        assert_eq!(
            outcome,
            PipelineOutcome::Advanced {
                from: "booked (June, paid)".to_string(),
                to: "BOOK-AGAIN".to_string(),
            }
        );
    }
}
