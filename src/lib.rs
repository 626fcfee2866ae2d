//! Venue-tracking core: an in-memory tabular venue store with a derived
//! filtered/sorted/paginated view, exact-match location resolution, a
//! booking-status pipeline, an append-only change log, and whole-state
//! snapshot persistence. The presentation and map-rendering layers sit on
//! top of these operations; nothing here touches a rendering surface.

pub mod app;
pub mod debounce;
pub mod history;
pub mod locations;
pub mod map;
pub mod persist;
pub mod record;
pub mod status;
pub mod store;
pub mod view;
