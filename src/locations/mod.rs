//! Static location data and the exact-match resolver built on it.

pub mod index;
pub mod resolver;

pub use index::{Coordinate, LocationIndex};
pub use resolver::{fuzzy_search, resolve, LocationMatch};
