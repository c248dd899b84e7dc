pub mod parse;
pub mod types;

pub use parse::{parse_listings, parse_loose_number};
pub use types::{Category, Listing, TriState, VisitKind, VisitRecord};
