//! Rank saved real-estate listings by a weighted, per-category score.
//!
//! [`scoring`] turns raw listing attributes into a 0–100 score,
//! [`ranker::Ranker`] keeps stored scores in step with the active configs,
//! and [`store`] defines where listings and configs live.

pub mod browser;
pub mod config;
pub mod listing;
pub mod logging;
pub mod output;
pub mod ranker;
pub mod scoring;
pub mod store;
