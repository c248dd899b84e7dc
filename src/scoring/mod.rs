pub mod config;
pub mod engine;
pub mod factors;
pub mod normalizer;
pub mod validation;

pub use config::*;
pub use engine::{calculate_score, compute_score, normalize_feature, FeatureContribution, ScoreResult};
pub use factors::{Amenity, Feature};
pub use validation::{unknown_weight_keys, validate_scoring};
