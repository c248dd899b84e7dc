use super::config::{AcceptanceRange, Importance, ScoringConfig};
use super::factors::Feature;
use super::normalizer;
use crate::listing::Listing;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureContribution {
    pub feature: Feature,
    pub importance: Importance,
    pub normalized: f64, // in [0, 1], before weighting
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub score: u8,
    pub total_weight: f64,
    pub breakdown: Vec<FeatureContribution>,
}

/// Normalize one attribute of `listing` under the ranges of `config`.
pub fn normalize_feature(feature: Feature, listing: &Listing, config: &ScoringConfig) -> f64 {
    let ranges = &config.ranges;
    let bounds = |range: &AcceptanceRange| {
        range.resolve(feature.upper_sentinel().unwrap_or(f64::MAX))
    };

    match feature {
        Feature::Price => {
            let (min, max) = bounds(&ranges.price);
            normalizer::lower_is_better(listing.price, min, max)
        }
        Feature::Size => {
            let (min, max) = bounds(&ranges.size);
            let value = cap_open_ended(listing.size_m2, &ranges.size, max);
            normalizer::higher_is_better(value, min, max)
        }
        Feature::Rooms => {
            let (min, max) = bounds(&ranges.rooms);
            let value = cap_open_ended(listing.rooms.map(f64::from), &ranges.rooms, max);
            normalizer::higher_is_better(value, min, max)
        }
        Feature::Bathrooms => {
            let (min, max) = bounds(&ranges.bathrooms);
            let value = cap_open_ended(listing.bathrooms.map(f64::from), &ranges.bathrooms, max);
            normalizer::higher_is_better(value, min, max)
        }
        Feature::Roommates => normalizer::roommates(listing.roommates),
        Feature::Amenity(amenity) => normalizer::tri_state(listing.amenity(amenity.key())),
        Feature::Orientation => normalizer::orientation(listing.orientation.as_deref()),
        Feature::EnergyRating => normalizer::energy_rating(listing.energy_rating.as_deref()),
        Feature::Condition => normalizer::condition(listing.condition.as_deref()),
        Feature::Deposit => normalizer::cost_ratio(listing.deposit, listing.price),
        Feature::MaintenanceFee => normalizer::cost_ratio(listing.maintenance_fee, listing.price),
        Feature::Recency => normalizer::recency(listing.published_at, listing.created_at),
    }
}

/// With no max set, anything past the resolved top counts as the top.
fn cap_open_ended(value: Option<f64>, range: &AcceptanceRange, max: f64) -> Option<f64> {
    match value {
        Some(v) if range.max.is_none() && v.is_finite() && v > max => Some(max),
        other => other,
    }
}

/// Weighted average of every recognized, non-irrelevant attribute, as an
/// integer percentage.
///
/// Irrelevant attributes are left out of both the sum and the total weight.
/// A config with nothing weighted scores 0. Pure: the same listing and config
/// always give the same result.
pub fn calculate_score(listing: &Listing, config: &ScoringConfig) -> ScoreResult {
    let mut total = 0.0;
    let mut total_weight = 0.0;
    let mut breakdown = Vec::new();

    for (key, importance) in &config.weights {
        if *importance == Importance::Irrelevant {
            continue;
        }
        let Some(feature) = Feature::from_key(key) else {
            tracing::trace!(key = %key, "ignoring unknown weight key");
            continue;
        };

        let normalized = normalize_feature(feature, listing, config);
        let weight = importance.weight();
        total += normalized * weight;
        total_weight += weight;

        breakdown.push(FeatureContribution {
            feature,
            importance: *importance,
            normalized,
        });
    }

    let score = if total_weight > 0.0 {
        (total / total_weight * 100.0).round().clamp(0.0, 100.0) as u8
    } else {
        0
    };

    ScoreResult {
        score,
        total_weight,
        breakdown,
    }
}

/// Shorthand for callers that only need the integer score.
pub fn compute_score(listing: &Listing, config: &ScoringConfig) -> u8 {
    calculate_score(listing, config).score
}
