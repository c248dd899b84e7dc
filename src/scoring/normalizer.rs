//! Per-attribute normalization into a `[0, 1]` desirability score.
//!
//! Every function here is total: missing or malformed input maps to the
//! neutral value instead of failing.

use chrono::{DateTime, Utc};

use crate::listing::TriState;

/// Score for anything unknown, unmentioned or unparseable.
pub const NEUTRAL: f64 = 0.5;

pub fn tri_state(value: TriState) -> f64 {
    match value {
        TriState::Present => 1.0,
        TriState::Absent => 0.0,
        TriState::Unspecified => NEUTRAL,
    }
}

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

/// Higher is better, strict: anything outside `[min, max]` scores zero.
/// A degenerate range (`min == max`) is always satisfied.
pub fn higher_is_better(value: Option<f64>, min: f64, max: f64) -> f64 {
    let Some(value) = usable(value) else {
        return NEUTRAL;
    };
    if max == min {
        return 1.0;
    }
    if value < min || value > max {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Lower is better, lenient: under the floor is full marks, over the ceiling
/// decays proportionally to the overshoot.
pub fn lower_is_better(value: Option<f64>, min: f64, max: f64) -> f64 {
    let Some(value) = usable(value) else {
        return NEUTRAL;
    };
    if max == min {
        return 1.0;
    }
    if value < min {
        return 1.0;
    }
    if value > max {
        if max <= 0.0 {
            return 0.0;
        }
        return (1.0 - (value - max) / max).max(0.0);
    }
    (1.0 - (value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Fewer roommates is better.
pub fn roommates(count: Option<u32>) -> f64 {
    match count {
        None => NEUTRAL,
        Some(0) => 1.0,
        Some(1) => 0.9,
        Some(2) => 0.75,
        Some(3) => 0.6,
        Some(4) => 0.45,
        Some(_) => 0.3,
    }
}

/// Checked in order; "oeste" must come before "este" since it contains it.
const ORIENTATIONS: [(&str, f64); 8] = [
    ("sur", 1.0),
    ("south", 1.0),
    ("oeste", 0.7),
    ("west", 0.7),
    ("este", 0.8),
    ("east", 0.8),
    ("norte", 0.5),
    ("north", 0.5),
];

pub fn orientation(value: Option<&str>) -> f64 {
    let Some(value) = value else {
        return NEUTRAL;
    };
    let value = value.to_lowercase();
    ORIENTATIONS
        .iter()
        .find(|(needle, _)| value.contains(needle))
        .map_or(NEUTRAL, |(_, score)| *score)
}

/// Energy certificate letter, A (1.0) down to G (0.2) in equal steps.
pub fn energy_rating(value: Option<&str>) -> f64 {
    let Some(value) = value else {
        return NEUTRAL;
    };
    let mut chars = value.trim().chars();
    let Some(letter) = chars.next().map(|c| c.to_ascii_uppercase()) else {
        return NEUTRAL;
    };
    // A bare letter, optionally followed by "+" or a suffix like " (2023)".
    if chars.next().is_some_and(|c| c.is_alphabetic()) {
        return NEUTRAL;
    }
    match letter {
        'A'..='G' => {
            let index = (letter as u8 - b'A') as f64;
            1.0 - index * (0.8 / 6.0)
        }
        _ => NEUTRAL,
    }
}

/// Checked in order so that "muy bueno" wins over "bueno".
const CONDITIONS: [(&str, f64); 14] = [
    ("excelente", 1.0),
    ("excellent", 1.0),
    ("obra nueva", 1.0),
    ("muy bueno", 0.9),
    ("very good", 0.9),
    ("reformado", 0.85),
    ("renovated", 0.85),
    ("bueno", 0.7),
    ("good", 0.7),
    ("a reformar", 0.4),
    ("needs renovation", 0.4),
    ("regular", 0.5),
    ("malo", 0.3),
    ("poor", 0.3),
];

pub fn condition(value: Option<&str>) -> f64 {
    let Some(value) = value else {
        return NEUTRAL;
    };
    let value = value.to_lowercase();
    CONDITIONS
        .iter()
        .find(|(needle, _)| value.contains(needle))
        .map_or(NEUTRAL, |(_, score)| *score)
}

/// Extra cost relative to the price: `1 - extra/price`, floored at zero.
pub fn cost_ratio(extra: Option<f64>, price: Option<f64>) -> f64 {
    match (usable(extra), usable(price)) {
        (Some(extra), Some(price)) if price > 0.0 => (1.0 - extra / price).max(0.0),
        _ => NEUTRAL,
    }
}

/// Freshness of the ad at the moment it was saved.
pub fn recency(published_at: Option<DateTime<Utc>>, reference: DateTime<Utc>) -> f64 {
    let Some(published_at) = published_at else {
        return NEUTRAL;
    };
    let days = (reference - published_at).num_days();
    match days {
        d if d <= 7 => 1.0,
        d if d <= 30 => 0.8,
        d if d <= 90 => 0.6,
        _ => 0.4,
    }
}
