use super::config::{AcceptanceRange, ScoringConfig};
use super::factors::Feature;

/// Validate a scoring configuration before it is saved.
/// Returns all validation errors at once (not just the first).
///
/// Importance levels are already restricted to 0/1/2 by their type, and
/// unset bounds are always acceptable. Unknown weight keys are not errors;
/// see [`unknown_weight_keys`].
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let prefix = config.category.as_str();

    let ranges = [
        ("price", &config.ranges.price),
        ("size", &config.ranges.size),
        ("rooms", &config.ranges.rooms),
        ("bathrooms", &config.ranges.bathrooms),
    ];
    for (name, range) in ranges {
        validate_range(&format!("{}.ranges.{}", prefix, name), range, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_range(path: &str, range: &AcceptanceRange, errors: &mut Vec<String>) {
    for (side, bound) in [("min", range.min), ("max", range.max)] {
        if let Some(value) = bound {
            if !value.is_finite() {
                errors.push(format!("{}.{}: must be a finite number", path, side));
            } else if value < 0.0 {
                errors.push(format!("{}.{}: must be non-negative, got {}", path, side, value));
            }
        }
    }

    if let (Some(min), Some(max)) = (range.min, range.max) {
        if min > max {
            errors.push(format!("{}: min ({}) is greater than max ({})", path, min, max));
        }
    }
}

/// Weight keys the calculator will ignore.
pub fn unknown_weight_keys(config: &ScoringConfig) -> Vec<&str> {
    config
        .weights
        .keys()
        .map(String::as_str)
        .filter(|key| !Feature::is_known(key))
        .collect()
}
