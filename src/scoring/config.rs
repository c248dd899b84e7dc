use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::listing::Category;

/// How much an attribute matters when ranking.
///
/// Serialized as the bare integer level (0, 1 or 2); any other integer is
/// rejected when the config is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Importance {
    Irrelevant = 0,
    Valuable = 1,
    Essential = 2,
}

impl Importance {
    pub fn weight(self) -> f64 {
        u8::from(self) as f64
    }
}

impl TryFrom<u8> for Importance {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Importance::Irrelevant),
            1 => Ok(Importance::Valuable),
            2 => Ok(Importance::Essential),
            other => Err(format!(
                "importance must be 0 (irrelevant), 1 (valuable) or 2 (essential), got {}",
                other
            )),
        }
    }
}

impl From<Importance> for u8 {
    fn from(value: Importance) -> Self {
        value as u8
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Importance::Irrelevant => f.write_str("irrelevant"),
            Importance::Valuable => f.write_str("valuable"),
            Importance::Essential => f.write_str("essential"),
        }
    }
}

/// Acceptance range for one numeric attribute. An unset bound means no limit
/// on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcceptanceRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl AcceptanceRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Concrete bounds. An unset min is `0`; an unset max is `upper_sentinel`,
    /// raised to twice the min when the min already reaches past it.
    pub fn resolve(&self, upper_sentinel: f64) -> (f64, f64) {
        let min = self.min.unwrap_or(0.0);
        let max = self.max.unwrap_or_else(|| upper_sentinel.max(min * 2.0));
        (min, max)
    }
}

impl fmt::Display for AcceptanceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_bound = |b: Option<f64>| b.map_or_else(|| "*".to_string(), |v| format!("{}", v));
        write!(f, "{}-{}", fmt_bound(self.min), fmt_bound(self.max))
    }
}

/// The four numeric ranges a config can constrain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcceptanceRanges {
    #[serde(default)]
    pub price: AcceptanceRange,
    #[serde(default)]
    pub size: AcceptanceRange,
    #[serde(default)]
    pub rooms: AcceptanceRange,
    #[serde(default)]
    pub bathrooms: AcceptanceRange,
}

impl AcceptanceRanges {
    pub fn get_mut(&mut self, field: &str) -> Option<&mut AcceptanceRange> {
        match field {
            "price" => Some(&mut self.price),
            "size" => Some(&mut self.size),
            "rooms" => Some(&mut self.rooms),
            "bathrooms" => Some(&mut self.bathrooms),
            _ => None,
        }
    }
}

/// Scoring configuration for one listing category.
///
/// Example YAML:
/// ```yaml
/// category: dwelling
/// weights:
///   price: 2
///   parking: 2
///   elevator: 1
///   roommates: 0
/// ranges:
///   price: { min: 400, max: 1200 }
///   size: { min: 50 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    pub category: Category,

    /// Attribute key -> importance. Missing keys count as irrelevant, unknown
    /// keys are ignored by the calculator.
    #[serde(default)]
    pub weights: BTreeMap<String, Importance>,

    #[serde(default)]
    pub ranges: AcceptanceRanges,
}

impl ScoringConfig {
    /// Built-in preset for a category.
    pub fn default_for(category: Category) -> Self {
        match category {
            Category::Dwelling => dwelling_preset(),
            Category::RoomShare => room_share_preset(),
        }
    }

    pub fn importance(&self, key: &str) -> Importance {
        self.weights
            .get(key)
            .copied()
            .unwrap_or(Importance::Irrelevant)
    }

    pub fn set_importance(&mut self, key: impl Into<String>, importance: Importance) {
        self.weights.insert(key.into(), importance);
    }
}

fn weights(entries: &[(&str, Importance)]) -> BTreeMap<String, Importance> {
    entries
        .iter()
        .map(|(key, importance)| (key.to_string(), *importance))
        .collect()
}

fn dwelling_preset() -> ScoringConfig {
    use Importance::*;
    ScoringConfig {
        category: Category::Dwelling,
        weights: weights(&[
            ("price", Essential),
            ("size", Valuable),
            ("rooms", Essential),
            ("bathrooms", Valuable),
            ("parking", Essential),
            ("elevator", Valuable),
            ("heating", Valuable),
            ("air_conditioning", Valuable),
            ("terrace", Valuable),
            ("balcony", Irrelevant),
            ("exterior", Valuable),
            ("garage", Valuable),
            ("storage_room", Valuable),
            ("built_in_wardrobes", Valuable),
            ("furnished", Irrelevant),
            ("pool", Irrelevant),
            ("garden", Irrelevant),
            ("pets_allowed", Irrelevant),
            ("window", Irrelevant),
            ("orientation", Valuable),
            ("energy_rating", Valuable),
            ("condition", Valuable),
            ("deposit", Valuable),
            ("maintenance_fee", Valuable),
            ("recency", Irrelevant),
            ("gender_preference", Irrelevant),
            ("roommates", Irrelevant),
            ("private_bathroom", Irrelevant),
        ]),
        ranges: AcceptanceRanges {
            price: AcceptanceRange::new(400.0, 1200.0),
            size: AcceptanceRange::new(50.0, 150.0),
            rooms: AcceptanceRange::new(1.0, 4.0),
            bathrooms: AcceptanceRange::new(1.0, 3.0),
        },
    }
}

fn room_share_preset() -> ScoringConfig {
    use Importance::*;
    ScoringConfig {
        category: Category::RoomShare,
        weights: weights(&[
            ("price", Essential),
            ("size", Valuable),
            ("rooms", Irrelevant),
            ("bathrooms", Irrelevant),
            ("roommates", Essential),
            ("private_bathroom", Essential),
            ("window", Essential),
            ("gender_preference", Valuable),
            ("furnished", Valuable),
            ("heating", Valuable),
            ("air_conditioning", Valuable),
            ("elevator", Valuable),
            ("exterior", Irrelevant),
            ("terrace", Irrelevant),
            ("balcony", Irrelevant),
            ("pets_allowed", Irrelevant),
            ("parking", Irrelevant),
            ("garage", Irrelevant),
            ("storage_room", Irrelevant),
            ("built_in_wardrobes", Irrelevant),
            ("pool", Irrelevant),
            ("garden", Irrelevant),
            ("orientation", Irrelevant),
            ("energy_rating", Irrelevant),
            ("condition", Valuable),
            ("deposit", Valuable),
            ("maintenance_fee", Irrelevant),
            ("recency", Irrelevant),
        ]),
        ranges: AcceptanceRanges {
            price: AcceptanceRange::new(300.0, 800.0),
            size: AcceptanceRange::new(10.0, 40.0),
            rooms: AcceptanceRange::new(1.0, 1.0),
            bathrooms: AcceptanceRange::new(1.0, 2.0),
        },
    }
}
