use serde::{Deserialize, Serialize};

use crate::listing::{Category, Listing};
use crate::scoring::ScoringConfig;

pub const CURRENT_VERSION: u32 = 1;

/// On-disk shape of `listings.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingState {
    pub version: u32,
    #[serde(default)]
    pub listings: Vec<Listing>,
}

impl Default for ListingState {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingState {
    pub fn new() -> Self {
        Self {
            version: CURRENT_VERSION,
            listings: Vec::new(),
        }
    }
}

/// On-disk shape of `scoring.yaml`: at most one config per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringState {
    pub version: u32,
    #[serde(default)]
    pub configs: Vec<ScoringConfig>,
}

impl Default for ScoringState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringState {
    pub fn new() -> Self {
        Self {
            version: CURRENT_VERSION,
            configs: Vec::new(),
        }
    }

    pub fn get(&self, category: Category) -> Option<&ScoringConfig> {
        self.configs.iter().find(|c| c.category == category)
    }

    /// Insert or replace the config for its category.
    pub fn upsert(&mut self, config: ScoringConfig) {
        match self.configs.iter_mut().find(|c| c.category == config.category) {
            Some(existing) => *existing = config,
            None => {
                self.configs.push(config);
                self.configs.sort_by_key(|c| c.category);
            }
        }
    }
}
