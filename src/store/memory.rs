use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{ListingStore, StoreError};
use crate::listing::{Category, Listing};
use crate::scoring::ScoringConfig;

/// Volatile store for tests and embedding. Writes can be made to fail on
/// demand to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    listings: Mutex<Vec<Listing>>,
    configs: Mutex<BTreeMap<Category, ScoringConfig>>,
    fail_listing_writes: AtomicBool,
    fail_config_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(listings: Vec<Listing>) -> Self {
        Self {
            listings: Mutex::new(listings),
            ..Self::default()
        }
    }

    /// Make every subsequent `save_all`/`save_config` fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.set_fail_listing_writes(fail);
        self.set_fail_config_writes(fail);
    }

    pub fn set_fail_listing_writes(&self, fail: bool) {
        self.fail_listing_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_config_writes(&self, fail: bool) {
        self.fail_config_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_writable(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn get_all(&self) -> Result<Vec<Listing>, StoreError> {
        Ok(self.listings.lock().map_err(|_| poisoned())?.clone())
    }

    async fn save_all(&self, listings: &[Listing]) -> Result<(), StoreError> {
        Self::check_writable(&self.fail_listing_writes)?;
        *self.listings.lock().map_err(|_| poisoned())? = listings.to_vec();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_config(&self, category: Category) -> Result<ScoringConfig, StoreError> {
        let configs = self.configs.lock().map_err(|_| poisoned())?;
        Ok(configs
            .get(&category)
            .cloned()
            .unwrap_or_else(|| ScoringConfig::default_for(category)))
    }

    async fn save_config(&self, config: &ScoringConfig) -> Result<(), StoreError> {
        Self::check_writable(&self.fail_config_writes)?;
        self.configs
            .lock()
            .map_err(|_| poisoned())?
            .insert(config.category, config.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
