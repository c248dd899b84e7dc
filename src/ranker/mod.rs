//! Keeps stored listing scores in step with the active scoring configs.
//!
//! Every mutation goes through [`Ranker`], which holds a single write lock so
//! a recalculation never interleaves with an add, visit or removal. Each
//! change is staged in memory and committed with one `save_all`; observers
//! hear about it only after the commit succeeded.

pub mod observer;

pub use observer::{ChannelObserver, LogObserver, ScoreObserver};

use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::listing::{Category, Listing, VisitRecord};
use crate::scoring::{compute_score, unknown_weight_keys, validate_scoring, ScoringConfig};
use crate::store::{ListingStore, StoreError};

#[derive(Debug, Error)]
pub enum RankError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("listing not found: {0}")]
    NotFound(String),
    #[error("invalid {category} scoring config: {}", .errors.join("; "))]
    InvalidConfig {
        category: Category,
        errors: Vec<String>,
    },
}

type ConfigSet = BTreeMap<Category, ScoringConfig>;

pub struct Ranker<S> {
    store: S,
    write_lock: Mutex<()>,
    observers: Vec<Box<dyn ScoreObserver>>,
}

impl<S: ListingStore> Ranker<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl ScoreObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored listings in ranked order.
    pub async fn listings(&self) -> Result<Vec<Listing>, RankError> {
        Ok(self.store.get_all().await?)
    }

    pub async fn config(&self, category: Category) -> Result<ScoringConfig, RankError> {
        Ok(self.store.get_config(category).await?)
    }

    /// Re-score every stored listing under the current configs, re-rank and
    /// persist. Running it twice without a config change is a no-op on
    /// scores and order.
    pub async fn recalculate_all(&self) -> Result<Vec<Listing>, RankError> {
        let _guard = self.write_lock.lock().await;
        self.recalculate_locked().await
    }

    /// Validate and persist `config`, then recalculate everything under it.
    ///
    /// The re-ranked listings are written before the config. If the config
    /// write then fails, the previous listings are written back, so stored
    /// scores always match the stored config.
    pub async fn save_config(&self, config: ScoringConfig) -> Result<Vec<Listing>, RankError> {
        validate_scoring(&config).map_err(|errors| RankError::InvalidConfig {
            category: config.category,
            errors,
        })?;

        let _guard = self.write_lock.lock().await;
        let configs = self.load_configs(Some(&config)).await?;
        let previous = self.store.get_all().await?;
        let mut listings = previous.clone();
        rescore(&mut listings, &configs);

        self.store.save_all(&listings).await?;
        if let Err(err) = self.store.save_config(&config).await {
            if let Err(restore) = self.store.save_all(&previous).await {
                tracing::error!(error = %restore, "could not restore listings after failed config save");
            }
            return Err(err.into());
        }

        tracing::info!(category = %config.category, count = listings.len(), "scoring config saved");
        self.notify(&listings);
        Ok(listings)
    }

    /// Put a category back on its built-in preset.
    pub async fn reset_config(&self, category: Category) -> Result<Vec<Listing>, RankError> {
        self.save_config(ScoringConfig::default_for(category)).await
    }

    /// Score and store newly extracted listings. A listing whose id is
    /// already stored replaces it in place, keeping its history and the time
    /// it was first saved.
    pub async fn add_listings(&self, incoming: Vec<Listing>) -> Result<Vec<Listing>, RankError> {
        let _guard = self.write_lock.lock().await;
        let configs = self.load_configs(None).await?;
        let mut listings = self.store.get_all().await?;

        for mut listing in incoming {
            listing.score = score_with(&listing, &configs);
            match listings.iter_mut().find(|l| l.id == listing.id) {
                Some(existing) => {
                    listing.history = std::mem::take(&mut existing.history);
                    listing.created_at = existing.created_at;
                    tracing::debug!(id = %listing.id, score = listing.score, "replacing listing");
                    *existing = listing;
                }
                None => {
                    tracing::debug!(id = %listing.id, score = listing.score, "adding listing");
                    listings.push(listing);
                }
            }
        }

        rank(&mut listings);
        self.commit(listings).await
    }

    /// Append a visit/contact record to a listing's history.
    pub async fn record_visit(&self, id: &str, record: VisitRecord) -> Result<Listing, RankError> {
        let _guard = self.write_lock.lock().await;
        let mut listings = self.store.get_all().await?;

        let listing = listings
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| RankError::NotFound(id.to_string()))?;
        listing.history.push(record);
        let updated = listing.clone();

        self.commit(listings).await?;
        Ok(updated)
    }

    pub async fn remove_listing(&self, id: &str) -> Result<Listing, RankError> {
        let _guard = self.write_lock.lock().await;
        let mut listings = self.store.get_all().await?;

        let index = listings
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| RankError::NotFound(id.to_string()))?;
        let removed = listings.remove(index);

        self.commit(listings).await?;
        Ok(removed)
    }

    /// Remove every listing. Returns how many were dropped.
    pub async fn clear(&self) -> Result<usize, RankError> {
        let _guard = self.write_lock.lock().await;
        let count = self.store.get_all().await?.len();
        self.commit(Vec::new()).await?;
        Ok(count)
    }

    async fn recalculate_locked(&self) -> Result<Vec<Listing>, RankError> {
        let configs = self.load_configs(None).await?;
        let mut listings = self.store.get_all().await?;
        rescore(&mut listings, &configs);

        let listings = self.commit(listings).await?;
        tracing::info!(count = listings.len(), "recalculated scores");
        Ok(listings)
    }

    /// Active config of every category, with `replacing` standing in for the
    /// stored one of its category.
    async fn load_configs(&self, replacing: Option<&ScoringConfig>) -> Result<ConfigSet, RankError> {
        let mut configs = ConfigSet::new();
        for category in Category::ALL {
            let config = match replacing {
                Some(config) if config.category == category => config.clone(),
                _ => self.store.get_config(category).await?,
            };
            for key in unknown_weight_keys(&config) {
                tracing::warn!(%category, key, "unknown weight key will be ignored");
            }
            configs.insert(category, config);
        }
        Ok(configs)
    }

    /// Persist the staged collection in one write, then notify observers.
    async fn commit(&self, listings: Vec<Listing>) -> Result<Vec<Listing>, RankError> {
        self.store.save_all(&listings).await?;
        self.notify(&listings);
        Ok(listings)
    }

    fn notify(&self, listings: &[Listing]) {
        for observer in &self.observers {
            observer.notify(listings);
        }
    }
}

fn rescore(listings: &mut [Listing], configs: &ConfigSet) {
    for listing in listings.iter_mut() {
        let score = score_with(listing, configs);
        if score != listing.score {
            tracing::debug!(id = %listing.id, from = listing.score, to = score, "score changed");
        }
        listing.score = score;
    }
    rank(listings);
}

fn score_with(listing: &Listing, configs: &ConfigSet) -> u8 {
    match configs.get(&listing.category) {
        Some(config) => compute_score(listing, config),
        None => compute_score(listing, &ScoringConfig::default_for(listing.category)),
    }
}

/// Highest score first; equal scores keep their stored order.
pub fn rank(listings: &mut [Listing]) {
    listings.sort_by(|a, b| b.score.cmp(&a.score));
}
