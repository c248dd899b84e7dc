use async_trait::async_trait;
use atomic_write_file::AtomicWriteFile;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::types::{ListingState, ScoringState, CURRENT_VERSION};
use super::{ListingStore, StoreError};
use crate::listing::{Category, Listing};
use crate::scoring::{validate_scoring, ScoringConfig};

const LISTINGS_FILE: &str = "listings.json";
const SCORING_FILE: &str = "scoring.yaml";

/// File-backed store: listings as JSON, scoring configs as YAML, both written
/// atomically so a failed save leaves the previous contents intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn listings_path(&self) -> PathBuf {
        self.dir.join(LISTINGS_FILE)
    }

    pub fn scoring_path(&self) -> PathBuf {
        self.dir.join(SCORING_FILE)
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }

    fn load_listing_state(&self) -> Result<ListingState, StoreError> {
        let path = self.listings_path();
        if !path.exists() {
            return Ok(ListingState::new());
        }

        let file = File::open(&path)?;
        let state: ListingState = serde_json::from_reader(file)?;

        if state.version != CURRENT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                file: LISTINGS_FILE,
                version: state.version,
            });
        }
        Ok(state)
    }

    fn load_scoring_state(&self) -> Result<ScoringState, StoreError> {
        let path = self.scoring_path();
        if !path.exists() {
            return Ok(ScoringState::new());
        }

        let content = fs::read_to_string(&path)?;
        let state: ScoringState =
            serde_saphyr::from_str(&content).map_err(|e| StoreError::Yaml(e.to_string()))?;

        if state.version != CURRENT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                file: SCORING_FILE,
                version: state.version,
            });
        }
        Ok(state)
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = AtomicWriteFile::open(path)?;
    file.write_all(bytes)?;
    file.commit()?;
    Ok(())
}

#[async_trait]
impl ListingStore for JsonFileStore {
    async fn get_all(&self) -> Result<Vec<Listing>, StoreError> {
        Ok(self.load_listing_state()?.listings)
    }

    async fn save_all(&self, listings: &[Listing]) -> Result<(), StoreError> {
        self.ensure_dir()?;
        let state = ListingState {
            version: CURRENT_VERSION,
            listings: listings.to_vec(),
        };
        let bytes = serde_json::to_vec_pretty(&state)?;
        write_atomically(&self.listings_path(), &bytes)?;
        tracing::debug!(count = listings.len(), path = %self.listings_path().display(), "saved listings");
        Ok(())
    }

    async fn get_config(&self, category: Category) -> Result<ScoringConfig, StoreError> {
        let state = self.load_scoring_state()?;
        let Some(config) = state.get(category) else {
            return Ok(ScoringConfig::default_for(category));
        };

        validate_scoring(config).map_err(|errors| StoreError::InvalidConfig { category, errors })?;
        Ok(config.clone())
    }

    async fn save_config(&self, config: &ScoringConfig) -> Result<(), StoreError> {
        self.ensure_dir()?;
        let mut state = self.load_scoring_state()?;
        state.upsert(config.clone());

        let yaml = serde_saphyr::to_string(&state).map_err(|e| StoreError::Yaml(e.to_string()))?;
        write_atomically(&self.scoring_path(), yaml.as_bytes())?;
        tracing::debug!(category = %config.category, "saved scoring config");
        Ok(())
    }
}
