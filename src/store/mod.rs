pub mod json;
pub mod memory;
pub mod types;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use types::{ListingState, ScoringState};

use async_trait::async_trait;
use thiserror::Error;

use crate::listing::{Category, Listing};
use crate::scoring::ScoringConfig;

/// Persistence for listings and per-category scoring configuration.
///
/// `save_all` replaces the whole collection in one step; implementations
/// must never leave a partially written collection behind.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Listing>, StoreError>;

    async fn save_all(&self, listings: &[Listing]) -> Result<(), StoreError>;

    /// The stored config for `category`, or the built-in preset if none was
    /// ever saved.
    async fn get_config(&self, category: Category) -> Result<ScoringConfig, StoreError>;

    async fn save_config(&self, config: &ScoringConfig) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid listing data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid scoring data: {0}")]
    Yaml(String),
    #[error("unsupported {file} version: {version}")]
    UnsupportedVersion { file: &'static str, version: u32 },
    #[error("stored {category} scoring config is invalid: {}", .errors.join("; "))]
    InvalidConfig {
        category: Category,
        errors: Vec<String>,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
