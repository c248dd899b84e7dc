use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application settings from `config.yaml`. Every field is optional.
///
/// Example YAML:
/// ```yaml
/// data_dir: ~/Documents/pisos
/// log: "listing_rank=debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where listings.json and scoring.yaml live (default: the config dir)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Default tracing filter, overridden by LISTING_RANK_LOG
    #[serde(default)]
    pub log: Option<String>,
}
