//! Resolver configuration, loaded from an optional JSON file.

use crate::error::{IopsError, Result};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Minimum IOPS every server gets when the listing does not say otherwise
pub const DEFAULT_FREE_IOPS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub default_free_iops: u64,
    pub retry: RetryPolicy,
    /// Directory of `<location>.json` listings, or a single listing file
    pub capability_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_free_iops: DEFAULT_FREE_IOPS,
            retry: RetryPolicy::default(),
            capability_dir: None,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| IopsError::ConfigError(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from {}", path.display());

        let json = std::fs::read_to_string(path)
            .map_err(|e| IopsError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}
