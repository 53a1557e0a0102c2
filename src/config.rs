//! Conversion settings.
//!
//! Precedence: defaults, then a config file (explicit path or `GGML_SPLIT_CONFIG`),
//! then `GGML_SPLIT_PARTS`, then an explicit part count. Fields a config file omits
//! keep their defaults.

use crate::errors::{ConvertError, Result};
use crate::model::BlockLayouts;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Env var naming a JSON file with a [`SplitConfig`].
pub const CONFIG_ENV: &str = "GGML_SPLIT_CONFIG";
/// Env var overriding [`SplitConfig::parts`].
pub const PARTS_ENV: &str = "GGML_SPLIT_PARTS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Number of part files to produce.
    pub parts: usize,
    /// Block geometry of the quantized encodings.
    pub blocks: BlockLayouts,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            parts: 2,
            blocks: BlockLayouts::default(),
        }
    }
}

impl SplitConfig {
    pub fn with_parts(parts: usize) -> Self {
        Self {
            parts,
            ..Self::default()
        }
    }

    /// Load from a JSON file; missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            ConvertError::InvalidConfig(format!("{}: {}", path.display(), e))
        })
    }

    /// Build the effective config: defaults, then a config file (`config_path`, or
    /// the one named by `GGML_SPLIT_CONFIG`), then `GGML_SPLIT_PARTS`, then `parts`.
    pub fn resolve(config_path: Option<&Path>, parts: Option<usize>) -> Result<Self> {
        Self::resolve_with(config_path, parts, |key| std::env::var(key).ok())
    }

    /// [`SplitConfig::resolve`] with an explicit environment lookup.
    pub fn resolve_with(
        config_path: Option<&Path>,
        parts: Option<usize>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => {
                let mut config = Self::default();
                config.merge_env_file(&lookup)?;
                config
            }
        };
        config.merge_env_parts(&lookup)?;
        if let Some(n) = parts {
            config.parts = n;
        }
        config.validate()?;
        Ok(config)
    }

    /// Merge settings from the process environment.
    pub fn load_from_env(&mut self) -> Result<()> {
        self.merge_env(|key| std::env::var(key).ok())
    }

    /// Merge settings from `lookup`. A config file that does not exist is skipped
    /// with a warning; one that exists but does not parse is an error.
    pub fn merge_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        self.merge_env_file(&lookup)?;
        self.merge_env_parts(&lookup)
    }

    fn merge_env_file(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup(CONFIG_ENV).filter(|v| !v.is_empty()) {
            let path = PathBuf::from(path);
            if path.exists() {
                debug!(path = %path.display(), "loading split config");
                *self = Self::from_file(&path)?;
            } else {
                warn!(path = %path.display(), "{} points at a missing file, ignoring", CONFIG_ENV);
            }
        }
        Ok(())
    }

    fn merge_env_parts(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(parts) = lookup(PARTS_ENV).filter(|v| !v.is_empty()) {
            self.parts = parts.trim().parse().map_err(|_| {
                ConvertError::InvalidConfig(format!("{}={} is not a part count", PARTS_ENV, parts))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.parts == 0 {
            return Err(ConvertError::InvalidPartCount(self.parts));
        }
        self.blocks.validate()
    }
}
