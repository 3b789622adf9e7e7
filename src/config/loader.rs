//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading a bonus
//! configuration directory.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::{BonusConfig, BonusPolicy, LayoutConfig, OverrideTable};

/// Loads and provides access to the bonus configuration.
///
/// # Directory Structure
///
/// ```text
/// config/bonus_2025/
/// ├── policy.yaml     # Reference date, window, tolerance, tiers
/// ├── overrides.yaml  # Per-employee overrides (optional)
/// └── layouts.yaml    # Column layouts of every input workbook
/// ```
///
/// # Example
///
/// ```no_run
/// use bonus_recon::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/bonus_2025")?;
/// println!("Loaded policy: {}", loader.policy().name);
/// # Ok::<(), bonus_recon::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: BonusConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - `policy.yaml` or `layouts.yaml` is missing
    /// - Any file contains invalid YAML
    /// - The policy fails validation
    ///
    /// A missing `overrides.yaml` means no overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let policy = Self::load_yaml::<BonusPolicy>(&path.join("policy.yaml"))?;

        let overrides_path = path.join("overrides.yaml");
        let overrides = if overrides_path.exists() {
            Self::load_yaml::<OverrideTable>(&overrides_path)?
        } else {
            debug!(path = %overrides_path.display(), "No overrides file, using empty table");
            OverrideTable::default()
        };

        let layouts = Self::load_yaml::<LayoutConfig>(&path.join("layouts.yaml"))?;

        let config = BonusConfig::new(policy, overrides, layouts)?;
        Ok(Self { config })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: BonusConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &BonusConfig {
        &self.config
    }

    /// Returns the bonus policy.
    pub fn policy(&self) -> &BonusPolicy {
        self.config.policy()
    }
}
