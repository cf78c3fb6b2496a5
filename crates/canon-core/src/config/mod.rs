//! Configuration for every subsystem, loadable from TOML.
//!
//! Every section is `#[serde(default)]`, so a partial file only overrides
//! the keys it names.

pub mod consolidation_config;
pub mod defaults;
pub mod guard_config;
pub mod learning_config;
pub mod observability_config;
pub mod resilience_config;
pub mod source_config;
pub mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use consolidation_config::ConsolidationConfig;
pub use guard_config::GuardConfig;
pub use learning_config::LearningConfig;
pub use observability_config::ObservabilityConfig;
pub use resilience_config::ResilienceConfig;
pub use source_config::{SourceConfig, SourceWeights};
pub use storage_config::StorageConfig;

use crate::errors::{CanonError, CanonResult};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonConfig {
    pub guard: GuardConfig,
    pub resilience: ResilienceConfig,
    pub sources: SourceConfig,
    pub consolidation: ConsolidationConfig,
    pub storage: StorageConfig,
    pub learning: LearningConfig,
    pub observability: ObservabilityConfig,
}

impl CanonConfig {
    /// Parse a TOML document. Missing sections and keys take their defaults.
    pub fn from_toml(toml_str: &str) -> CanonResult<Self> {
        toml::from_str(toml_str).map_err(|e| CanonError::ConfigError {
            reason: e.to_string(),
        })
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> CanonResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CanonError::ConfigError {
            reason: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_toml(&contents)
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> CanonResult<String> {
        toml::to_string(self).map_err(|e| CanonError::ConfigError {
            reason: e.to_string(),
        })
    }
}
