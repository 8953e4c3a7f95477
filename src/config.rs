//! Construction-time engine configuration.
//!
//! Mirrors the plain-struct-with-serde configuration already used in this
//! codebase's source layer (`SourceConfig`): a small, directly constructible
//! options bag rather than a config-file-loading layer. The engine never
//! reads environment variables or config files itself — that belongs to the
//! external front-ends, out of scope for this core.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::data_store::DEFAULT_CONVERSION_FACTOR;

/// Options supplied when constructing a [`crate::orchestrator::RepricingEngine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory containing the normalized JSON reference files (§6).
    pub data_directory: PathBuf,

    /// Overrides the plan-year PFS conversion factor (defaults to 32.35).
    #[serde(default)]
    pub conversion_factor_override: Option<f64>,
}

impl EngineConfig {
    /// Construct a configuration pointing at `data_directory` with the
    /// default (unoverridden) conversion factor.
    pub fn new(data_directory: impl Into<PathBuf>) -> Self {
        Self {
            data_directory: data_directory.into(),
            conversion_factor_override: None,
        }
    }

    pub fn with_conversion_factor(mut self, factor: f64) -> Self {
        self.conversion_factor_override = Some(factor);
        self
    }

    /// The effective PFS conversion factor: the override if set, else the
    /// plan-year default.
    pub fn conversion_factor(&self) -> f64 {
        self.conversion_factor_override
            .unwrap_or(DEFAULT_CONVERSION_FACTOR)
    }
}

impl Default for EngineConfig {
    /// An empty `data_directory`. Not usable on its own — engine
    /// construction rejects an empty path — but convenient as a base for
    /// `..Default::default()` struct-update syntax in callers that set
    /// `data_directory` themselves.
    fn default() -> Self {
        Self {
            data_directory: PathBuf::new(),
            conversion_factor_override: None,
        }
    }
}
