//! Configuration types for the MPC engine

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How the throughput predictor turns its history into an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PredictorMode {
    /// Harmonic mean of the recent samples
    #[default]
    HarmonicMean,

    /// Harmonic mean discounted by the worst recent relative prediction error.
    /// Good for: links with sudden throughput drops
    Robust,
}

/// Engine tuning
///
/// QoE weights are not part of this; they arrive with every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpcConfig {
    /// Maximum number of future chunks planned beyond the next one (default: 5)
    #[serde(default = "default_max_horizon")]
    pub max_horizon: usize,

    /// Number of throughput samples kept for prediction (default: 5)
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Prediction strategy
    #[serde(default)]
    pub predictor: PredictorMode,
}

fn default_max_horizon() -> usize {
    5
}

fn default_history_capacity() -> usize {
    5
}

impl Default for MpcConfig {
    fn default() -> Self {
        Self {
            max_horizon: default_max_horizon(),
            history_capacity: default_history_capacity(),
            predictor: PredictorMode::default(),
        }
    }
}

impl MpcConfig {
    /// Parse and validate a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Set the prediction strategy (builder pattern)
    pub fn with_predictor(mut self, predictor: PredictorMode) -> Self {
        self.predictor = predictor;
        self
    }

    /// Set the lookahead horizon (builder pattern)
    pub fn with_max_horizon(mut self, max_horizon: usize) -> Self {
        self.max_horizon = max_horizon;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
