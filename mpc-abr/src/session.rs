//! Per-session decision state
//!
//! Owns everything that must survive from one chunk to the next: the
//! throughput history and the level chosen last time. One session covers
//! one simulated stream; call [`MpcSession::reset`] before reusing it.

use crate::config::MpcConfig;
use crate::error::{AbrError, ConfigError};
use crate::planner::{LookaheadPlanner, Plan};
use crate::predictor::ThroughputPredictor;
use crate::snapshot::ClientSnapshot;

/// Result of a single decision, with the reasoning behind it
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Level to download next
    pub quality: usize,
    /// Bandwidth estimate used for planning (kB/s, 0 if unknown)
    pub predicted_bandwidth: f64,
    /// Future chunks considered beyond the next one
    pub horizon: usize,
    /// Winning plan, absent when the safe default was used
    pub plan: Option<Plan>,
}

/// MPC bitrate selection session
#[derive(Debug, Clone)]
pub struct MpcSession {
    config: MpcConfig,
    predictor: ThroughputPredictor,
    planner: LookaheadPlanner,
    last_selected_quality: usize,
    decisions: u64,
}

impl MpcSession {
    /// Create a session with default tuning
    pub fn new() -> Self {
        Self::build(MpcConfig::default())
    }

    /// Create a session with custom tuning
    ///
    /// Returns an error if the config fails [`MpcConfig::validate`].
    pub fn with_config(config: MpcConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: MpcConfig) -> Self {
        Self {
            predictor: ThroughputPredictor::new(config.history_capacity, config.predictor),
            planner: LookaheadPlanner::new(config.max_horizon),
            config,
            last_selected_quality: 0,
            decisions: 0,
        }
    }

    /// Choose the quality level for the next chunk
    pub fn decide(&mut self, snapshot: &ClientSnapshot) -> Result<usize, AbrError> {
        self.decide_detailed(snapshot).map(|decision| decision.quality)
    }

    /// Choose the quality level for the next chunk and report why.
    ///
    /// A malformed snapshot is rejected before any session state changes.
    pub fn decide_detailed(&mut self, snapshot: &ClientSnapshot) -> Result<Decision, AbrError> {
        if let Err(e) = snapshot.validate(self.config.max_horizon) {
            tracing::warn!("Rejecting client snapshot: {}", e);
            return Err(e.into());
        }

        self.predictor.update(snapshot.previous_throughput);
        let predicted_bandwidth = self.predictor.estimate();
        let horizon = snapshot.horizon(self.config.max_horizon);

        let plan = self
            .planner
            .search(predicted_bandwidth, snapshot, self.last_selected_quality);
        let quality = plan.as_ref().and_then(Plan::first).unwrap_or(0);

        match &plan {
            Some(p) => tracing::debug!(
                chunk = self.decisions,
                bandwidth = predicted_bandwidth,
                horizon,
                quality,
                score = p.score,
                rebuffer = p.rebuffer_seconds,
                "Selected quality"
            ),
            None => tracing::debug!(
                chunk = self.decisions,
                "No bandwidth estimate, using lowest quality"
            ),
        }

        self.last_selected_quality = quality;
        self.decisions += 1;

        Ok(Decision {
            quality,
            predicted_bandwidth,
            horizon,
            plan,
        })
    }

    /// Reset to initial state
    ///
    /// Call this at the start of every new simulation run.
    pub fn reset(&mut self) {
        tracing::info!(decisions = self.decisions, "Resetting MPC session");
        self.predictor.clear();
        self.last_selected_quality = 0;
        self.decisions = 0;
    }

    /// Level chosen by the previous decision (0 before the first)
    pub fn last_selected_quality(&self) -> usize {
        self.last_selected_quality
    }

    /// Current bandwidth estimate without recording a new sample
    pub fn predicted_bandwidth(&self) -> f64 {
        self.predictor.estimate()
    }

    /// Number of decisions made since the session started or was reset
    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    pub fn predictor(&self) -> &ThroughputPredictor {
        &self.predictor
    }

    pub fn config(&self) -> &MpcConfig {
        &self.config
    }
}

impl Default for MpcSession {
    fn default() -> Self {
        Self::new()
    }
}
