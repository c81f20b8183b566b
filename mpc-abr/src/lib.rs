//! Model-Predictive Bitrate Selection for Chunked Video Streaming
//!
//! Picks the quality level of the next chunk by predicting throughput from
//! recent measurements and searching every quality sequence over a short
//! horizon for the best simulated Quality of Experience.
//!
//! # Components
//!
//! - [`config`]: Engine tuning and TOML loading
//! - [`snapshot`]: Client state supplied with every decision
//! - [`predictor`]: Harmonic-mean throughput prediction
//! - [`sequences`]: Candidate quality sequence generation
//! - [`planner`]: QoE simulation and lookahead search
//! - [`session`]: Persistent per-stream state and the decision entry point

mod config;
mod error;
mod planner;
mod predictor;
mod sequences;
mod session;
mod snapshot;

pub use config::{MpcConfig, PredictorMode};
pub use error::{AbrError, ConfigError, SnapshotError};
pub use planner::{LookaheadPlanner, Plan};
pub use predictor::ThroughputPredictor;
pub use sequences::QualitySequences;
pub use session::{Decision, MpcSession};
pub use snapshot::ClientSnapshot;
