//! Error types for the bitrate selection engine

use thiserror::Error;

/// A malformed client snapshot.
///
/// These indicate a harness bug rather than a runtime condition, so the
/// decision is rejected instead of guessed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    #[error("Snapshot has no quality levels")]
    NoQualityLevels,

    #[error("Expected {expected} quality bitrates, got {actual}")]
    BitrateCountMismatch { expected: usize, actual: usize },

    #[error("Upcoming chunk {index} has {actual} bitrates, expected {expected}")]
    UpcomingCountMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Bitrate for quality level {level} is not positive")]
    NonPositiveBitrate { level: usize },

    #[error("Bitrate for quality level {level} does not exceed the level below it")]
    NonIncreasingBitrates { level: usize },

    #[error("Bitrate for quality level {level} of upcoming chunk {index} is not positive")]
    NonPositiveUpcomingBitrate { index: usize, level: usize },

    #[error("Non-finite value in field: {0}")]
    NonFinite(&'static str),

    #[error("Sequence of {steps} steps exceeds the {available} chunks with cost data")]
    SequenceTooLong { steps: usize, available: usize },

    #[error("Quality level {level} is outside 0..{levels}")]
    LevelOutOfRange { level: usize, levels: usize },
}

#[derive(Debug, Error)]
pub enum AbrError {
    #[error("Invalid client snapshot: {0}")]
    InvalidSnapshot(#[from] SnapshotError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config not found: {0}")]
    NotFound(String),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
