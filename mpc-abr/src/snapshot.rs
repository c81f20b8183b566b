//! Client state handed to the engine once per chunk

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;

/// Snapshot of client state for the chunk about to be downloaded
///
/// Sizes are in kB, rates in kB/s, durations in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    /// Simulated seconds elapsed so far
    #[serde(default)]
    pub elapsed_seconds: f64,

    /// Measured throughput of the chunk just completed (0 when none yet)
    #[serde(default)]
    pub previous_throughput: f64,

    /// kB currently held in the client buffer
    #[serde(default)]
    pub buffer_fill: f64,

    /// Playback duration of a single chunk
    pub buffer_seconds_per_chunk: f64,

    /// Seconds of video left before the buffer runs dry
    pub buffer_seconds_until_empty: f64,

    /// Buffer capacity
    pub buffer_max_size: f64,

    /// Number of selectable quality levels
    pub quality_levels: usize,

    /// Cost of the next chunk at each level, strictly increasing
    pub quality_bitrates: Vec<f64>,

    /// Cost vectors for the chunks after the next one, nearest first.
    /// Shrinks to empty as the stream approaches its end.
    #[serde(default)]
    pub upcoming_quality_bitrates: Vec<Vec<f64>>,

    pub quality_coefficient: f64,
    pub variation_coefficient: f64,
    pub rebuffering_coefficient: f64,
}

impl ClientSnapshot {
    /// Number of future chunks that can be planned, capped at `max_horizon`
    pub fn horizon(&self, max_horizon: usize) -> usize {
        self.upcoming_quality_bitrates.len().min(max_horizon)
    }

    /// Cost of `level` at planning step `step` (0 = the next chunk)
    pub(crate) fn chunk_cost(&self, step: usize, level: usize) -> f64 {
        if step == 0 {
            self.quality_bitrates[level]
        } else {
            self.upcoming_quality_bitrates[step - 1][level]
        }
    }

    /// Check the snapshot is something the planner can search over.
    ///
    /// Upcoming cost vectors are only checked inside the planning horizon.
    pub fn validate(&self, max_horizon: usize) -> Result<(), SnapshotError> {
        if self.quality_levels == 0 {
            return Err(SnapshotError::NoQualityLevels);
        }
        if self.quality_bitrates.len() != self.quality_levels {
            return Err(SnapshotError::BitrateCountMismatch {
                expected: self.quality_levels,
                actual: self.quality_bitrates.len(),
            });
        }

        let scalars = [
            ("previous_throughput", self.previous_throughput),
            ("buffer_seconds_per_chunk", self.buffer_seconds_per_chunk),
            ("buffer_seconds_until_empty", self.buffer_seconds_until_empty),
            ("buffer_max_size", self.buffer_max_size),
            ("quality_coefficient", self.quality_coefficient),
            ("variation_coefficient", self.variation_coefficient),
            ("rebuffering_coefficient", self.rebuffering_coefficient),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(SnapshotError::NonFinite(name));
            }
        }

        for (level, pair) in self.quality_bitrates.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(SnapshotError::NonIncreasingBitrates { level: level + 1 });
            }
        }
        for (level, &cost) in self.quality_bitrates.iter().enumerate() {
            if !cost.is_finite() {
                return Err(SnapshotError::NonFinite("quality_bitrates"));
            }
            if cost <= 0.0 {
                return Err(SnapshotError::NonPositiveBitrate { level });
            }
        }

        for (index, costs) in self
            .upcoming_quality_bitrates
            .iter()
            .take(max_horizon)
            .enumerate()
        {
            if costs.len() != self.quality_levels {
                return Err(SnapshotError::UpcomingCountMismatch {
                    index,
                    expected: self.quality_levels,
                    actual: costs.len(),
                });
            }
            for (level, &cost) in costs.iter().enumerate() {
                if !cost.is_finite() {
                    return Err(SnapshotError::NonFinite("upcoming_quality_bitrates"));
                }
                if cost <= 0.0 {
                    return Err(SnapshotError::NonPositiveUpcomingBitrate { index, level });
                }
            }
        }

        Ok(())
    }
}
