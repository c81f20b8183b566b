//! Bounded-horizon lookahead planning
//!
//! Every quality sequence over the horizon is simulated against the
//! predicted bandwidth and scored by QoE. Only the first level of the best
//! plan is committed; the search is redone from fresh state every chunk.

use crate::error::SnapshotError;
use crate::sequences::QualitySequences;
use crate::snapshot::ClientSnapshot;

/// Outcome of simulating one candidate sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Levels for the next chunk and each planned future chunk
    pub sequence: Vec<usize>,
    /// Cumulative QoE over the sequence
    pub score: f64,
    /// Total simulated stall time
    pub rebuffer_seconds: f64,
}

impl Plan {
    /// Level to download next
    pub fn first(&self) -> Option<usize> {
        self.sequence.first().copied()
    }
}

/// Searches quality sequences for the best predicted QoE
#[derive(Debug, Clone)]
pub struct LookaheadPlanner {
    max_horizon: usize,
}

impl LookaheadPlanner {
    pub fn new(max_horizon: usize) -> Self {
        Self { max_horizon }
    }

    pub fn max_horizon(&self) -> usize {
        self.max_horizon
    }

    /// Find the best plan for the snapshot.
    ///
    /// Returns `Ok(None)` when there is no usable bandwidth estimate; callers
    /// fall back to level 0. On exactly equal scores the first sequence in
    /// [`QualitySequences`] order wins.
    pub fn plan(
        &self,
        bandwidth: f64,
        snapshot: &ClientSnapshot,
        last_quality: usize,
    ) -> Result<Option<Plan>, SnapshotError> {
        snapshot.validate(self.max_horizon)?;
        Ok(self.search(bandwidth, snapshot, last_quality))
    }

    /// Search without validating; the snapshot must already have passed
    /// `validate(self.max_horizon)`.
    pub(crate) fn search(
        &self,
        bandwidth: f64,
        snapshot: &ClientSnapshot,
        last_quality: usize,
    ) -> Option<Plan> {
        if !(bandwidth.is_finite() && bandwidth > 0.0) {
            return None;
        }

        let horizon = snapshot.horizon(self.max_horizon);
        let candidates = QualitySequences::new(snapshot.quality_levels, horizon + 1);
        tracing::trace!(
            horizon,
            candidates = candidates.total(),
            "Searching quality sequences"
        );

        let mut best: Option<Plan> = None;
        for sequence in candidates {
            let plan = Self::score(sequence, bandwidth, snapshot, last_quality);
            // Strict comparison keeps the earliest sequence on ties
            if best.as_ref().map_or(true, |b| plan.score > b.score) {
                best = Some(plan);
            }
        }
        best
    }

    /// Score a single sequence starting from the snapshot's buffer.
    ///
    /// Rejects sequences longer than the available cost data or containing
    /// levels outside `0..quality_levels`.
    pub fn simulate(
        sequence: Vec<usize>,
        bandwidth: f64,
        snapshot: &ClientSnapshot,
        last_quality: usize,
    ) -> Result<Plan, SnapshotError> {
        let available = snapshot.upcoming_quality_bitrates.len() + 1;
        if sequence.len() > available {
            return Err(SnapshotError::SequenceTooLong {
                steps: sequence.len(),
                available,
            });
        }
        snapshot.validate(sequence.len().saturating_sub(1))?;
        if let Some(&level) = sequence.iter().find(|&&l| l >= snapshot.quality_levels) {
            return Err(SnapshotError::LevelOutOfRange {
                level,
                levels: snapshot.quality_levels,
            });
        }

        Ok(Self::score(sequence, bandwidth, snapshot, last_quality))
    }

    fn score(
        sequence: Vec<usize>,
        bandwidth: f64,
        snapshot: &ClientSnapshot,
        last_quality: usize,
    ) -> Plan {
        let mut buffer = snapshot.buffer_seconds_until_empty;
        let mut previous = last_quality;
        let mut score = 0.0;
        let mut rebuffer_seconds = 0.0;

        for (step, &level) in sequence.iter().enumerate() {
            let download_time = snapshot.chunk_cost(step, level) / bandwidth;
            let rebuffer = (download_time - buffer).max(0.0);

            buffer = ((buffer - download_time).max(0.0) + snapshot.buffer_seconds_per_chunk)
                .min(snapshot.buffer_max_size);

            score += level as f64 * snapshot.quality_coefficient
                - level.abs_diff(previous) as f64 * snapshot.variation_coefficient
                - rebuffer * snapshot.rebuffering_coefficient;
            rebuffer_seconds += rebuffer;
            previous = level;
        }

        Plan {
            sequence,
            score,
            rebuffer_seconds,
        }
    }
}

impl Default for LookaheadPlanner {
    fn default() -> Self {
        Self::new(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::tests::test_snapshot;

    #[test]
    fn test_no_bandwidth_no_plan() {
        let planner = LookaheadPlanner::default();
        let snapshot = test_snapshot();

        assert_eq!(planner.plan(0.0, &snapshot, 0), Ok(None));
        assert_eq!(planner.plan(-10.0, &snapshot, 0), Ok(None));
        assert_eq!(planner.plan(f64::NAN, &snapshot, 0), Ok(None));
    }

    #[test]
    fn test_worked_example_single_step() {
        // bandwidth 200, buffer 10, last level 1, coefficients (1, 1, 3):
        //   level 0: 0 - 1 - 0 = -1
        //   level 1: 1 - 0 - 0 =  1
        //   level 2: 2 - 1 - 0 =  1  (2s download, no stall)
        // Levels 1 and 2 tie; level 1 is enumerated first.
        let planner = LookaheadPlanner::default();
        let snapshot = test_snapshot();

        let scores: Vec<f64> = (0..3)
            .map(|level| {
                LookaheadPlanner::simulate(vec![level], 200.0, &snapshot, 1)
                    .expect("valid sequence")
                    .score
            })
            .collect();
        assert_eq!(scores, vec![-1.0, 1.0, 1.0]);

        let plan = planner
            .plan(200.0, &snapshot, 1)
            .expect("valid snapshot")
            .expect("plan expected");
        assert_eq!(plan.sequence, vec![1]);
        assert_eq!(plan.score, 1.0);
        assert_eq!(plan.rebuffer_seconds, 0.0);
    }

    #[test]
    fn test_variation_penalty_breaks_tie_other_way() {
        // Coming from level 2, staying there is strictly best
        let planner = LookaheadPlanner::default();
        let snapshot = test_snapshot();

        let plan = planner
            .plan(200.0, &snapshot, 2)
            .expect("valid snapshot")
            .expect("plan expected");
        assert_eq!(plan.first(), Some(2));
        assert_eq!(plan.score, 2.0);
    }

    #[test]
    fn test_rebuffer_penalty_selects_lower_level() {
        // 400kB at 50kB/s takes 8s against a 2s buffer: 6s stall at level 2
        let planner = LookaheadPlanner::default();
        let mut snapshot = test_snapshot();
        snapshot.buffer_seconds_until_empty = 2.0;

        let top = LookaheadPlanner::simulate(vec![2], 50.0, &snapshot, 0)
            .expect("valid sequence");
        assert_eq!(top.rebuffer_seconds, 6.0);
        assert_eq!(top.score, 2.0 - 2.0 - 18.0);

        let plan = planner
            .plan(50.0, &snapshot, 0)
            .expect("valid snapshot")
            .expect("plan expected");
        assert_eq!(plan.first(), Some(0));
        assert_eq!(plan.rebuffer_seconds, 0.0);
    }

    #[test]
    fn test_all_zero_coefficients_pick_first_sequence() {
        let planner = LookaheadPlanner::default();
        let mut snapshot = test_snapshot();
        snapshot.quality_coefficient = 0.0;
        snapshot.variation_coefficient = 0.0;
        snapshot.rebuffering_coefficient = 0.0;
        snapshot.upcoming_quality_bitrates = vec![vec![100.0, 200.0, 400.0]; 2];

        let plan = planner
            .plan(1.0, &snapshot, 2)
            .expect("valid snapshot")
            .expect("plan expected");
        assert_eq!(plan.sequence, vec![0, 0, 0]);
        assert_eq!(plan.score, 0.0);
    }

    #[test]
    fn test_sequence_length_follows_horizon() {
        let planner = LookaheadPlanner::new(5);
        let mut snapshot = test_snapshot();
        snapshot.upcoming_quality_bitrates = vec![vec![100.0, 200.0, 400.0]; 3];
        let plan = planner
            .plan(1000.0, &snapshot, 0)
            .expect("valid snapshot")
            .expect("plan expected");
        assert_eq!(plan.sequence.len(), 4);

        snapshot.upcoming_quality_bitrates = vec![vec![100.0, 200.0, 400.0]; 9];
        let plan = planner
            .plan(1000.0, &snapshot, 0)
            .expect("valid snapshot")
            .expect("plan expected");
        assert_eq!(plan.sequence.len(), 6);

        let short = LookaheadPlanner::new(1);
        let plan = short
            .plan(1000.0, &snapshot, 0)
            .expect("valid snapshot")
            .expect("plan expected");
        assert_eq!(plan.sequence.len(), 2);
    }

    #[test]
    fn test_lookahead_avoids_future_stall() {
        // Level 2 is affordable for the next chunk, but it drains the buffer
        // the expensive chunk after it needs.
        let mut snapshot = test_snapshot();
        snapshot.buffer_seconds_until_empty = 4.0;
        snapshot.buffer_seconds_per_chunk = 1.0;
        snapshot.buffer_max_size = 10.0;
        snapshot.quality_bitrates = vec![10.0, 20.0, 150.0];
        snapshot.upcoming_quality_bitrates = vec![vec![400.0, 800.0, 1600.0]];
        snapshot.quality_coefficient = 1.0;
        snapshot.variation_coefficient = 0.0;
        snapshot.rebuffering_coefficient = 10.0;

        let myopic = LookaheadPlanner::new(0)
            .plan(100.0, &snapshot, 0)
            .expect("valid snapshot")
            .expect("plan expected");
        assert_eq!(myopic.first(), Some(2));

        // 1.5s download leaves 3.5s of buffer for a 4s download
        let greedy = LookaheadPlanner::simulate(vec![2, 0], 100.0, &snapshot, 0)
            .expect("valid sequence");
        assert_eq!(greedy.rebuffer_seconds, 0.5);

        let plan = LookaheadPlanner::new(5)
            .plan(100.0, &snapshot, 0)
            .expect("valid snapshot")
            .expect("plan expected");
        assert_eq!(plan.sequence, vec![1, 0]);
        assert_eq!(plan.rebuffer_seconds, 0.0);
    }

    #[test]
    fn test_buffer_capped_at_max() {
        // Fast downloads fill the buffer; the cap limits what the second
        // step can draw on
        let mut snapshot = test_snapshot();
        snapshot.buffer_seconds_until_empty = 20.0;
        snapshot.buffer_seconds_per_chunk = 4.0;
        snapshot.buffer_max_size = 20.0;
        snapshot.upcoming_quality_bitrates = vec![vec![100.0, 200.0, 2500.0]];
        snapshot.quality_coefficient = 0.0;
        snapshot.variation_coefficient = 0.0;

        // Step 0: 100/100 = 1s, buffer min(19 + 4, 20) = 20.
        // Step 1: 2500/100 = 25s, stall 5s.
        let plan = LookaheadPlanner::simulate(vec![0, 2], 100.0, &snapshot, 0)
            .expect("valid sequence");
        assert_eq!(plan.rebuffer_seconds, 5.0);
        assert_eq!(plan.score, -15.0);
    }

    #[test]
    fn test_short_upcoming_vector_rejected() {
        let planner = LookaheadPlanner::default();
        let mut snapshot = test_snapshot();
        snapshot.upcoming_quality_bitrates = vec![vec![1.0]];

        assert_eq!(
            planner.plan(200.0, &snapshot, 0),
            Err(SnapshotError::UpcomingCountMismatch {
                index: 0,
                expected: 3,
                actual: 1
            })
        );
    }

    #[test]
    fn test_malformed_snapshot_rejected_without_bandwidth() {
        let planner = LookaheadPlanner::default();
        let mut snapshot = test_snapshot();
        snapshot.quality_bitrates.pop();

        assert!(matches!(
            planner.plan(0.0, &snapshot, 0),
            Err(SnapshotError::BitrateCountMismatch { .. })
        ));
    }

    #[test]
    fn test_simulate_rejects_sequence_beyond_cost_data() {
        let mut snapshot = test_snapshot();
        snapshot.upcoming_quality_bitrates = vec![vec![100.0, 200.0, 400.0]];

        assert_eq!(
            LookaheadPlanner::simulate(vec![0, 1, 2], 200.0, &snapshot, 0),
            Err(SnapshotError::SequenceTooLong {
                steps: 3,
                available: 2
            })
        );
    }

    #[test]
    fn test_simulate_rejects_unknown_level() {
        let snapshot = test_snapshot();

        assert_eq!(
            LookaheadPlanner::simulate(vec![3], 200.0, &snapshot, 0),
            Err(SnapshotError::LevelOutOfRange {
                level: 3,
                levels: 3
            })
        );
    }

    #[test]
    fn test_simulate_checks_upcoming_it_reads() {
        let mut snapshot = test_snapshot();
        snapshot.upcoming_quality_bitrates = vec![vec![100.0, 200.0]];

        assert!(LookaheadPlanner::simulate(vec![1], 200.0, &snapshot, 0).is_ok());
        assert!(matches!(
            LookaheadPlanner::simulate(vec![1, 1], 200.0, &snapshot, 0),
            Err(SnapshotError::UpcomingCountMismatch { index: 0, .. })
        ));
    }
}
