//! Throughput prediction from recent chunk measurements
//!
//! The harmonic mean weights slow samples more heavily than the arithmetic
//! mean, so a single fast chunk cannot inflate the estimate.

use std::collections::VecDeque;

use crate::config::PredictorMode;

/// Bounded history of measured throughput samples (kB/s)
#[derive(Debug, Clone)]
pub struct ThroughputPredictor {
    samples: VecDeque<f64>,
    /// Relative errors of past estimates, robust mode only
    errors: VecDeque<f64>,
    capacity: usize,
    mode: PredictorMode,
}

impl ThroughputPredictor {
    /// Create a predictor keeping at most `capacity` samples (at least one)
    pub fn new(capacity: usize, mode: PredictorMode) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            errors: VecDeque::with_capacity(capacity + 1),
            capacity,
            mode,
        }
    }

    /// Record a measurement.
    ///
    /// Zero, negative and non-finite samples mean "no measurement this round"
    /// and are ignored.
    pub fn update(&mut self, sample: f64) {
        if !(sample.is_finite() && sample > 0.0) {
            return;
        }

        if self.mode == PredictorMode::Robust {
            // Score the estimate that was in force while this chunk downloaded
            if let Some(predicted) = self.harmonic_mean() {
                Self::push_bounded(
                    &mut self.errors,
                    (predicted - sample).abs() / sample,
                    self.capacity,
                );
            }
        }

        Self::push_bounded(&mut self.samples, sample, self.capacity);
    }

    /// Forward bandwidth estimate, or 0 when there is no history
    pub fn estimate(&self) -> f64 {
        let Some(mean) = self.harmonic_mean() else {
            return 0.0;
        };

        match self.mode {
            PredictorMode::HarmonicMean => mean,
            PredictorMode::Robust => {
                let max_error = self.errors.iter().copied().fold(0.0, f64::max);
                mean / (1.0 + max_error)
            }
        }
    }

    fn harmonic_mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let reciprocal_sum: f64 = self.samples.iter().map(|s| 1.0 / s).sum();
        Some(self.samples.len() as f64 / reciprocal_sum)
    }

    fn push_bounded(queue: &mut VecDeque<f64>, value: f64, capacity: usize) {
        queue.push_back(value);
        while queue.len() > capacity {
            queue.pop_front();
        }
    }

    /// Drop all history
    pub fn clear(&mut self) {
        self.samples.clear();
        self.errors.clear();
    }

    /// Stored samples, oldest first
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mode(&self) -> PredictorMode {
        self.mode
    }
}

impl Default for ThroughputPredictor {
    fn default() -> Self {
        Self::new(5, PredictorMode::HarmonicMean)
    }
}
