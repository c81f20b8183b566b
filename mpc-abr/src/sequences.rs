//! Lazy enumeration of candidate quality sequences

/// Every sequence of `length` levels drawn from `0..levels`.
///
/// Yields in lexicographic order: position 0 is the most significant digit
/// and levels ascend, so `[0, 0, .., 0]` comes first. The planner's
/// tie-break depends on this order.
#[derive(Debug, Clone)]
pub struct QualitySequences {
    levels: usize,
    current: Vec<usize>,
    done: bool,
}

impl QualitySequences {
    pub fn new(levels: usize, length: usize) -> Self {
        Self {
            levels,
            current: vec![0; length],
            done: levels == 0,
        }
    }

    /// Rewind to the first sequence
    pub fn reset(&mut self) {
        self.current.iter_mut().for_each(|level| *level = 0);
        self.done = self.levels == 0;
    }

    /// Total number of sequences, saturating on overflow
    pub fn total(&self) -> usize {
        if self.levels == 0 {
            return 0;
        }
        let exponent = u32::try_from(self.current.len()).unwrap_or(u32::MAX);
        self.levels.saturating_pow(exponent)
    }

    /// Advance the odometer; returns false once it wraps around
    fn advance(&mut self) -> bool {
        for digit in self.current.iter_mut().rev() {
            *digit += 1;
            if *digit < self.levels {
                return true;
            }
            *digit = 0;
        }
        false
    }
}

impl Iterator for QualitySequences {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.current.clone();
        if !self.advance() {
            self.done = true;
        }
        Some(item)
    }
}
