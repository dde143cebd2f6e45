//! Fixed-length record of recent Q-value changes

/// Circular buffer of the last `H` values written by acknowledgement updates.
///
/// Starts filled with ones so the instability factor is well defined
/// before any update arrives.
#[derive(Debug, Clone)]
pub struct ChangeHistory {
    values: Vec<f64>,
    last: Option<usize>,
    writes: u64,
}

pub const MIN_INSTABILITY: f64 = 0.5;
pub const MAX_INSTABILITY: f64 = 10.0;

impl ChangeHistory {
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![1.0; len.max(1)],
            last: None,
            writes: 0,
        }
    }

    /// Overwrite the oldest slot with `value`
    pub fn record(&mut self, value: f64) {
        let next = self.last.map_or(0, |last| (last + 1) % self.values.len());
        self.values[next] = value;
        self.last = Some(next);
        self.writes += 1;
    }

    /// Mean absolute difference between adjacent slots, clamped to `[0.5, 10]`.
    ///
    /// Slots are compared in buffer order, not in write order.
    pub fn instability(&self) -> f64 {
        let total: f64 = self
            .values
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).abs())
            .sum();
        let mean = total / self.values.len() as f64;
        if mean.is_nan() {
            return MAX_INSTABILITY;
        }
        mean.clamp(MIN_INSTABILITY, MAX_INSTABILITY)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total number of values ever recorded
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_history_is_flat() {
        let history = ChangeHistory::new(10);
        assert_eq!(history.values(), &[1.0; 10]);
        assert_eq!(history.instability(), MIN_INSTABILITY);
        assert_eq!(history.writes(), 0);
    }

    #[test]
    fn test_record_wraps_around() {
        let mut history = ChangeHistory::new(3);
        for value in [2.0, 3.0, 4.0, 5.0] {
            history.record(value);
        }
        assert_eq!(history.values(), &[5.0, 3.0, 4.0]);
        assert_eq!(history.writes(), 4);
    }

    #[test]
    fn test_instability_mean_and_clamp() {
        let mut history = ChangeHistory::new(4);
        // [11, 1, 1, 1] -> 10 / 4
        history.record(11.0);
        assert!((history.instability() - 2.5).abs() < 1e-12);

        // [1000, 1, 1, 1] -> clamped
        let mut big = ChangeHistory::new(4);
        big.record(1000.0);
        assert_eq!(big.instability(), MAX_INSTABILITY);
    }
}
