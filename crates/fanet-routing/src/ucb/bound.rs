//! UCB1 bookkeeping for one (cell, target) action

use serde::{Deserialize, Serialize};

use fanet_core::Step;

/// Upper confidence bound `value + sqrt(c * ln(step) / selections)`.
///
/// `step` is floored at 1 so the logarithm stays defined; `selections`
/// must be positive.
pub fn upper_bound(value: f64, step: Step, selections: u64, c: f64) -> f64 {
    let ln_step = (step.max(1) as f64).ln();
    value + (c * ln_step / selections.max(1) as f64).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UcbArm {
    /// Starts at 1 so the bound never divides by zero
    pub selections: u64,
    /// Last computed bound
    pub estimate: f64,
}

impl UcbArm {
    pub fn new() -> Self {
        Self {
            selections: 1,
            estimate: 0.0,
        }
    }

    /// Recompute the bound for the current step and value
    pub fn refresh(&mut self, step: Step, value: f64, c: f64) -> f64 {
        self.estimate = upper_bound(value, step, self.selections, c);
        self.estimate
    }

    pub fn record_selection(&mut self) {
        self.selections += 1;
    }
}

impl Default for UcbArm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_arm_counts_one_selection() {
        let arm = UcbArm::new();
        assert_eq!(arm.selections, 1);
        assert_eq!(arm.estimate, 0.0);
    }

    #[test]
    fn test_first_step_bound_is_value() {
        assert_eq!(upper_bound(0.3, 0, 1, 16.0), 0.3);
        assert_eq!(upper_bound(0.3, 1, 1, 16.0), 0.3);
    }

    #[test]
    fn test_less_selected_arm_has_higher_bound() {
        for step in [2, 10, 1_000, 100_000] {
            let mut fresh = UcbArm::new();
            let mut worn = UcbArm::new();
            worn.record_selection();
            worn.record_selection();

            assert!(fresh.refresh(step, 0.25, 16.0) > worn.refresh(step, 0.25, 16.0));
        }
    }

    #[test]
    fn test_refresh_known_value() {
        let mut arm = UcbArm::new();
        arm.record_selection();

        let expected = 0.5 + (16.0 * (100.0f64).ln() / 2.0).sqrt();
        let estimate = arm.refresh(100, 0.5, 16.0);
        assert!((estimate - expected).abs() < 1e-12);
        assert_eq!(arm.estimate, estimate);
    }
}
