//! Simulated-annealing schedule for exploration

/// Temperature for routing step `k`.
///
/// `k_max / k` while `k <= k_max`, 1 afterwards, scaled by the network
/// instability factor and kept within `[1, k_max]`.
pub fn temperature(k: u64, k_max: f64, instability: f64) -> f64 {
    let base = if k == 0 || k as f64 > k_max {
        1.0
    } else {
        k_max / k as f64
    };
    (base * instability).max(1.0).min(k_max.max(1.0))
}

/// Exploration probability at temperature `t`; tends to 1 as `t` grows
pub fn exploration_probability(t: f64) -> f64 {
    (-10.0 / t).exp()
}

/// Annealing state of one drone
#[derive(Debug, Clone)]
pub struct Annealing {
    k: u64,
    k_max: f64,
    temperature: f64,
    instability: f64,
}

impl Annealing {
    /// `k_max` is floored at 1
    pub fn new(k_max: f64) -> Self {
        let k_max = k_max.floor().max(1.0);
        Self {
            k: 0,
            k_max,
            temperature: k_max,
            instability: 1.0,
        }
    }

    /// Start of a routing step: count it and cool down
    pub fn advance(&mut self) -> f64 {
        self.k += 1;
        self.temperature = temperature(self.k, self.k_max, self.instability);
        self.temperature
    }

    /// Takes effect on the next [`Annealing::advance`]
    pub fn set_instability(&mut self, instability: f64) {
        self.instability = instability;
    }

    pub fn epsilon(&self) -> f64 {
        exploration_probability(self.temperature)
    }

    pub fn step(&self) -> u64 {
        self.k
    }

    pub fn k_max(&self) -> f64 {
        self.k_max
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn instability(&self) -> f64 {
        self.instability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_bounds() {
        let k_max = 900.0;
        for k in [1, 2, 10, 450, 899, 900, 901, 100_000] {
            for f in [0.5, 0.75, 1.0, 3.3, 10.0] {
                let t = temperature(k, k_max, f);
                assert!((1.0..=k_max).contains(&t), "k={k} f={f} t={t}");
            }
        }
    }

    #[test]
    fn test_temperature_cools() {
        assert_eq!(temperature(1, 900.0, 1.0), 900.0);
        assert_eq!(temperature(3, 900.0, 1.0), 300.0);
        assert_eq!(temperature(901, 900.0, 1.0), 1.0);
        assert_eq!(temperature(3, 900.0, 0.5), 150.0);
    }

    #[test]
    fn test_exploration_probability() {
        assert!((exploration_probability(10.0) - (-1.0f64).exp()).abs() < 1e-12);
        assert!(exploration_probability(1.0) < 1e-4);
        assert!(exploration_probability(1e6) > 0.99);
    }

    #[test]
    fn test_annealing_advance() {
        let mut annealing = Annealing::new(30.7);
        assert_eq!(annealing.k_max(), 30.0);
        assert_eq!(annealing.temperature(), 30.0);

        annealing.advance();
        annealing.advance();
        assert_eq!(annealing.step(), 2);
        assert_eq!(annealing.temperature(), 15.0);

        annealing.set_instability(10.0);
        annealing.advance();
        assert_eq!(annealing.temperature(), 30.0);
    }

    #[test]
    fn test_tiny_k_max_is_floored() {
        let mut annealing = Annealing::new(0.2);
        assert_eq!(annealing.k_max(), 1.0);
        annealing.advance();
        assert_eq!(annealing.temperature(), 1.0);
    }
}
