//! Configuration loading for the routing policies

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use fanet_core::FanetError;

use crate::policy::RoutingAlgorithm;

/// Routing configuration for one simulation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Policy every drone in the swarm runs
    pub algorithm: RoutingAlgorithm,
    pub distance_q: DistanceQConfig,
    pub echoed: EchoedConfig,
    pub ucb: UcbConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceQConfig {
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Exploration probability once warm-up is over
    pub epsilon: f64,
    /// Value every action starts with in a newly visited state
    pub optimistic_value: f64,
    /// Meters per unit when weighting values by depot distance
    pub distance_scale: f64,
}

impl Default for DistanceQConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            gamma: 0.8,
            epsilon: 0.1,
            optimistic_value: 5.0,
            distance_scale: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoedConfig {
    /// Fixed learning rate applied on acknowledgements
    pub eta: f64,
    /// Scales the dynamic learning rate applied on estimates
    pub echo_rate: f64,
    /// Number of recent value changes used to measure instability
    pub history_len: usize,
    /// Weight on the transmission time, which is always a single step
    pub transmission_weight: f64,
    /// `k_max` is the run length in seconds divided by this
    pub k_max_divisor: f64,
}

impl Default for EchoedConfig {
    fn default() -> Self {
        Self {
            eta: 0.8,
            echo_rate: 0.3,
            history_len: 10,
            transmission_weight: 3.0,
            k_max_divisor: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UcbConfig {
    pub alpha: f64,
    pub gamma: f64,
    /// Exploration constant `C` of the UCB1 bound
    pub exploration: f64,
}

impl Default for UcbConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            gamma: 0.5,
            exploration: 16.0,
        }
    }
}

impl RoutingConfig {
    pub fn for_algorithm(algorithm: RoutingAlgorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        Self::load_with(Self::find_config_file())
    }

    /// Load configuration from an explicit file, plus environment overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(Some(path.as_ref().to_path_buf()))
    }

    fn load_with(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        if let Some(path) = &config_path {
            tracing::info!("Loading routing config from: {:?}", path);
            builder = builder.add_source(File::from(path.clone()).required(false));
        } else {
            tracing::info!("No routing config file found, using defaults");
        }

        // Environment variables with FANET_ prefix, e.g. FANET__UCB__EXPLORATION=8
        builder = builder.add_source(
            Environment::with_prefix("FANET")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()?
            .try_deserialize()
            .context("Failed to deserialize routing configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject parameter values the update rules cannot work with
    pub fn validate(&self) -> std::result::Result<(), FanetError> {
        let unit = |name: &str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(FanetError::Config(format!(
                    "{name} must be within [0, 1], got {value}"
                )))
            }
        };

        unit("distance_q.alpha", self.distance_q.alpha)?;
        unit("distance_q.gamma", self.distance_q.gamma)?;
        unit("distance_q.epsilon", self.distance_q.epsilon)?;
        unit("echoed.eta", self.echoed.eta)?;
        unit("echoed.echo_rate", self.echoed.echo_rate)?;
        unit("ucb.alpha", self.ucb.alpha)?;
        unit("ucb.gamma", self.ucb.gamma)?;

        if self.distance_q.distance_scale <= 0.0 {
            return Err(FanetError::Config(
                "distance_q.distance_scale must be positive".to_string(),
            ));
        }
        if self.echoed.history_len < 2 {
            return Err(FanetError::Config(
                "echoed.history_len must be at least 2".to_string(),
            ));
        }
        if self.echoed.k_max_divisor <= 0.0 {
            return Err(FanetError::Config(
                "echoed.k_max_divisor must be positive".to_string(),
            ));
        }
        if self.ucb.exploration < 0.0 {
            return Err(FanetError::Config(
                "ucb.exploration must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Find the configuration file
    fn find_config_file() -> Option<PathBuf> {
        // Check in order: FANET_CONFIG env, ./fanet.toml
        if let Ok(path) = std::env::var("FANET_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from("fanet.toml");
        if local.exists() {
            return Some(local);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RoutingConfig::default();
        assert_eq!(config.algorithm, RoutingAlgorithm::DistanceQLearning);
        assert_eq!(config.distance_q.alpha, 0.3);
        assert_eq!(config.distance_q.gamma, 0.8);
        assert_eq!(config.echoed.history_len, 10);
        assert_eq!(config.ucb.exploration, 16.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = RoutingConfig::default();
        config.ucb.alpha = 1.5;
        assert!(matches!(config.validate(), Err(FanetError::Config(_))));

        let mut config = RoutingConfig::default();
        config.echoed.history_len = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RoutingConfig = toml::from_str(
            r#"
            algorithm = "ucb_q_learning"

            [ucb]
            exploration = 4.0
            "#,
        )
        .unwrap();

        assert_eq!(config.algorithm, RoutingAlgorithm::UcbQLearning);
        assert_eq!(config.ucb.exploration, 4.0);
        assert_eq!(config.ucb.alpha, 0.5);
        assert_eq!(config.distance_q.epsilon, 0.1);
    }
}
