//! Routing configuration loaded from files and the environment

#![allow(clippy::float_cmp)]

use std::fs;

use fanet_routing::{RoutingAlgorithm, RoutingConfig, RoutingEngine, Environment};

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fanet.toml");
    fs::write(
        &path,
        r#"
algorithm = "fully_echoed"

[echoed]
eta = 0.6
history_len = 16

[distance_q]
epsilon = 0.05
"#,
    )
    .unwrap();

    let config = RoutingConfig::load_from(&path).unwrap();
    assert_eq!(config.algorithm, RoutingAlgorithm::FullyEchoed);
    assert_eq!(config.echoed.eta, 0.6);
    assert_eq!(config.echoed.history_len, 16);
    assert_eq!(config.echoed.echo_rate, 0.3);
    assert_eq!(config.distance_q.epsilon, 0.05);
    assert_eq!(config.distance_q.alpha, 0.3);

    let engine = RoutingEngine::new(Environment::new(3), &config).unwrap();
    assert_eq!(engine.algorithm(), RoutingAlgorithm::FullyEchoed);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = RoutingConfig::load_from(dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.algorithm, RoutingAlgorithm::DistanceQLearning);
    assert_eq!(config.distance_q.gamma, 0.8);
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fanet.toml");
    fs::write(&path, "[echoed]\neta = 2.0\n").unwrap();

    let err = RoutingConfig::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("echoed.eta"), "{err}");
}

#[test]
fn test_unknown_algorithm_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fanet.toml");
    fs::write(&path, "algorithm = \"flooding\"\n").unwrap();

    assert!(RoutingConfig::load_from(&path).is_err());
}

#[test]
fn test_environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fanet.toml");
    fs::write(&path, "algorithm = \"ucb_q_learning\"\n\n[ucb]\nexploration = 4.0\n").unwrap();

    std::env::set_var("FANET__UCB__EXPLORATION", "8");
    let config = RoutingConfig::load_from(&path);
    std::env::remove_var("FANET__UCB__EXPLORATION");

    let config = config.unwrap();
    assert_eq!(config.algorithm, RoutingAlgorithm::UcbQLearning);
    assert_eq!(config.ucb.exploration, 8.0);
}
