//! FANET Routing - Per-drone relay selection policies
//!
//! Each drone runs one [`RoutingPolicy`] that decides, at every forwarding
//! opportunity, whether to hand a packet to a neighbor or keep carrying it
//! toward the depot. Policies learn online from delayed delivery outcomes.
//! The [`RoutingEngine`] owns the policies of a whole swarm.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::float_cmp)]
#![allow(clippy::similar_names)]

pub mod config;
pub mod context;
pub mod distance_q;
pub mod echoed;
pub mod engine;
pub mod ledger;
pub mod metrics;
pub mod none;
pub mod policy;
pub mod state;
pub mod ucb;

#[cfg(test)]
mod test_support;

pub use config::{DistanceQConfig, EchoedConfig, RoutingConfig, UcbConfig};
pub use context::{Environment, RoutingContext};
pub use distance_q::DistanceQLearning;
pub use echoed::FullyEchoedRouting;
pub use engine::{EngineStats, RoutingEngine};
pub use ledger::PendingLedger;
pub use metrics::{RunKey, RunMetrics, RunRecord};
pub use none::NoRouting;
pub use policy::{PolicyStats, RoutingAlgorithm, RoutingPolicy};
pub use state::DroneCellState;
pub use ucb::{PeerTables, UcbQLearning};
