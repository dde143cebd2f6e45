//! FANET Core - Shared types for the drone routing policies
//!
//! This crate provides the vocabulary the routing policies and the
//! simulator driver agree on: identifiers, geometry, entity views and
//! the protocol messages exchanged between drones.

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

pub mod agent;
pub mod communication;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod types;

pub use agent::{AgentId, DroneView, Neighbor, NeighborView};
pub use communication::{
    AckMessage, Beacon, DataMessage, Destination, EstimateMessage, Message, Outbound,
};
pub use error::{FanetError, Result};
pub use geometry::{coord_to_cell, euclidean_distance, Cell, Position};
pub use types::*;
