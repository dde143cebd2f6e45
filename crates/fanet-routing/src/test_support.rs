//! Fixtures shared by the unit tests

use fanet_core::{AgentId, Beacon, DroneView, Neighbor, NeighborView, Position, Step};

use crate::context::Environment;

pub(crate) const RANGE: f64 = 200.0;

/// 1000m area, 100m cells, depot at the origin
pub(crate) fn env(swarm_size: u32) -> Environment {
    Environment::new(swarm_size)
        .with_grid(1000.0, 100.0)
        .with_timing(0.15, 600)
        .with_beacon_max_age(10)
}

pub(crate) fn drone(id: u32, x: f64, y: f64) -> DroneView {
    DroneView::new(AgentId(id), Position::new(x, y), Position::origin())
        .with_communication_range(RANGE)
        .with_speed(10.0)
}

pub(crate) fn neighbor(id: u32, x: f64, y: f64, step: Step) -> Neighbor {
    let position = Position::new(x, y);
    Neighbor::new(
        Beacon::new(AgentId(id), position, 10.0, step),
        NeighborView::new(AgentId(id), position, RANGE),
    )
}
