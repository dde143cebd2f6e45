//! Drone identifiers and the views a policy receives of drones

use serde::{Deserialize, Serialize};

use crate::communication::Beacon;
use crate::geometry::Position;

/// Unique identifier for a drone.
///
/// Also used as a routing action: choosing an `AgentId` means handing the
/// packet to that drone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Position of this agent inside swarm-indexed vectors
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for AgentId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "drone-{}", self.0)
    }
}

/// The acting drone as seen at the moment a policy is invoked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneView {
    pub id: AgentId,
    pub position: Position,
    /// Next waypoint on the drone's mission path
    pub next_waypoint: Position,
    pub depot: Position,
    pub communication_range: f64,
    pub speed: f64,
}

impl DroneView {
    pub fn new(id: AgentId, position: Position, depot: Position) -> Self {
        Self {
            id,
            position,
            next_waypoint: position,
            depot,
            communication_range: 200.0,
            speed: 8.0,
        }
    }

    pub fn with_next_waypoint(mut self, waypoint: Position) -> Self {
        self.next_waypoint = waypoint;
        self
    }

    pub fn with_communication_range(mut self, range: f64) -> Self {
        self.communication_range = range;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn distance_to_depot(&self) -> f64 {
        self.position.distance_to(&self.depot)
    }
}

/// A neighbor that is currently visible to the acting drone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborView {
    pub id: AgentId,
    /// Live position of the neighbor
    pub position: Position,
    pub communication_range: f64,
}

impl NeighborView {
    pub fn new(id: AgentId, position: Position, communication_range: f64) -> Self {
        Self {
            id,
            position,
            communication_range,
        }
    }
}

/// A visible neighbor together with the beacon that made it visible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub beacon: Beacon,
    pub view: NeighborView,
}

impl Neighbor {
    pub fn new(beacon: Beacon, view: NeighborView) -> Self {
        Self { beacon, view }
    }

    pub fn id(&self) -> AgentId {
        self.view.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_display() {
        assert_eq!(AgentId::new(7).to_string(), "drone-7");
    }

    #[test]
    fn test_agent_id_index() {
        assert_eq!(AgentId::from(3).index(), 3);
    }

    #[test]
    fn test_drone_view_builder() {
        let drone = DroneView::new(AgentId(1), Position::new(300.0, 400.0), Position::origin())
            .with_communication_range(150.0)
            .with_speed(5.0);

        assert_eq!(drone.communication_range, 150.0);
        assert_eq!(drone.speed, 5.0);
        assert_eq!(drone.next_waypoint, drone.position);
        assert!((drone.distance_to_depot() - 500.0).abs() < 1e-9);
    }
}
