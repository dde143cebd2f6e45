//! Simulation context handed to every policy call

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use fanet_core::{coord_to_cell, AgentId, Cell, DroneView, Position, Result, Step};

/// Run-constant values the simulator exposes to the policies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    /// Every drone in the swarm, ids `0..n`
    pub agents: Vec<AgentId>,
    /// Width of the (square) area of interest, meters
    pub area_width: f64,
    /// Grid resolution used to discretize positions, meters
    pub cell_size: f64,
    /// Steps an event's packets live before they expire
    pub event_duration: Step,
    /// Seconds per simulation step
    pub step_duration: f64,
    /// Total steps in the run
    pub sim_duration: Step,
    /// Beacons older than this many steps are ignored
    pub beacon_max_age: Step,
    pub seed: u64,
}

impl Environment {
    pub fn new(swarm_size: u32) -> Self {
        Self {
            agents: (0..swarm_size).map(AgentId).collect(),
            area_width: 1500.0,
            cell_size: 300.0,
            event_duration: 2000,
            step_duration: 0.15,
            sim_duration: 18_000,
            beacon_max_age: 50,
            seed: 1,
        }
    }

    pub fn with_grid(mut self, area_width: f64, cell_size: f64) -> Self {
        self.area_width = area_width;
        self.cell_size = cell_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_timing(mut self, step_duration: f64, sim_duration: Step) -> Self {
        self.step_duration = step_duration;
        self.sim_duration = sim_duration;
        self
    }

    pub fn with_event_duration(mut self, event_duration: Step) -> Self {
        self.event_duration = event_duration;
        self
    }

    pub fn with_beacon_max_age(mut self, max_age: Step) -> Self {
        self.beacon_max_age = max_age;
        self
    }

    pub fn swarm_size(&self) -> usize {
        self.agents.len()
    }

    /// Deterministic random source for one agent's policy
    pub fn agent_rng(&self, agent: AgentId) -> StdRng {
        let stream = u64::from(agent.0).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        StdRng::seed_from_u64(self.seed ^ stream)
    }

    pub fn cell_of(&self, position: Position) -> Result<Cell> {
        coord_to_cell(self.cell_size, self.area_width, position.x, position.y)
    }
}

/// Per-call view: the environment, the current step and the acting drone
#[derive(Debug, Clone)]
pub struct RoutingContext<'a> {
    pub env: &'a Environment,
    pub step: Step,
    pub drone: DroneView,
}

impl<'a> RoutingContext<'a> {
    pub fn new(env: &'a Environment, step: Step, drone: DroneView) -> Self {
        Self { env, step, drone }
    }

    pub fn me(&self) -> AgentId {
        self.drone.id
    }

    /// Cell the acting drone currently occupies
    pub fn current_cell(&self) -> Result<Cell> {
        self.env.cell_of(self.drone.position)
    }

    /// Cell of the acting drone's next waypoint
    pub fn next_cell(&self) -> Result<Cell> {
        self.env.cell_of(self.drone.next_waypoint)
    }
}
