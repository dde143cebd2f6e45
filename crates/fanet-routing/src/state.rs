//! RL state keys

use serde::{Deserialize, Serialize};

use fanet_core::{AgentId, Cell, Result};

use crate::context::RoutingContext;

/// State of the distance-based learner: the drone and the cell it is in.
///
/// Two states are equal only when both the drone and the cell match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DroneCellState {
    pub agent: AgentId,
    pub cell: Cell,
}

impl DroneCellState {
    pub fn new(agent: AgentId, cell: Cell) -> Self {
        Self { agent, cell }
    }

    /// State of the acting drone at its current position
    pub fn current(ctx: &RoutingContext<'_>) -> Result<Self> {
        Ok(Self::new(ctx.me(), ctx.current_cell()?))
    }

    /// Expected next state: same drone, at its next waypoint.
    ///
    /// It does not depend on the chosen relay.
    pub fn successor(ctx: &RoutingContext<'_>) -> Result<Self> {
        Ok(Self::new(ctx.me(), ctx.next_cell()?))
    }
}

impl std::fmt::Display for DroneCellState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} in {}", self.agent, self.cell)
    }
}
