//! Routing policy trait and the closed set of algorithms

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use fanet_core::{
    AgentId, EventId, FanetError, Message, Neighbor, Outbound, Outcome, Packet, Result, Step,
};

use crate::context::RoutingContext;

/// Trait every per-drone routing policy implements.
///
/// The driver calls `select_relay` once per forwarding opportunity and
/// `on_outcome` when the packet's event resolves, possibly never. Calls for
/// one agent never overlap.
pub trait RoutingPolicy: Send + Sync {
    /// Algorithm name
    fn name(&self) -> &str;

    /// Choose the next carrier for `packet`; `None` retains it.
    ///
    /// An empty neighbor list always retains and leaves the policy untouched.
    /// Errors only come from discretizing positions on a malformed grid.
    fn select_relay(
        &mut self,
        ctx: &RoutingContext<'_>,
        neighbors: &[Neighbor],
        packet: &Packet,
    ) -> Result<Option<AgentId>>;

    /// Credit the decision taken for `event`.
    ///
    /// `holder` is the drone carrying the packet when the event resolved.
    /// Unknown or already-credited events are ignored.
    fn on_outcome(
        &mut self,
        ctx: &RoutingContext<'_>,
        holder: AgentId,
        event: EventId,
        delay: Step,
        outcome: Outcome,
    ) -> Result<()>;

    /// Handle an inbound protocol message, returning messages to send
    fn on_message(
        &mut self,
        _ctx: &RoutingContext<'_>,
        _source: AgentId,
        _message: &Message,
    ) -> Result<Vec<Outbound>> {
        Ok(Vec::new())
    }

    /// Number of decisions still waiting for their outcome
    fn pending_decisions(&self) -> usize;

    /// Decision counters
    fn stats(&self) -> PolicyStats;
}

/// Decision counters exposed by every policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStats {
    pub decisions: u64,
    pub relays: u64,
    pub retains: u64,
    pub explorations: u64,
    pub exploitations: u64,
    pub value_updates: u64,
}

impl PolicyStats {
    pub(crate) fn record_choice(&mut self, choice: Option<AgentId>) {
        self.decisions += 1;
        if choice.is_some() {
            self.relays += 1;
        } else {
            self.retains += 1;
        }
    }

    pub fn merge(&mut self, other: &PolicyStats) {
        self.decisions += other.decisions;
        self.relays += other.relays;
        self.retains += other.retains;
        self.explorations += other.explorations;
        self.exploitations += other.exploitations;
        self.value_updates += other.value_updates;
    }
}

/// The routing algorithms a swarm can be configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingAlgorithm {
    /// Tabular Q-learning with a depot-distance weighted greedy rule
    #[default]
    DistanceQLearning,
    /// Fully-echoed Q-routing with simulated annealing
    FullyEchoed,
    /// Per-cell Q-vectors with UCB1 action selection
    UcbQLearning,
    /// Never forwards
    NoRouting,
}

impl RoutingAlgorithm {
    pub fn all() -> [RoutingAlgorithm; 4] {
        [
            RoutingAlgorithm::DistanceQLearning,
            RoutingAlgorithm::FullyEchoed,
            RoutingAlgorithm::UcbQLearning,
            RoutingAlgorithm::NoRouting,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            RoutingAlgorithm::DistanceQLearning => "distance_q_learning",
            RoutingAlgorithm::FullyEchoed => "fully_echoed",
            RoutingAlgorithm::UcbQLearning => "ucb_q_learning",
            RoutingAlgorithm::NoRouting => "no_routing",
        }
    }

    /// Whether drones running this algorithm must see every inbound message
    pub fn uses_protocol(self) -> bool {
        matches!(self, RoutingAlgorithm::FullyEchoed)
    }
}

impl std::fmt::Display for RoutingAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoutingAlgorithm {
    type Err = FanetError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::all()
            .into_iter()
            .find(|algorithm| algorithm.name() == normalized)
            .ok_or_else(|| FanetError::UnknownAlgorithm(s.to_string()))
    }
}
