//! Common types used throughout FANET routing

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;

/// Discrete simulation time step
pub type Step = u64;

/// Identifier of the event a packet reports on.
///
/// Routing decisions are credited per event, so the pending-decision
/// ledgers are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event-{}", self.0)
    }
}

/// How the event behind a packet resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The packet expired before reaching the depot
    Expired,
    /// The packet reached the depot
    Delivered,
}

impl Outcome {
    /// Signed scalar used by the reward functions: -1 or +1
    pub fn sign(self) -> f64 {
        match self {
            Outcome::Expired => -1.0,
            Outcome::Delivered => 1.0,
        }
    }

    pub fn is_delivered(self) -> bool {
        matches!(self, Outcome::Delivered)
    }
}

impl TryFrom<i32> for Outcome {
    type Error = crate::error::FanetError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Outcome::Expired),
            1 => Ok(Outcome::Delivered),
            other => Err(crate::error::FanetError::Config(format!(
                "outcome must be -1 or 1, got {other}"
            ))),
        }
    }
}

/// The packet being routed, as far as the policies need to see it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub event_id: EventId,
    /// Drones that already carried this packet, oldest first
    pub hops: Vec<AgentId>,
    /// Steps the packet has spent queued at its current holder
    pub queue_time: Step,
}

impl Packet {
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            hops: Vec::new(),
            queue_time: 0,
        }
    }

    pub fn with_hops(mut self, hops: Vec<AgentId>) -> Self {
        self.hops = hops;
        self
    }

    pub fn with_queue_time(mut self, queue_time: Step) -> Self {
        self.queue_time = queue_time;
        self
    }

    pub fn visited(&self, agent: AgentId) -> bool {
        self.hops.contains(&agent)
    }
}
