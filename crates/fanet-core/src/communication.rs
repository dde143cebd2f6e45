//! Messages exchanged between drones

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::geometry::Position;
use crate::types::{EventId, Packet, Step};

/// Periodic presence advertisement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beacon {
    pub source: AgentId,
    pub position: Position,
    pub speed: f64,
    pub created_at: Step,
}

impl Beacon {
    pub fn new(source: AgentId, position: Position, speed: f64, created_at: Step) -> Self {
        Self {
            source,
            position,
            speed,
            created_at,
        }
    }

    /// A beacon is stale once it is older than `max_age` steps
    pub fn is_fresh(&self, now: Step, max_age: Step) -> bool {
        self.created_at.saturating_add(max_age) >= now
    }
}

/// Carries a packet one hop forward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataMessage {
    pub packet: Packet,
    pub forwarded_at: Step,
}

/// Echo of a received data message back to its sender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckMessage {
    pub event_id: EventId,
    pub received_at: Step,
    pub forwarded_at: Step,
    /// Steps the packet spent queued at the sender
    pub queue_time: Step,
    /// Receiver's estimated time to the depot, in seconds
    pub estimate: f64,
}

/// Broadcast of an updated estimate-to-depot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateMessage {
    /// Broadcaster's estimated time to the depot, in seconds
    pub estimate: f64,
    /// Seconds
    pub queue_time: f64,
    /// Seconds
    pub transmission_time: f64,
    pub created_at: Step,
}

/// Message types for the echoed routing protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    Beacon(Beacon),
    Data(DataMessage),
    Acknowledge(AckMessage),
    Estimate(EstimateMessage),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Beacon(_) => "beacon",
            Message::Data(_) => "data",
            Message::Acknowledge(_) => "acknowledge",
            Message::Estimate(_) => "estimate",
        }
    }
}

/// Where an outbound message goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Unicast(AgentId),
    Broadcast(Vec<AgentId>),
}

/// A message a policy asks the driver to deliver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outbound {
    pub destination: Destination,
    pub message: Message,
}

impl Outbound {
    pub fn unicast(to: AgentId, message: Message) -> Self {
        Self {
            destination: Destination::Unicast(to),
            message,
        }
    }

    pub fn broadcast(to: Vec<AgentId>, message: Message) -> Self {
        Self {
            destination: Destination::Broadcast(to),
            message,
        }
    }

    /// Every agent this message is addressed to
    pub fn recipients(&self) -> Vec<AgentId> {
        match &self.destination {
            Destination::Unicast(id) => vec![*id],
            Destination::Broadcast(ids) => ids.clone(),
        }
    }
}
