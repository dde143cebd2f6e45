//! Routing engine - One policy per drone, driven by the simulator

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use fanet_core::{
    AgentId, DroneView, EventId, FanetError, Message, Neighbor, Outbound, Outcome, Packet,
    Result, Step,
};

use crate::config::RoutingConfig;
use crate::context::{Environment, RoutingContext};
use crate::distance_q::DistanceQLearning;
use crate::echoed::FullyEchoedRouting;
use crate::none::NoRouting;
use crate::policy::{PolicyStats, RoutingAlgorithm, RoutingPolicy};
use crate::ucb::{PeerTables, UcbQLearning};

impl RoutingAlgorithm {
    /// Build the policy `agent` runs under this algorithm.
    ///
    /// UCB policies publish their value table in `peers`; the other
    /// algorithms ignore it.
    pub fn build(
        self,
        agent: AgentId,
        config: &RoutingConfig,
        env: &Environment,
        peers: &PeerTables,
    ) -> Box<dyn RoutingPolicy> {
        match self {
            RoutingAlgorithm::DistanceQLearning => {
                Box::new(DistanceQLearning::new(agent, config.distance_q.clone(), env))
            }
            RoutingAlgorithm::FullyEchoed => {
                Box::new(FullyEchoedRouting::new(agent, config.echoed.clone(), env))
            }
            RoutingAlgorithm::UcbQLearning => {
                Box::new(UcbQLearning::new(agent, config.ucb.clone(), env, peers))
            }
            RoutingAlgorithm::NoRouting => Box::new(NoRouting::new()),
        }
    }
}

/// Swarm-wide routing state: every drone's policy for one run
pub struct RoutingEngine {
    env: Environment,
    algorithm: RoutingAlgorithm,
    policies: HashMap<AgentId, Box<dyn RoutingPolicy>>,
    peers: PeerTables,
    delivered: u64,
    expired: u64,
}

impl RoutingEngine {
    /// Create one policy per agent in `env` running `config.algorithm`
    pub fn new(env: Environment, config: &RoutingConfig) -> Result<Self> {
        config.validate()?;

        let peers = PeerTables::new();
        let algorithm = config.algorithm;
        let policies = env
            .agents
            .iter()
            .map(|&agent| (agent, algorithm.build(agent, config, &env, &peers)))
            .collect();

        info!(%algorithm, drones = env.swarm_size(), seed = env.seed, "Routing engine created");

        Ok(Self {
            env,
            algorithm,
            policies,
            peers,
            delivered: 0,
            expired: 0,
        })
    }

    pub fn algorithm(&self) -> RoutingAlgorithm {
        self.algorithm
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn peers(&self) -> &PeerTables {
        &self.peers
    }

    pub fn policy(&self, agent: AgentId) -> Option<&dyn RoutingPolicy> {
        self.policies.get(&agent).map(|policy| policy.as_ref())
    }

    /// Ask `drone`'s policy for the next carrier of `packet`
    pub fn select_relay(
        &mut self,
        step: Step,
        drone: DroneView,
        neighbors: &[Neighbor],
        packet: &Packet,
    ) -> Result<Option<AgentId>> {
        let policy = self
            .policies
            .get_mut(&drone.id)
            .ok_or(FanetError::UnknownAgent(drone.id.0))?;
        let ctx = RoutingContext::new(&self.env, step, drone);
        policy.select_relay(&ctx, neighbors, packet)
    }

    /// Report the outcome of `event` to the drone that routed it.
    ///
    /// `drone` is the deciding drone, `holder` the one carrying the packet
    /// when the event resolved. Only reports that resolve one of the drone's
    /// pending decisions are counted in [`EngineStats`]; repeats and events
    /// the drone never decided on are not.
    pub fn on_outcome(
        &mut self,
        step: Step,
        drone: DroneView,
        holder: AgentId,
        event: EventId,
        delay: Step,
        outcome: Outcome,
    ) -> Result<()> {
        let policy = self
            .policies
            .get_mut(&drone.id)
            .ok_or(FanetError::UnknownAgent(drone.id.0))?;
        let ctx = RoutingContext::new(&self.env, step, drone);
        let pending = policy.pending_decisions();
        policy.on_outcome(&ctx, holder, event, delay, outcome)?;
        if policy.pending_decisions() >= pending {
            return Ok(());
        }

        match outcome {
            Outcome::Delivered => self.delivered += 1,
            Outcome::Expired => self.expired += 1,
        }
        Ok(())
    }

    /// Hand an inbound message to `drone`'s policy
    pub fn on_message(
        &mut self,
        step: Step,
        drone: DroneView,
        source: AgentId,
        message: &Message,
    ) -> Result<Vec<Outbound>> {
        let policy = self
            .policies
            .get_mut(&drone.id)
            .ok_or(FanetError::UnknownAgent(drone.id.0))?;
        let ctx = RoutingContext::new(&self.env, step, drone);
        let outbound = policy.on_message(&ctx, source, message)?;

        debug!(agent = %ctx.me(), %source, kind = message.kind(), replies = outbound.len(), "Message handled");
        Ok(outbound)
    }

    /// Decisions across the swarm still waiting for their outcome
    pub fn pending_decisions(&self) -> usize {
        self.policies.values().map(|policy| policy.pending_decisions()).sum()
    }

    /// Reset the outcome counters kept by the engine itself
    pub fn reset_outcomes(&mut self) {
        self.delivered = 0;
        self.expired = 0;
    }

    /// Get statistics
    pub fn stats(&self) -> EngineStats {
        let mut totals = PolicyStats::default();
        for policy in self.policies.values() {
            totals.merge(&policy.stats());
        }

        EngineStats {
            algorithm: self.algorithm,
            drones: self.policies.len(),
            decisions: totals.decisions,
            relays: totals.relays,
            retains: totals.retains,
            explorations: totals.explorations,
            exploitations: totals.exploitations,
            value_updates: totals.value_updates,
            outcomes: self.delivered + self.expired,
            delivered: self.delivered,
            expired: self.expired,
            pending: self.pending_decisions(),
        }
    }
}

/// Engine statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub algorithm: RoutingAlgorithm,
    pub drones: usize,
    pub decisions: u64,
    pub relays: u64,
    pub retains: u64,
    pub explorations: u64,
    pub exploitations: u64,
    pub value_updates: u64,
    pub outcomes: u64,
    pub delivered: u64,
    pub expired: u64,
    pub pending: usize,
}

impl EngineStats {
    /// Share of decisions that handed the packet on
    pub fn relay_ratio(&self) -> f64 {
        if self.decisions == 0 {
            0.0
        } else {
            self.relays as f64 / self.decisions as f64
        }
    }
}
