//! Fully-echoed Q-routing
//!
//! Each drone keeps, per neighbor, an estimate of the seconds needed to
//! reach the depot through that neighbor (lower is better). Estimates are
//! learned from the protocol rather than from event outcomes:
//!
//! - `Data`: the receiver answers with an `Acknowledge` carrying its own
//!   best estimate and the timing of the hop.
//! - `Acknowledge`: the sender updates its value for the receiver with the
//!   fixed rate `eta`, records the change, then broadcasts its own new best
//!   estimate as an `Estimate`.
//! - `Estimate`: neighbors update their value for the broadcaster with the
//!   dynamic rate `eta_2`.
//!
//! Relay selection is epsilon-greedy with `epsilon = exp(-10 / T)`, where
//! the temperature `T` cools with the routing step and heats up with the
//! instability observed in recent updates.

pub mod annealing;
pub mod beacons;
pub mod history;

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, warn};

use fanet_core::{
    euclidean_distance, AckMessage, AgentId, Beacon, DataMessage, EstimateMessage, EventId,
    Message, Neighbor, Outbound, Outcome, Packet, Position, Result, Step,
};

pub use annealing::Annealing;
pub use beacons::BeaconCache;
pub use history::ChangeHistory;

use crate::config::EchoedConfig;
use crate::context::{Environment, RoutingContext};
use crate::ledger::PendingLedger;
use crate::policy::{PolicyStats, RoutingPolicy};

/// Seconds to fly from `position` to `depot` at `speed`
fn travel_time(position: Position, speed: f64, depot: Position) -> f64 {
    let distance = euclidean_distance(position, depot);
    if speed > 0.0 {
        distance / speed
    } else {
        distance
    }
}

pub struct FullyEchoedRouting {
    agent: AgentId,
    config: EchoedConfig,
    /// Neighbor -> estimated seconds to the depot through it
    q_table: HashMap<AgentId, f64>,
    beacons: BeaconCache,
    history: ChangeHistory,
    annealing: Annealing,
    ledger: PendingLedger<AgentId>,
    t_est: f64,
    t_max: f64,
    eta_2: f64,
    rng: StdRng,
    stats: PolicyStats,
}

impl FullyEchoedRouting {
    pub fn new(agent: AgentId, config: EchoedConfig, env: &Environment) -> Self {
        let run_seconds = env.step_duration * env.sim_duration as f64;
        let annealing = Annealing::new(run_seconds / config.k_max_divisor);
        let t_est = 1.0;
        let t_max = 1.0;
        let eta_2 = (t_est / t_max) * config.eta * config.echo_rate;

        info!(%agent, eta = config.eta, k_max = annealing.k_max(), "Fully-echoed Q-routing policy created");
        Self {
            agent,
            history: ChangeHistory::new(config.history_len),
            config,
            q_table: HashMap::new(),
            beacons: BeaconCache::new(),
            annealing,
            ledger: PendingLedger::new(),
            t_est,
            t_max,
            eta_2,
            rng: env.agent_rng(agent),
            stats: PolicyStats::default(),
        }
    }

    pub fn q_value(&self, neighbor: AgentId) -> Option<f64> {
        self.q_table.get(&neighbor).copied()
    }

    pub fn history(&self) -> &ChangeHistory {
        &self.history
    }

    pub fn annealing(&self) -> &Annealing {
        &self.annealing
    }

    pub fn beacons(&self) -> &BeaconCache {
        &self.beacons
    }

    /// Current `(eta, eta_2)` learning rates
    pub fn learning_rates(&self) -> (f64, f64) {
        (self.config.eta, self.eta_2)
    }

    /// Current `(T_est, T_max)` delivery-time estimates
    pub fn delivery_estimates(&self) -> (f64, f64) {
        (self.t_est, self.t_max)
    }

    /// Neighbors whose beacon is still fresh at the current step
    pub fn visible_neighbors(&self, ctx: &RoutingContext<'_>) -> Vec<AgentId> {
        self.beacons
            .visible(ctx.step, ctx.env.beacon_max_age)
            .into_iter()
            .map(|beacon| beacon.source)
            .collect()
    }

    /// First sight of a neighbor: estimate its straight flight to the depot
    fn learn_neighbor(&mut self, beacon: &Beacon, depot: Position) {
        self.q_table
            .entry(beacon.source)
            .or_insert_with(|| travel_time(beacon.position, beacon.speed, depot));
    }

    /// Fresh neighbors from the beacon cache, registered in the Q-table
    fn refresh_visible(&mut self, ctx: &RoutingContext<'_>) -> Vec<AgentId> {
        let visible: Vec<Beacon> = self
            .beacons
            .visible(ctx.step, ctx.env.beacon_max_age)
            .into_iter()
            .cloned()
            .collect();
        for beacon in &visible {
            self.learn_neighbor(beacon, ctx.drone.depot);
        }
        visible.into_iter().map(|beacon| beacon.source).collect()
    }

    fn best_estimate(&self, neighbors: &[AgentId]) -> Option<f64> {
        neighbors
            .iter()
            .filter_map(|id| self.q_table.get(id).copied())
            .reduce(f64::min)
    }

    /// This drone's time-to-depot: best neighbor value, or its own flight time
    fn own_estimate(&mut self, ctx: &RoutingContext<'_>) -> (Vec<AgentId>, f64) {
        let visible = self.refresh_visible(ctx);
        let estimate = self.best_estimate(&visible).unwrap_or_else(|| {
            travel_time(ctx.drone.position, ctx.drone.speed, ctx.drone.depot)
        });
        (visible, estimate)
    }

    /// Starting value for a sender first heard of through a message
    fn initial_value(&self, ctx: &RoutingContext<'_>, source: AgentId, target: f64) -> f64 {
        self.beacons
            .get(source)
            .map_or(target, |beacon| travel_time(beacon.position, beacon.speed, ctx.drone.depot))
    }

    fn handle_data(
        &mut self,
        ctx: &RoutingContext<'_>,
        source: AgentId,
        data: &DataMessage,
    ) -> Vec<Outbound> {
        let (_, estimate) = self.own_estimate(ctx);
        debug!(agent = %self.agent, %source, event = %data.packet.event_id, estimate, "Data received, acknowledging");

        vec![Outbound::unicast(
            source,
            Message::Acknowledge(AckMessage {
                event_id: data.packet.event_id,
                received_at: ctx.step,
                forwarded_at: data.forwarded_at,
                queue_time: data.packet.queue_time,
                estimate,
            }),
        )]
    }

    fn handle_ack(
        &mut self,
        ctx: &RoutingContext<'_>,
        source: AgentId,
        ack: &AckMessage,
    ) -> Vec<Outbound> {
        if !ack.estimate.is_finite() {
            warn!(agent = %self.agent, %source, "Ignoring acknowledgement with non-finite estimate");
            return Vec::new();
        }

        let hop_steps = ack.received_at.saturating_sub(ack.forwarded_at) as f64;
        let transmission_time =
            hop_steps * ctx.env.step_duration * self.config.transmission_weight;
        let queue_time = ack.queue_time as f64 * ctx.env.step_duration;
        let target = transmission_time + queue_time + ack.estimate;

        let initial = self.initial_value(ctx, source, target);
        let current = *self.q_table.entry(source).or_insert(initial);
        let updated = current + self.config.eta * (target - current);
        self.q_table.insert(source, updated);
        self.history.record(updated);
        self.stats.value_updates += 1;

        let (visible, estimate) = self.own_estimate(ctx);
        debug!(agent = %self.agent, %source, from = current, to = updated, estimate, "Acknowledgement applied");

        if visible.is_empty() {
            return Vec::new();
        }
        vec![Outbound::broadcast(
            visible,
            Message::Estimate(EstimateMessage {
                estimate,
                queue_time,
                transmission_time,
                created_at: ctx.step,
            }),
        )]
    }

    fn handle_estimate(&mut self, ctx: &RoutingContext<'_>, source: AgentId, msg: &EstimateMessage) {
        if !msg.estimate.is_finite() {
            warn!(agent = %self.agent, %source, "Ignoring non-finite estimate");
            return;
        }

        let target = msg.transmission_time + msg.queue_time + msg.estimate;
        let initial = self.initial_value(ctx, source, target);
        let current = *self.q_table.entry(source).or_insert(initial);
        let updated = current + self.eta_2 * (target - current);
        self.q_table.insert(source, updated);
        self.stats.value_updates += 1;

        debug!(agent = %self.agent, %source, from = current, to = updated, eta_2 = self.eta_2, "Estimate applied");
    }

    /// Annealed epsilon-greedy: lowest estimate, or a uniform pick including "retain"
    fn choose(&mut self, candidates: &[AgentId]) -> Option<AgentId> {
        let epsilon = self.annealing.epsilon();
        if self.rng.gen::<f64>() <= 1.0 - epsilon {
            self.stats.exploitations += 1;
            let mut best = None;
            let mut best_value = f64::INFINITY;
            for id in candidates {
                let value = self.q_table.get(id).copied().unwrap_or(f64::INFINITY);
                if value < best_value {
                    best_value = value;
                    best = Some(*id);
                }
            }
            best
        } else {
            self.stats.explorations += 1;
            let index = self.rng.gen_range(0..=candidates.len());
            candidates.get(index).copied()
        }
    }

    fn update_dynamic_rate(&mut self, ctx: &RoutingContext<'_>) {
        let visible = self.refresh_visible(ctx);
        let Some(t_est) = self.best_estimate(&visible) else {
            return;
        };
        self.t_est = t_est;
        self.t_max = self.t_max.max(t_est);
        self.eta_2 = (self.t_est / self.t_max) * self.config.eta * self.config.echo_rate;
    }
}

impl RoutingPolicy for FullyEchoedRouting {
    fn name(&self) -> &str {
        "fully_echoed"
    }

    fn select_relay(
        &mut self,
        ctx: &RoutingContext<'_>,
        neighbors: &[Neighbor],
        packet: &Packet,
    ) -> Result<Option<AgentId>> {
        if neighbors.is_empty() {
            return Ok(None);
        }

        self.annealing.advance();
        for neighbor in neighbors {
            self.learn_neighbor(&neighbor.beacon, ctx.drone.depot);
        }

        // Weak loop avoidance: skip drones that already carried the packet
        let all: Vec<AgentId> = neighbors.iter().map(Neighbor::id).collect();
        let unvisited: Vec<AgentId> = all
            .iter()
            .copied()
            .filter(|id| !packet.visited(*id))
            .collect();
        let candidates = if unvisited.is_empty() { &all } else { &unvisited };

        let choice = self.choose(candidates);
        self.ledger
            .record(packet.event_id, choice.unwrap_or(self.agent));
        self.stats.record_choice(choice);

        self.annealing.set_instability(self.history.instability());
        self.update_dynamic_rate(ctx);

        debug!(
            agent = %self.agent,
            event = %packet.event_id,
            ?choice,
            temperature = self.annealing.temperature(),
            eta_2 = self.eta_2,
            "Relay selected"
        );
        Ok(choice)
    }

    fn on_outcome(
        &mut self,
        _ctx: &RoutingContext<'_>,
        _holder: AgentId,
        event: EventId,
        _delay: Step,
        _outcome: Outcome,
    ) -> Result<()> {
        // Learning is protocol driven; outcomes only release bookkeeping
        self.ledger.take(event);
        Ok(())
    }

    fn on_message(
        &mut self,
        ctx: &RoutingContext<'_>,
        source: AgentId,
        message: &Message,
    ) -> Result<Vec<Outbound>> {
        let outbound = match message {
            Message::Beacon(beacon) => {
                self.beacons.refresh(beacon.clone());
                Vec::new()
            }
            Message::Data(data) => self.handle_data(ctx, source, data),
            Message::Acknowledge(ack) => self.handle_ack(ctx, source, ack),
            Message::Estimate(estimate) => {
                self.handle_estimate(ctx, source, estimate);
                Vec::new()
            }
        };
        Ok(outbound)
    }

    fn pending_decisions(&self) -> usize {
        self.ledger.len()
    }

    fn stats(&self) -> PolicyStats {
        self.stats.clone()
    }
}
