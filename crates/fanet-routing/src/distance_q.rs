//! Distance-based Q-learning relay selection
//!
//! Tabular Q-learning over `(drone, cell)` states. Each packet's event is
//! credited once it resolves: +2 plus a speed bonus on delivery, -2 on
//! expiry. Action selection starts with a warm-up of uniform random picks,
//! then switches to an epsilon-greedy rule that divides each neighbor's
//! value by its (scaled) distance to the depot.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info};

use fanet_core::{
    euclidean_distance, AgentId, EventId, Neighbor, NeighborView, Outcome, Packet, Result, Step,
};

use crate::config::DistanceQConfig;
use crate::context::{Environment, RoutingContext};
use crate::ledger::PendingLedger;
use crate::policy::{PolicyStats, RoutingPolicy};
use crate::state::DroneCellState;

/// Decision awaiting its event's outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingDecision {
    pub state: DroneCellState,
    /// The chosen relay; the deciding drone itself for "retain"
    pub action: AgentId,
    pub successor: DroneCellState,
}

pub struct DistanceQLearning {
    agent: AgentId,
    config: DistanceQConfig,
    q_table: HashMap<DroneCellState, HashMap<AgentId, f64>>,
    ledger: PendingLedger<PendingDecision>,
    rng: StdRng,
    /// Random picks so far, warm-up and exploration alike
    random_selections: u64,
    stats: PolicyStats,
}

impl DistanceQLearning {
    pub fn new(agent: AgentId, config: DistanceQConfig, env: &Environment) -> Self {
        info!(%agent, alpha = config.alpha, gamma = config.gamma, epsilon = config.epsilon,
            "Distance-based Q-learning policy created");
        Self {
            agent,
            config,
            q_table: HashMap::new(),
            ledger: PendingLedger::new(),
            rng: env.agent_rng(agent),
            random_selections: 0,
            stats: PolicyStats::default(),
        }
    }

    /// Reward for a resolved event: -2 on expiry, `2 + floor(1000/delay)` on delivery
    pub fn reward(delay: Step, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Expired => -2.0,
            Outcome::Delivered => 2.0 + (1000 / delay.max(1)) as f64,
        }
    }

    pub fn q_value(&self, state: &DroneCellState, action: AgentId) -> Option<f64> {
        self.q_table.get(state)?.get(&action).copied()
    }

    pub fn known_states(&self) -> usize {
        self.q_table.len()
    }

    pub fn random_selections(&self) -> u64 {
        self.random_selections
    }

    /// Warm-up lasts until every drone could have been sampled once
    pub fn is_warming_up(&self, env: &Environment) -> bool {
        self.random_selections < env.swarm_size() as u64
    }

    pub fn pending(&self, event: EventId) -> Option<&PendingDecision> {
        self.ledger.get(event)
    }

    fn ensure_state(&mut self, state: DroneCellState, env: &Environment) {
        let optimistic = self.config.optimistic_value;
        self.q_table.entry(state).or_insert_with(|| {
            env.agents
                .iter()
                .map(|agent| (*agent, optimistic))
                .collect()
        });
    }

    /// Value of `action` in `state`, materialized optimistically when unseen
    fn action_value(&mut self, state: DroneCellState, action: AgentId) -> f64 {
        let optimistic = self.config.optimistic_value;
        *self
            .q_table
            .entry(state)
            .or_default()
            .entry(action)
            .or_insert(optimistic)
    }

    /// Uniform pick among the neighbors and "retain"
    fn random_choice(&mut self, candidates: &[&NeighborView]) -> Option<AgentId> {
        self.random_selections += 1;
        self.stats.explorations += 1;
        let index = self.rng.gen_range(0..=candidates.len());
        candidates.get(index).map(|neighbor| neighbor.id)
    }

    fn distance_epsilon_greedy(
        &mut self,
        ctx: &RoutingContext<'_>,
        state: DroneCellState,
        candidates: &[&NeighborView],
    ) -> Option<AgentId> {
        // The holder can reach the depot itself
        if ctx.drone.distance_to_depot() <= ctx.drone.communication_range {
            return None;
        }
        if self.rng.gen::<f64>() <= 1.0 - self.config.epsilon {
            self.distance_greedy(ctx, state, candidates)
        } else {
            self.random_choice(candidates)
        }
    }

    /// Highest `Q(s, n) / (distance(n, depot) / scale)` wins
    fn distance_greedy(
        &mut self,
        ctx: &RoutingContext<'_>,
        state: DroneCellState,
        candidates: &[&NeighborView],
    ) -> Option<AgentId> {
        self.stats.exploitations += 1;

        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        for neighbor in candidates {
            let to_depot = euclidean_distance(neighbor.position, ctx.drone.depot);
            // Direct delivery shortcut, also keeps the division below away from zero
            if to_depot <= neighbor.communication_range {
                return Some(neighbor.id);
            }
            let score = self.action_value(state, neighbor.id) / (to_depot / self.config.distance_scale);
            if score > best_score {
                best_score = score;
                best = Some(neighbor.id);
            }
        }
        best
    }
}

impl RoutingPolicy for DistanceQLearning {
    fn name(&self) -> &str {
        "distance_q_learning"
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

        let state = DroneCellState::current(ctx)?;
        let successor = DroneCellState::successor(ctx)?;
        self.ensure_state(state, ctx.env);

        let candidates: Vec<&NeighborView> = neighbors.iter().map(|n| &n.view).collect();
        let choice = if self.is_warming_up(ctx.env) {
            self.random_choice(&candidates)
        } else {
            self.distance_epsilon_greedy(ctx, state, &candidates)
        };

        self.ensure_state(successor, ctx.env);

        let action = choice.unwrap_or(self.agent);
        self.ledger.record(
            packet.event_id,
            PendingDecision {
                state,
                action,
                successor,
            },
        );
        self.stats.record_choice(choice);

        debug!(agent = %self.agent, event = %packet.event_id, %state, %action, "Relay selected");
        Ok(choice)
    }

    fn on_outcome(
        &mut self,
        _ctx: &RoutingContext<'_>,
        _holder: AgentId,
        event: EventId,
        delay: Step,
        outcome: Outcome,
    ) -> Result<()> {
        let Some(decision) = self.ledger.take(event) else {
            return Ok(());
        };

        let reward = Self::reward(delay, outcome);
        let max_next = self
            .q_table
            .get(&decision.successor)
            .and_then(|row| row.values().copied().reduce(f64::max))
            .unwrap_or(self.config.optimistic_value);

        let current = self.action_value(decision.state, decision.action);
        let updated = current
            + self.config.alpha * (reward + self.config.gamma * max_next - current);
        self.q_table
            .entry(decision.state)
            .or_default()
            .insert(decision.action, updated);
        self.stats.value_updates += 1;

        debug!(agent = %self.agent, %event, reward, from = current, to = updated, "Q-value updated");
        Ok(())
    }

    fn pending_decisions(&self) -> usize {
        self.ledger.len()
    }

    fn stats(&self) -> PolicyStats {
        self.stats.clone()
    }
}
