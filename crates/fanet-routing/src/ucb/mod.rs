//! UCB Q-learning relay selection
//!
//! State is the cell the deciding drone occupies. Each cell holds one value
//! per possible target drone, initialized to a random vector summing to 1,
//! and one UCB1 arm per target. The drone picks, among itself and its
//! visible neighbors, the target with the highest confidence bound.
//!
//! When the event resolves, the decision is credited with a time-weighted
//! signed reward and bootstrapped from the chosen drone's own table at the
//! cell that drone occupied when chosen (see [`peers`]).

pub mod bound;
pub mod peers;

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, warn};

use fanet_core::{
    AgentId, Cell, EventId, FanetError, Neighbor, Outcome, Packet, Position, Result, Step,
};

pub use bound::UcbArm;
pub use peers::{CellTable, PeerTables, SharedValueTable};

use crate::config::UcbConfig;
use crate::context::{Environment, RoutingContext};
use crate::ledger::PendingLedger;
use crate::policy::{PolicyStats, RoutingPolicy};

/// `len` random values scaled to sum to 1
pub fn random_normalized<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f64> {
    let values: Vec<f64> = (0..len).map(|_| rng.gen::<f64>()).collect();
    let sum: f64 = values.iter().sum();
    if sum > 0.0 {
        values.into_iter().map(|value| value / sum).collect()
    } else {
        vec![1.0 / len as f64; len]
    }
}

/// Decision awaiting its event's outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UcbDecision {
    pub state: Cell,
    /// The deciding drone itself when the packet was retained
    pub chosen: AgentId,
    pub decided_at: Step,
    /// Where the chosen drone was at decision time
    pub chosen_position: Position,
}

pub struct UcbQLearning {
    agent: AgentId,
    config: UcbConfig,
    table: SharedValueTable,
    arms: HashMap<Cell, Vec<UcbArm>>,
    ledger: PendingLedger<UcbDecision>,
    peers: PeerTables,
    rng: StdRng,
    stats: PolicyStats,
}

impl UcbQLearning {
    /// Create the policy and publish its table in `peers`
    pub fn new(agent: AgentId, config: UcbConfig, env: &Environment, peers: &PeerTables) -> Self {
        let table = SharedValueTable::new();
        peers.register(agent, table.clone());

        info!(%agent, alpha = config.alpha, gamma = config.gamma, c = config.exploration,
            "UCB Q-learning policy created");
        Self {
            agent,
            config,
            table,
            arms: HashMap::new(),
            ledger: PendingLedger::new(),
            peers: peers.clone(),
            rng: env.agent_rng(agent),
            stats: PolicyStats::default(),
        }
    }

    /// Time-weighted signed reward: later decisions and faster deliveries weigh more
    pub fn reward(decided_at: Step, now: Step, event_duration: Step, delay: Step, outcome: Outcome) -> f64 {
        let recency = decided_at as f64 / now.max(1) as f64;
        let speed = event_duration as f64 / delay.max(1) as f64;
        recency * speed * outcome.sign()
    }

    pub fn table(&self) -> &SharedValueTable {
        &self.table
    }

    pub fn q_row(&self, cell: Cell) -> Option<Vec<f64>> {
        self.table.row(cell)
    }

    pub fn arm(&self, cell: Cell, target: AgentId) -> Option<UcbArm> {
        self.arms.get(&cell)?.get(target.index()).copied()
    }

    pub fn pending(&self, event: EventId) -> Option<&UcbDecision> {
        self.ledger.get(event)
    }
}

impl RoutingPolicy for UcbQLearning {
    fn name(&self) -> &str {
        "ucb_q_learning"
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

        let cell = ctx.current_cell()?;
        let swarm_size = ctx.env.swarm_size();
        let step = ctx.step;
        let c = self.config.exploration;
        let me = self.agent;
        if me.index() >= swarm_size {
            return Err(FanetError::UnknownAgent(me.0));
        }

        let rng = &mut self.rng;
        let mut table = self.table.write();
        let row = table
            .entry(cell)
            .or_insert_with(|| random_normalized(swarm_size, rng));
        let arms = self
            .arms
            .entry(cell)
            .or_insert_with(|| vec![UcbArm::new(); swarm_size]);

        let own_value = *row.get(me.index()).ok_or(FanetError::UnknownAgent(me.0))?;
        let mut best = me;
        let mut best_position = ctx.drone.position;
        let mut best_estimate = arms[me.index()].refresh(step, own_value, c);

        for neighbor in neighbors {
            let index = neighbor.id().index();
            let (Some(value), Some(arm)) = (row.get(index), arms.get_mut(index)) else {
                warn!(agent = %me, neighbor = %neighbor.id(), "Neighbor outside the swarm, skipped");
                continue;
            };
            let estimate = arm.refresh(step, *value, c);
            if estimate > best_estimate {
                best_estimate = estimate;
                best = neighbor.id();
                best_position = neighbor.view.position;
            }
        }
        arms[best.index()].record_selection();
        drop(table);

        self.ledger.record(
            packet.event_id,
            UcbDecision {
                state: cell,
                chosen: best,
                decided_at: step,
                chosen_position: best_position,
            },
        );
        let choice = (best != me).then_some(best);
        self.stats.record_choice(choice);

        debug!(agent = %me, event = %packet.event_id, %cell, chosen = %best, bound = best_estimate, "Relay selected");
        Ok(choice)
    }

    /// Credits the decision through the chosen drone's value table.
    ///
    /// The successor value is read from the table of the drone that was
    /// chosen, at the cell it occupied when chosen, via [`PeerTables`].
    /// This cross-agent read is part of the algorithm.
    fn on_outcome(
        &mut self,
        ctx: &RoutingContext<'_>,
        _holder: AgentId,
        event: EventId,
        delay: Step,
        outcome: Outcome,
    ) -> Result<()> {
        let Some(decision) = self.ledger.take(event) else {
            return Ok(());
        };

        let successor = ctx.env.cell_of(decision.chosen_position)?;
        let swarm_size = ctx.env.swarm_size();
        let rng = &mut self.rng;
        let best_next = self
            .peers
            .best_value(decision.chosen, successor, || random_normalized(swarm_size, rng))
            .unwrap_or_else(|| {
                warn!(agent = %self.agent, chosen = %decision.chosen, "Chosen drone has no value table");
                0.0
            });

        let reward = Self::reward(decision.decided_at, ctx.step, ctx.env.event_duration, delay, outcome);

        let mut table = self.table.write();
        let Some(value) = table
            .get_mut(&decision.state)
            .and_then(|row| row.get_mut(decision.chosen.index()))
        else {
            return Ok(());
        };
        let previous = *value;
        *value = previous + self.config.alpha * (reward + self.config.gamma * best_next - previous);
        let updated = *value;
        drop(table);
        self.stats.value_updates += 1;

        debug!(agent = %self.agent, %event, reward, from = previous, to = updated, "Q-value updated");
        Ok(())
    }

    fn pending_decisions(&self) -> usize {
        self.ledger.len()
    }

    fn stats(&self) -> PolicyStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{drone, env, neighbor};
    use rand::SeedableRng;

    #[test]
    fn test_random_normalized_sums_to_one() {
        let mut rng = StdRng::seed_from_u64(3);
        let row = random_normalized(6, &mut rng);
        assert_eq!(row.len(), 6);
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(row.iter().all(|value| *value >= 0.0));
    }

    #[test]
    fn test_reward_function() {
        // half-way decision, delivered in a quarter of the event duration
        assert!((UcbQLearning::reward(50, 100, 2000, 500, Outcome::Delivered) - 2.0).abs() < 1e-12);
        assert!((UcbQLearning::reward(50, 100, 2000, 500, Outcome::Expired) + 2.0).abs() < 1e-12);
        // guards against zero step and zero delay
        assert!(UcbQLearning::reward(0, 0, 2000, 0, Outcome::Delivered).is_finite());
    }

    #[test]
    fn test_first_visit_creates_row_and_arms() {
        let env = env(4);
        let peers = PeerTables::new();
        let mut policy = UcbQLearning::new(AgentId(0), UcbConfig::default(), &env, &peers);
        let ctx = RoutingContext::new(&env, 5, drone(0, 150.0, 50.0));

        policy
            .select_relay(&ctx, &[neighbor(1, 160.0, 60.0, 5)], &Packet::new(EventId(1)))
            .unwrap();

        let row = policy.q_row(Cell(1)).unwrap();
        assert_eq!(row.len(), 4);
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);

        let selections: u64 = (0..4)
            .map(|id| policy.arm(Cell(1), AgentId(id)).unwrap().selections)
            .sum();
        assert_eq!(selections, 5);
    }

    #[test]
    fn test_selects_highest_bound() {
        let env = env(3);
        let peers = PeerTables::new();
        let mut policy = UcbQLearning::new(AgentId(0), UcbConfig::default(), &env, &peers);
        let ctx = RoutingContext::new(&env, 1, drone(0, 50.0, 50.0));
        // step 1: bounds equal the values
        policy.table().write().insert(Cell(0), vec![0.2, 0.1, 0.7]);

        let choice = policy
            .select_relay(
                &ctx,
                &[neighbor(1, 60.0, 60.0, 1), neighbor(2, 70.0, 70.0, 1)],
                &Packet::new(EventId(1)),
            )
            .unwrap();

        assert_eq!(choice, Some(AgentId(2)));
        assert_eq!(policy.arm(Cell(0), AgentId(2)).unwrap().selections, 2);
        let decision = policy.pending(EventId(1)).unwrap();
        assert_eq!(decision.chosen_position, Position::new(70.0, 70.0));
        assert_eq!(decision.decided_at, 1);
    }

    #[test]
    fn test_retain_when_own_bound_is_highest() {
        let env = env(2);
        let peers = PeerTables::new();
        let mut policy = UcbQLearning::new(AgentId(0), UcbConfig::default(), &env, &peers);
        let ctx = RoutingContext::new(&env, 1, drone(0, 50.0, 50.0));
        policy.table().write().insert(Cell(0), vec![0.9, 0.1]);

        let choice = policy
            .select_relay(&ctx, &[neighbor(1, 60.0, 60.0, 1)], &Packet::new(EventId(1)))
            .unwrap();

        assert_eq!(choice, None);
        assert_eq!(policy.pending(EventId(1)).unwrap().chosen, AgentId(0));
        assert_eq!(policy.pending(EventId(1)).unwrap().chosen_position, Position::new(50.0, 50.0));
    }

    #[test]
    fn test_outcome_bootstraps_from_chosen_peer() {
        let env = env(2).with_event_duration(2000);
        let peers = PeerTables::new();
        let mut me = UcbQLearning::new(AgentId(0), UcbConfig::default(), &env, &peers);
        let peer = UcbQLearning::new(AgentId(1), UcbConfig::default(), &env, &peers);

        me.table().write().insert(Cell(0), vec![0.1, 0.6]);
        // peer sits in cell 1 when chosen
        peer.table().write().insert(Cell(1), vec![0.3, 0.8]);

        let ctx = RoutingContext::new(&env, 1, drone(0, 50.0, 50.0));
        let choice = me
            .select_relay(&ctx, &[neighbor(1, 150.0, 50.0, 1)], &Packet::new(EventId(2)))
            .unwrap();
        assert_eq!(choice, Some(AgentId(1)));

        let later = RoutingContext::new(&env, 4, drone(0, 50.0, 50.0));
        me.on_outcome(&later, AgentId(1), EventId(2), 1000, Outcome::Delivered)
            .unwrap();

        // reward = (1/4) * (2000/1000) * 1 = 0.5
        let expected = 0.6 + 0.5 * (0.5 + 0.5 * 0.8 - 0.6);
        let row = me.q_row(Cell(0)).unwrap();
        assert!((row[1] - expected).abs() < 1e-12);
        assert_eq!(row[0], 0.1);
        // the peer's own table is untouched
        assert_eq!(peer.q_row(Cell(1)), Some(vec![0.3, 0.8]));
        assert_eq!(me.pending_decisions(), 0);
    }

    #[test]
    fn test_outcome_materializes_missing_peer_row() {
        let env = env(2);
        let peers = PeerTables::new();
        let mut me = UcbQLearning::new(AgentId(0), UcbConfig::default(), &env, &peers);
        let peer = UcbQLearning::new(AgentId(1), UcbConfig::default(), &env, &peers);
        me.table().write().insert(Cell(0), vec![0.1, 0.6]);

        let ctx = RoutingContext::new(&env, 1, drone(0, 50.0, 50.0));
        me.select_relay(&ctx, &[neighbor(1, 450.0, 50.0, 1)], &Packet::new(EventId(2)))
            .unwrap();
        assert!(peer.q_row(Cell(4)).is_none());

        me.on_outcome(&ctx, AgentId(1), EventId(2), 100, Outcome::Expired)
            .unwrap();

        let row = peer.q_row(Cell(4)).unwrap();
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_drone_outside_swarm_leaves_no_state() {
        let env = env(2);
        let peers = PeerTables::new();
        let mut policy = UcbQLearning::new(AgentId(5), UcbConfig::default(), &env, &peers);
        let ctx = RoutingContext::new(&env, 1, drone(5, 50.0, 50.0));

        let result = policy.select_relay(&ctx, &[neighbor(1, 60.0, 60.0, 1)], &Packet::new(EventId(1)));

        assert!(matches!(result, Err(FanetError::UnknownAgent(5))));
        assert!(policy.q_row(Cell(0)).is_none());
        assert!(policy.arm(Cell(0), AgentId(1)).is_none());
        assert_eq!(policy.pending_decisions(), 0);
        assert_eq!(policy.stats(), PolicyStats::default());
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let env = env(2);
        let peers = PeerTables::new();
        let mut policy = UcbQLearning::new(AgentId(0), UcbConfig::default(), &env, &peers);
        let ctx = RoutingContext::new(&env, 1, drone(0, 50.0, 50.0));

        policy
            .on_outcome(&ctx, AgentId(0), EventId(42), 10, Outcome::Delivered)
            .unwrap();
        assert_eq!(policy.stats().value_updates, 0);
    }
}
