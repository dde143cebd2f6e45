//! Baseline policy that never forwards

use fanet_core::{AgentId, EventId, Neighbor, Outcome, Packet, Result, Step};

use crate::context::RoutingContext;
use crate::policy::{PolicyStats, RoutingPolicy};

/// Keeps every packet until its holder reaches the depot
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRouting;

impl NoRouting {
    pub fn new() -> Self {
        Self
    }
}

impl RoutingPolicy for NoRouting {
    fn name(&self) -> &str {
        "no_routing"
    }

    fn select_relay(
        &mut self,
        _ctx: &RoutingContext<'_>,
        _neighbors: &[Neighbor],
        _packet: &Packet,
    ) -> Result<Option<AgentId>> {
        Ok(None)
    }

    fn on_outcome(
        &mut self,
        _ctx: &RoutingContext<'_>,
        _holder: AgentId,
        _event: EventId,
        _delay: Step,
        _outcome: Outcome,
    ) -> Result<()> {
        Ok(())
    }

    fn pending_decisions(&self) -> usize {
        0
    }

    fn stats(&self) -> PolicyStats {
        PolicyStats::default()
    }
}
