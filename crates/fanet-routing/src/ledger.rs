//! Pending-decision ledger for delayed credit assignment

use std::collections::HashMap;

use fanet_core::EventId;

/// Decisions awaiting the outcome of their event.
///
/// Holds at most one live record per event. A record leaves the ledger
/// exactly once, through [`PendingLedger::take`]; records whose outcome
/// never arrives stay until the policy is dropped.
#[derive(Debug, Clone)]
pub struct PendingLedger<D> {
    entries: HashMap<EventId, D>,
}

impl<D> PendingLedger<D> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Record the decision taken for `event`, replacing an older one
    pub fn record(&mut self, event: EventId, decision: D) -> Option<D> {
        self.entries.insert(event, decision)
    }

    /// Remove and return the decision for `event`, if still pending
    pub fn take(&mut self, event: EventId) -> Option<D> {
        self.entries.remove(&event)
    }

    pub fn get(&self, event: EventId) -> Option<&D> {
        self.entries.get(&event)
    }

    pub fn contains(&self, event: EventId) -> bool {
        self.entries.contains_key(&event)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<D> Default for PendingLedger<D> {
    fn default() -> Self {
        Self::new()
    }
}
