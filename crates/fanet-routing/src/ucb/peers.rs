//! Read path into other drones' UCB value tables
//!
//! Credit assignment in UCB Q-learning bootstraps from the value table of
//! the drone that was chosen as relay, not from the deciding drone's own
//! table. This couples otherwise independent agents. The coupling is
//! confined to this directory: every table sits behind its own lock, only
//! its owner applies TD updates to it, and peers only read it or
//! materialize a missing row with the same rule the owner would use.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use fanet_core::{AgentId, Cell};

/// Cell -> one value per target drone
pub type CellTable = HashMap<Cell, Vec<f64>>;

/// A drone's value table, shareable with the peer directory
#[derive(Debug, Clone, Default)]
pub struct SharedValueTable(Arc<RwLock<CellTable>>);

impl SharedValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, CellTable> {
        self.0.read()
    }

    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, CellTable> {
        self.0.write()
    }

    /// Copy of the row for `cell`
    pub fn row(&self, cell: Cell) -> Option<Vec<f64>> {
        self.0.read().get(&cell).cloned()
    }
}

/// Directory of every UCB drone's table in one swarm
#[derive(Debug, Clone, Default)]
pub struct PeerTables {
    tables: Arc<RwLock<HashMap<AgentId, SharedValueTable>>>,
}

impl PeerTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, agent: AgentId, table: SharedValueTable) {
        self.tables.write().insert(agent, table);
    }

    pub fn table(&self, agent: AgentId) -> Option<SharedValueTable> {
        self.tables.read().get(&agent).cloned()
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }

    /// Highest value in `agent`'s row for `cell`.
    ///
    /// A missing row is created with `init` first. Returns `None` when the
    /// agent has no registered table or the row is empty.
    pub fn best_value(
        &self,
        agent: AgentId,
        cell: Cell,
        init: impl FnOnce() -> Vec<f64>,
    ) -> Option<f64> {
        let table = self.table(agent)?;

        if let Some(row) = table.read().get(&cell) {
            return row.iter().copied().reduce(f64::max);
        }

        let mut guard = table.write();
        let row = guard.entry(cell).or_insert_with(init);
        row.iter().copied().reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_table_is_shared() {
        let peers = PeerTables::new();
        let table = SharedValueTable::new();
        peers.register(AgentId(1), table.clone());

        table.write().insert(Cell(3), vec![0.1, 0.7, 0.2]);

        assert_eq!(peers.len(), 1);
        assert_eq!(peers.best_value(AgentId(1), Cell(3), Vec::new), Some(0.7));
    }

    #[test]
    fn test_missing_row_is_materialized_in_owner_table() {
        let peers = PeerTables::new();
        let table = SharedValueTable::new();
        peers.register(AgentId(2), table.clone());

        let best = peers.best_value(AgentId(2), Cell(8), || vec![0.5, 0.25, 0.25]);

        assert_eq!(best, Some(0.5));
        assert_eq!(table.row(Cell(8)), Some(vec![0.5, 0.25, 0.25]));
    }

    #[test]
    fn test_unknown_agent() {
        let peers = PeerTables::new();
        assert!(peers.is_empty());
        assert_eq!(peers.best_value(AgentId(9), Cell(0), || vec![1.0]), None);
    }
}
