//! Most recent beacon per neighbor

use std::collections::HashMap;

use fanet_core::{AgentId, Beacon, Step};

#[derive(Debug, Clone, Default)]
pub struct BeaconCache {
    beacons: HashMap<AgentId, Beacon>,
}

impl BeaconCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `beacon` unless a newer one from the same source is cached
    pub fn refresh(&mut self, beacon: Beacon) {
        match self.beacons.get(&beacon.source) {
            Some(cached) if cached.created_at > beacon.created_at => {}
            _ => {
                self.beacons.insert(beacon.source, beacon);
            }
        }
    }

    pub fn get(&self, agent: AgentId) -> Option<&Beacon> {
        self.beacons.get(&agent)
    }

    /// Beacons no older than `max_age` steps, ordered by sender id
    pub fn visible(&self, now: Step, max_age: Step) -> Vec<&Beacon> {
        let mut visible: Vec<&Beacon> = self
            .beacons
            .values()
            .filter(|beacon| beacon.is_fresh(now, max_age))
            .collect();
        visible.sort_by_key(|beacon| beacon.source);
        visible
    }

    pub fn len(&self) -> usize {
        self.beacons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beacons.is_empty()
    }
}
