//! Per-run delivery metrics
//!
//! The driver feeds packet lifecycle events into [`RunMetrics`] and turns
//! the totals into one [`RunRecord`] per (drone count, algorithm, seed).
//! Records are written as JSON lines.

use serde::{Deserialize, Serialize};
use tracing::debug;

use fanet_core::{Result, Step};

use crate::policy::RoutingAlgorithm;

/// Identity of one simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunKey {
    pub drone_count: usize,
    pub algorithm: RoutingAlgorithm,
    pub seed: u64,
}

impl RunKey {
    pub fn new(drone_count: usize, algorithm: RoutingAlgorithm, seed: u64) -> Self {
        Self {
            drone_count,
            algorithm,
            seed,
        }
    }
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub key: RunKey,
    /// Mean steps from generation to depot over delivered packets
    pub mean_delivery_time: f64,
    /// Delivered over generated, never above 1
    pub delivery_ratio: f64,
    /// Mean drone-to-drone hand-offs per delivered packet
    pub mean_relays: f64,
}

impl RunRecord {
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

/// Packet lifecycle counters for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub generated: u64,
    pub delivered: u64,
    pub expired: u64,
    pub total_delivery_time: Step,
    pub total_relays: u64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_generated(&mut self) {
        self.generated += 1;
    }

    pub fn record_delivered(&mut self, delivery_time: Step, relays: usize) {
        self.delivered += 1;
        self.total_delivery_time += delivery_time;
        self.total_relays += relays as u64;
    }

    pub fn record_expired(&mut self) {
        self.expired += 1;
    }

    pub fn mean_delivery_time(&self) -> f64 {
        mean(self.total_delivery_time, self.delivered)
    }

    /// Copies of one packet can reach the depot more than once, so the raw
    /// ratio is clamped.
    pub fn delivery_ratio(&self) -> f64 {
        if self.generated == 0 {
            return 0.0;
        }
        (self.delivered as f64 / self.generated as f64).min(1.0)
    }

    pub fn mean_relays(&self) -> f64 {
        mean(self.total_relays, self.delivered)
    }

    pub fn finish(&self, key: RunKey) -> RunRecord {
        let record = RunRecord {
            key,
            mean_delivery_time: self.mean_delivery_time(),
            delivery_ratio: self.delivery_ratio(),
            mean_relays: self.mean_relays(),
        };
        debug!(?key, ratio = record.delivery_ratio, time = record.mean_delivery_time, "Run summarized");
        record
    }
}

fn mean(total: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}
