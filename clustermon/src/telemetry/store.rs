use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;

use crate::membership::Address;
use crate::telemetry::MemoryStats;
use crate::telemetry::TelemetrySample;

/// The latest [`TelemetrySample`] of every member, keyed by bolt address.
#[derive(Debug, Clone, Default)]
pub struct TelemetryStore {
    samples: BTreeMap<Address, TelemetrySample>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &str) -> Option<&TelemetrySample> {
        self.samples.get(address)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// A copy of all samples.
    pub fn snapshot(&self) -> BTreeMap<Address, TelemetrySample> {
        self.samples.clone()
    }

    /// Store a new sample for `address`.
    ///
    /// Returns the replaced sample, if any, and a copy of the stored one.
    pub fn update(
        &mut self,
        address: &str,
        stats: MemoryStats,
        now: DateTime<Utc>,
    ) -> (Option<TelemetrySample>, TelemetrySample) {
        let sample = TelemetrySample::new(stats, now);
        let prev = self.samples.insert(address.to_string(), sample.clone());
        (prev, sample)
    }

    pub fn remove(&mut self, address: &str) -> Option<TelemetrySample> {
        self.samples.remove(address)
    }
}
