use tracing::debug;

use crate::alert::human_data_size;
use crate::event::Event;
use crate::event::EventKind;
use crate::event::EventPayload;
use crate::event::Severity;
use crate::telemetry::TelemetrySample;

/// Free heap ratios at or below which memory events are raised.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct HeapThresholds {
    /// Raise an [`Severity::Alert`] event at or below this free ratio.
    pub alert_free_ratio: f64,

    /// Raise an [`Severity::Error`] event at or below this free ratio.
    pub error_free_ratio: f64,
}

impl Default for HeapThresholds {
    fn default() -> Self {
        Self {
            alert_free_ratio: 0.10,
            error_free_ratio: 0.02,
        }
    }
}

/// Inspects every memory sample and produces memory events.
///
/// Evaluation is pure: it depends only on its arguments and does not record
/// anything, so there is no hysteresis. A member staying above a threshold
/// raises an event for every sample.
#[derive(Debug, Clone, Default)]
pub struct AlertEvaluator {
    thresholds: HeapThresholds,
}

impl AlertEvaluator {
    pub fn new(thresholds: HeapThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &HeapThresholds {
        &self.thresholds
    }

    /// Evaluate a new sample of `address` against the previous one.
    ///
    /// Emits, in this order:
    /// - an info event if the committed heap changed since `previous`;
    /// - an alert event if the free ratio is at or below the alert threshold;
    /// - an error event if the free ratio is at or below the error threshold.
    ///
    /// The two threshold events are independent: a sample past both
    /// thresholds raises both.
    pub fn evaluate(
        &self,
        address: &str,
        previous: Option<&TelemetrySample>,
        current: &TelemetrySample,
    ) -> Vec<Event> {
        let mut events = vec![];

        if let Some(prev) = previous {
            let prev_heap = prev.heap_committed().unwrap_or_default();
            let now_heap = current.heap_committed();

            if prev_heap > 0 && now_heap != Some(prev_heap) {
                let to = now_heap
                    .map(human_data_size)
                    .unwrap_or_else(|| "unknown".to_string());

                events.push(Event::new(
                    EventKind::Memory,
                    Severity::Info,
                    address,
                    format!(
                        "Heap allocation changed on {} from {} to {}",
                        address,
                        human_data_size(prev_heap),
                        to
                    ),
                    EventPayload::HeapChange {
                        old: prev.clone(),
                        new: current.clone(),
                    },
                ));
            }
        }

        let free = current.fraction_free;

        if free <= self.thresholds.alert_free_ratio {
            events.push(Event::new(
                EventKind::Memory,
                Severity::Alert,
                address,
                format!(
                    "Heap is >= {}% utilization on {}",
                    percent_used(self.thresholds.alert_free_ratio),
                    address
                ),
                EventPayload::Heap(current.clone()),
            ));
        }

        if free <= self.thresholds.error_free_ratio {
            events.push(Event::new(
                EventKind::Memory,
                Severity::Error,
                address,
                format!(
                    "Heap is >= {}% utilization on {}",
                    percent_used(self.thresholds.error_free_ratio),
                    address
                ),
                EventPayload::Heap(current.clone()),
            ));
        }

        if !events.is_empty() {
            debug!(
                "{} address={} sample: {}, events: {}",
                func_name!(),
                address,
                current,
                events.len()
            );
        }

        events
    }
}

/// The used percentage matching a free ratio, e.g. `0.1` gives `90`.
fn percent_used(free_ratio: f64) -> u64 {
    ((1.0 - free_ratio) * 100.0).round() as u64
}
