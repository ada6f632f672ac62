use std::cmp::Ordering;
use std::fmt;

use crate::Metrics;

/// A numeric metric entry of a monitor.
///
/// This is used to specify which metric to observe with
/// [`Wait::ge`](crate::metrics::Wait::ge) or
/// [`Wait::eq`](crate::metrics::Wait::eq).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Members(usize),
    Subscriptions(usize),
    Refreshes(u64),
    RefreshFailures(u64),
}

impl Metric {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Metric::Members(_) => "members",
            Metric::Subscriptions(_) => "subscriptions",
            Metric::Refreshes(_) => "refreshes",
            Metric::RefreshFailures(_) => "refresh_failures",
        }
    }

    fn as_u64(&self) -> u64 {
        match self {
            Metric::Members(v) => *v as u64,
            Metric::Subscriptions(v) => *v as u64,
            Metric::Refreshes(v) => *v,
            Metric::RefreshFailures(v) => *v,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name(), self.as_u64())
    }
}

impl Metrics {
    /// The current value of the field `metric` refers to.
    fn metric_value(&self, metric: &Metric) -> u64 {
        match metric {
            Metric::Members(_) => self.members.len() as u64,
            Metric::Subscriptions(_) => self.subscriptions as u64,
            Metric::Refreshes(_) => self.refreshes,
            Metric::RefreshFailures(_) => self.refresh_failures,
        }
    }
}

/// Metric can be compared with Metrics by comparing the corresponding field
/// of Metrics.
impl PartialEq<Metric> for Metrics {
    fn eq(&self, other: &Metric) -> bool {
        self.metric_value(other) == other.as_u64()
    }
}

impl PartialOrd<Metric> for Metrics {
    fn partial_cmp(&self, other: &Metric) -> Option<Ordering> {
        Some(self.metric_value(other).cmp(&other.as_u64()))
    }
}
