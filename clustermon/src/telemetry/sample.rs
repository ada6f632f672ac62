use std::fmt;

use chrono::DateTime;
use chrono::Utc;

use crate::base::display_ext::DisplayOptionExt;

/// Raw JVM memory statistics reported by a memory feed, in bytes.
///
/// Every field is optional: a member may not report all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct MemoryStats {
    pub heap_used: Option<u64>,
    pub heap_committed: Option<u64>,
    pub heap_max: Option<u64>,
    pub non_heap_used: Option<u64>,
    pub non_heap_committed: Option<u64>,
}

impl MemoryStats {
    /// Build stats carrying only the used and committed heap.
    pub fn heap(used: u64, committed: u64) -> Self {
        Self {
            heap_used: Some(used),
            heap_committed: Some(committed),
            ..Default::default()
        }
    }
}

impl fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "heap:{}/{}",
            self.heap_used.display(),
            self.heap_committed.display()
        )
    }
}

/// The latest memory sample of a member with its derived utilization.
///
/// `fraction_used + fraction_free == 1` always holds. When the committed heap
/// is unknown or zero, `fraction_used` is `0`.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct TelemetrySample {
    pub stats: MemoryStats,
    pub fraction_used: f64,
    pub fraction_free: f64,
    pub last_updated: DateTime<Utc>,
}

impl TelemetrySample {
    pub fn new(stats: MemoryStats, now: DateTime<Utc>) -> Self {
        let fraction_used = match stats.heap_committed {
            Some(committed) if committed > 0 => {
                stats.heap_used.unwrap_or_default() as f64 / committed as f64
            }
            _ => 0.0,
        };

        Self {
            stats,
            fraction_used,
            fraction_free: 1.0 - fraction_used,
            last_updated: now,
        }
    }

    pub fn heap_used(&self) -> Option<u64> {
        self.stats.heap_used
    }

    pub fn heap_committed(&self) -> Option<u64> {
        self.stats.heap_committed
    }
}

impl fmt::Display for TelemetrySample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, used:{:.1}%, at:{}",
            self.stats,
            self.fraction_used * 100.0,
            self.last_updated
        )
    }
}
