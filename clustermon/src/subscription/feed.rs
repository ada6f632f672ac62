use std::fmt;
use std::time::Duration;

use anyerror::AnyError;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::warn;

use crate::core::io::notification::Notification;
use crate::membership::Address;
use crate::query::driver::Driver;
use crate::telemetry::MemoryStats;

/// Monotonically increasing id of a subscription, unique within a monitor.
pub type SubscriptionId = u64;

/// The kinds of telemetry every member is polled for.
#[derive(Debug, Clone, Copy)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(derive_more::Display)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum FeedKind {
    /// A trivial query keeping the connection alive and measuring latency.
    #[display("ping")]
    Ping,

    /// JVM heap statistics.
    #[display("memory")]
    Memory,
}

impl FeedKind {
    pub fn all() -> [FeedKind; 2] {
        [FeedKind::Ping, FeedKind::Memory]
    }
}

/// Describes what a feed polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSpec {
    pub kind: FeedKind,

    /// The Cypher statement a feed runs on every poll.
    pub query: &'static str,
}

impl FeedSpec {
    pub const PING: FeedSpec = FeedSpec {
        kind: FeedKind::Ping,
        query: "RETURN true AS value",
    };

    pub const MEMORY: FeedSpec = FeedSpec {
        kind: FeedKind::Memory,
        query: "CALL dbms.queryJmx('java.lang:type=Memory') YIELD attributes \
                WITH attributes AS a \
                RETURN a.HeapMemoryUsage.value.properties.used AS heapUsed, \
                a.HeapMemoryUsage.value.properties.committed AS heapCommitted, \
                a.HeapMemoryUsage.value.properties.max AS heapMax, \
                a.NonHeapMemoryUsage.value.properties.used AS nonHeapUsed, \
                a.NonHeapMemoryUsage.value.properties.committed AS nonHeapCommitted",
    };

    pub fn of(kind: FeedKind) -> FeedSpec {
        match kind {
            FeedKind::Ping => Self::PING,
            FeedKind::Memory => Self::MEMORY,
        }
    }
}

/// The result of one successful ping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct PingSample {
    /// Round trip time of the ping query.
    pub elapsed: Duration,
}

/// One datum delivered by a feed.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum FeedSample {
    Ping(PingSample),
    Memory(MemoryStats),
}

impl FeedSample {
    pub fn kind(&self) -> FeedKind {
        match self {
            FeedSample::Ping(_) => FeedKind::Ping,
            FeedSample::Memory(_) => FeedKind::Memory,
        }
    }
}

impl fmt::Display for FeedSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSample::Ping(p) => write!(f, "ping:{:?}", p.elapsed),
            FeedSample::Memory(m) => write!(f, "memory:{}", m),
        }
    }
}

/// The handle a feed reports through.
///
/// It holds only a weak reference to the monitor core: a feed outliving the
/// monitor sends into nothing.
#[derive(Clone)]
pub struct FeedSender {
    address: Address,
    kind: FeedKind,
    id: SubscriptionId,
    tx: mpsc::WeakUnboundedSender<Notification>,
}

impl fmt::Debug for FeedSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedSender")
            .field("address", &self.address)
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

impl FeedSender {
    pub(crate) fn new(
        address: impl ToString,
        kind: FeedKind,
        id: SubscriptionId,
        tx: mpsc::WeakUnboundedSender<Notification>,
    ) -> Self {
        Self {
            address: address.to_string(),
            kind,
            id,
            tx,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Deliver a sample polled from the member.
    pub fn data(&self, sample: FeedSample) {
        debug_assert_eq!(self.kind, sample.kind());

        self.send(Notification::FeedData {
            address: self.address.clone(),
            kind: self.kind,
            id: self.id,
            sample,
        });
    }

    /// Report a failed poll.
    pub fn error(&self, error: AnyError) {
        debug!(
            "{}: {} feed on {} failed: {}",
            func_name!(),
            self.kind,
            self.address,
            error
        );

        self.send(Notification::FeedError {
            address: self.address.clone(),
            kind: self.kind,
            id: self.id,
            error,
        });
    }

    fn send(&self, notification: Notification) {
        let Some(tx) = self.tx.upgrade() else {
            debug!(
                "failed to upgrade tx, Core may have quit; drop: {}",
                notification
            );
            return;
        };

        if let Err(e) = tx.send(notification) {
            warn!("failed to send feed notification: {}", e.0);
        }
    }
}

/// A running feed.
pub trait Feed: Send + 'static {
    /// Stop polling. No more samples are delivered after this returns.
    fn close(&mut self);
}

/// Creates feeds polling a member through its [`Driver`].
///
/// The factory owns the cadence: a feed keeps delivering through the given
/// [`FeedSender`] until it is closed.
pub trait FeedFactory<D>: Send + 'static
where D: Driver
{
    type Feed: Feed;

    fn create_feed(
        &mut self,
        driver: &D,
        address: &str,
        spec: FeedSpec,
        tx: FeedSender,
    ) -> Self::Feed;
}
