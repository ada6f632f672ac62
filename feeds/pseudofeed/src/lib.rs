//! Feed factories for a [`clustermon::Monitor`] that do not touch a database.
//!
//! - [`PseudoFeeds`] delivers only what a test pushes into it.
//! - [`TickingFeeds`] generates samples periodically on its own.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use clustermon::subscription::FeedSpec;
use clustermon::subscription::PingSample;
use clustermon::AnyError;
use clustermon::Driver;
use clustermon::Feed;
use clustermon::FeedFactory;
use clustermon::FeedKind;
use clustermon::FeedSample;
use clustermon::FeedSender;
use clustermon::MemoryStats;
use tokio::task::JoinHandle;
use tracing::debug;

type FeedKey = (String, FeedKind);

#[derive(Debug)]
struct PseudoEntry {
    /// The sender of the latest feed created for this key.
    sender: FeedSender,
    open: bool,
    created: usize,
    closed: usize,
}

/// A [`FeedFactory`] whose feeds deliver only what is pushed with
/// [`push()`](Self::push) or [`fail()`](Self::fail).
#[derive(Debug, Clone, Default)]
pub struct PseudoFeeds {
    feeds: Arc<Mutex<BTreeMap<FeedKey, PseudoEntry>>>,
}

impl PseudoFeeds {
    /// Deliver `sample` through the open feed of its kind on `address`.
    ///
    /// Returns `false` if there is no such open feed.
    pub fn push(&self, address: &str, sample: FeedSample) -> bool {
        let kind = sample.kind();
        let Some(sender) = self.open_sender(address, kind) else {
            return false;
        };

        sender.data(sample);
        true
    }

    /// Report an error through the open `kind` feed on `address`.
    pub fn fail(
        &self,
        address: &str,
        kind: FeedKind,
        msg: impl ToString,
    ) -> bool {
        let Some(sender) = self.open_sender(address, kind) else {
            return false;
        };

        sender.error(AnyError::error(msg));
        true
    }

    /// Number of feeds created for `(address, kind)`.
    pub fn created(&self, address: &str, kind: FeedKind) -> usize {
        let feeds = self.feeds.lock().unwrap();
        feeds.get(&(address.to_string(), kind)).map(|e| e.created).unwrap_or(0)
    }

    /// Number of feeds closed for `(address, kind)`.
    pub fn closed(&self, address: &str, kind: FeedKind) -> usize {
        let feeds = self.feeds.lock().unwrap();
        feeds.get(&(address.to_string(), kind)).map(|e| e.closed).unwrap_or(0)
    }

    pub fn is_open(&self, address: &str, kind: FeedKind) -> bool {
        self.open_sender(address, kind).is_some()
    }

    /// Number of open feeds on all addresses.
    pub fn open_feeds(&self) -> usize {
        let feeds = self.feeds.lock().unwrap();
        feeds.values().filter(|e| e.open).count()
    }

    fn open_sender(&self, address: &str, kind: FeedKind) -> Option<FeedSender> {
        let feeds = self.feeds.lock().unwrap();
        let entry = feeds.get(&(address.to_string(), kind))?;

        if entry.open {
            Some(entry.sender.clone())
        } else {
            None
        }
    }
}

impl<D> FeedFactory<D> for PseudoFeeds
where D: Driver
{
    type Feed = PseudoFeed;

    fn create_feed(
        &mut self,
        _driver: &D,
        address: &str,
        spec: FeedSpec,
        tx: FeedSender,
    ) -> Self::Feed {
        debug!("PseudoFeeds::create_feed: {} on {}", spec.kind, address);

        let key = (address.to_string(), spec.kind);

        let mut feeds = self.feeds.lock().unwrap();
        let entry = feeds.entry(key.clone()).or_insert_with(|| PseudoEntry {
            sender: tx.clone(),
            open: false,
            created: 0,
            closed: 0,
        });

        entry.sender = tx;
        entry.open = true;
        entry.created += 1;

        PseudoFeed {
            key,
            feeds: self.feeds.clone(),
        }
    }
}

/// A feed created by [`PseudoFeeds`].
pub struct PseudoFeed {
    key: FeedKey,
    feeds: Arc<Mutex<BTreeMap<FeedKey, PseudoEntry>>>,
}

impl Feed for PseudoFeed {
    fn close(&mut self) {
        let mut feeds = self.feeds.lock().unwrap();
        if let Some(entry) = feeds.get_mut(&self.key) {
            entry.open = false;
            entry.closed += 1;
        }
    }
}

/// A [`FeedFactory`] whose feeds deliver a sample every `interval`.
///
/// Pings take 1ms. Memory samples report `heap_committed` bytes of committed
/// heap and cycle through the `usage` ratios, which makes it easy to
/// trigger heap alerts.
#[derive(Debug, Clone)]
pub struct TickingFeeds {
    interval: Duration,
    heap_committed: u64,
    usage: Vec<f64>,
}

impl TickingFeeds {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            heap_committed: 512_000_000,
            usage: vec![0.5],
        }
    }

    /// Set the committed heap and the used ratios memory samples cycle
    /// through.
    pub fn with_heap(mut self, committed: u64, usage: Vec<f64>) -> Self {
        self.heap_committed = committed;
        if !usage.is_empty() {
            self.usage = usage;
        }
        self
    }

    fn sample(&self, kind: FeedKind, i: usize) -> FeedSample {
        match kind {
            FeedKind::Ping => FeedSample::Ping(PingSample {
                elapsed: Duration::from_millis(1),
            }),
            FeedKind::Memory => {
                let ratio = self.usage[i % self.usage.len()];
                let used = (self.heap_committed as f64 * ratio) as u64;
                FeedSample::Memory(MemoryStats::heap(used, self.heap_committed))
            }
        }
    }
}

impl<D> FeedFactory<D> for TickingFeeds
where D: Driver
{
    type Feed = TickingFeed;

    fn create_feed(
        &mut self,
        _driver: &D,
        address: &str,
        spec: FeedSpec,
        tx: FeedSender,
    ) -> Self::Feed {
        debug!("TickingFeeds::create_feed: {} on {}", spec.kind, address);

        let this = self.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.interval);

            for i in 0.. {
                ticker.tick().await;
                tx.data(this.sample(spec.kind, i));
            }
        });

        TickingFeed { handle }
    }
}

/// A feed created by [`TickingFeeds`].
pub struct TickingFeed {
    handle: JoinHandle<()>,
}

impl Feed for TickingFeed {
    fn close(&mut self) {
        self.handle.abort();
    }
}
