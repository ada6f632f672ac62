use std::collections::BTreeMap;

use tokio::sync::oneshot;
use tracing::debug;
use tracing::info;

use crate::errors::SubscriptionError;
use crate::membership::Address;
use crate::subscription::Feed;
use crate::subscription::FeedKind;
use crate::subscription::FeedSample;
use crate::subscription::SubscriptionId;

/// A caller awaiting the next outcome of a feed.
pub(crate) type Waiter = oneshot::Sender<Result<FeedSample, SubscriptionError>>;

struct Subscription<F> {
    id: SubscriptionId,
    feed: F,

    /// Callers waiting for the next sample. Every one of them is resolved
    /// exactly once, by data, by error or by release.
    waiters: Vec<Waiter>,
}

/// Owns at most one feed per `(address, kind)`.
pub(crate) struct SubscriptionManager<F>
where F: Feed
{
    /// The id assigned to the next created subscription.
    next_id: SubscriptionId,

    subscriptions: BTreeMap<(Address, FeedKind), Subscription<F>>,
}

impl<F> Default for SubscriptionManager<F>
where F: Feed
{
    fn default() -> Self {
        Self {
            next_id: 1,
            subscriptions: BTreeMap::new(),
        }
    }
}

impl<F> SubscriptionManager<F>
where F: Feed
{
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub(crate) fn contains(&self, address: &str, kind: FeedKind) -> bool {
        self.current_id(address, kind).is_some()
    }

    pub(crate) fn current_id(
        &self,
        address: &str,
        kind: FeedKind,
    ) -> Option<SubscriptionId> {
        self.subscriptions.get(&(address.to_string(), kind)).map(|s| s.id)
    }

    /// Whether `id` is the live subscription of `(address, kind)`.
    ///
    /// Data from a feed that was released, possibly replaced by a newer one,
    /// is not current.
    pub(crate) fn is_current(
        &self,
        address: &str,
        kind: FeedKind,
        id: SubscriptionId,
    ) -> bool {
        self.current_id(address, kind) == Some(id)
    }

    /// Return the id of the subscription for `(address, kind)`, creating it
    /// with `create` if there is none.
    pub(crate) fn ensure(
        &mut self,
        address: &str,
        kind: FeedKind,
        create: impl FnOnce(SubscriptionId) -> F,
    ) -> SubscriptionId {
        let key = (address.to_string(), kind);

        if let Some(s) = self.subscriptions.get(&key) {
            return s.id;
        }

        let id = self.next_id;
        self.next_id += 1;

        debug!("{}: create {} feed on {}, id={}", func_name!(), kind, address, id);

        let feed = create(id);
        self.subscriptions.insert(key, Subscription {
            id,
            feed,
            waiters: vec![],
        });

        id
    }

    /// Register a caller for the next outcome of `(address, kind)`.
    ///
    /// The waiter is given back if there is no such subscription.
    pub(crate) fn add_waiter(
        &mut self,
        address: &str,
        kind: FeedKind,
        waiter: Waiter,
    ) -> Result<(), Waiter> {
        match self.subscriptions.get_mut(&(address.to_string(), kind)) {
            Some(s) => {
                s.waiters.push(waiter);
                Ok(())
            }
            None => Err(waiter),
        }
    }

    /// Deliver an outcome to every waiter of `(address, kind)`.
    ///
    /// Returns the number of waiters resolved.
    pub(crate) fn resolve(
        &mut self,
        address: &str,
        kind: FeedKind,
        res: Result<FeedSample, SubscriptionError>,
    ) -> usize {
        let Some(s) = self.subscriptions.get_mut(&(address.to_string(), kind))
        else {
            return 0;
        };

        let waiters = std::mem::take(&mut s.waiters);
        let n = waiters.len();

        for w in waiters {
            // The caller may have given up waiting.
            let _ = w.send(res.clone());
        }

        n
    }

    /// Close every feed of `address`.
    ///
    /// Pending waiters receive [`SubscriptionError::Released`]. Returns the
    /// number of feeds closed.
    pub(crate) fn release(&mut self, address: &str) -> usize {
        let mut n = 0;

        for kind in FeedKind::all() {
            let Some(s) = self.subscriptions.remove(&(address.to_string(), kind))
            else {
                continue;
            };

            Self::close(address, kind, s);
            n += 1;
        }

        n
    }

    /// Close all feeds. Returns the number of feeds closed.
    pub(crate) fn release_all(&mut self) -> usize {
        let subscriptions = std::mem::take(&mut self.subscriptions);
        let n = subscriptions.len();

        for ((address, kind), s) in subscriptions {
            Self::close(&address, kind, s);
        }

        if n > 0 {
            info!("{}: released {} subscriptions", func_name!(), n);
        }

        n
    }

    fn close(address: &str, kind: FeedKind, mut s: Subscription<F>) {
        debug!("close {} feed on {}, id={}", kind, address, s.id);

        s.feed.close();

        for w in s.waiters {
            let _ = w.send(Err(SubscriptionError::Released {
                address: address.to_string(),
                kind,
            }));
        }
    }
}
