use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::mem::take;
use std::sync::Arc;

use anyerror::AnyError;
use chrono::DateTime;
use chrono::Utc;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing::Instrument;
use tracing::Level;
use tracing::Span;

use crate::alert::AlertEvaluator;
use crate::config::Config;
use crate::core::io::api_message::APIMessage;
use crate::core::io::notification::Notification;
use crate::core::RefreshTimer;
use crate::errors::Fatal;
use crate::errors::FatalInitError;
use crate::errors::Infallible;
use crate::errors::QueryError;
use crate::errors::RefreshError;
use crate::errors::SubscriptionError;
use crate::event::Event;
use crate::event::EventSink;
use crate::membership::Address;
use crate::membership::MemberDescriptor;
use crate::membership::MembershipSet;
use crate::metrics::Metrics;
use crate::metrics::Mode;
use crate::metrics::SchedulerState;
use crate::query::driver::Components;
use crate::query::driver::Driver;
use crate::query::driver::DriverProvider;
use crate::query::MembershipQuery;
use crate::reconcile::reconcile;
use crate::subscription::FeedFactory;
use crate::subscription::FeedKind;
use crate::subscription::FeedSample;
use crate::subscription::FeedSender;
use crate::subscription::FeedSpec;
use crate::subscription::SubscriptionId;
use crate::subscription::SubscriptionManager;
use crate::subscription::Waiter;
use crate::telemetry::TelemetryStore;

/// A membership fetch running in a spawned task.
pub(crate) struct InFlightFetch {
    /// Identifies this fetch among all fetches of this core.
    pub(crate) seq: u64,

    pub(crate) handle: JoinHandle<()>,

    /// On-demand refresh callers waiting for this fetch to be applied.
    pub(crate) waiters: Vec<oneshot::Sender<Result<(), RefreshError>>>,
}

/// The single task owning the monitored members, their telemetry and their
/// feeds.
pub(crate) struct Core<Q, P, F>
where
    Q: MembershipQuery,
    P: DriverProvider,
    F: FeedFactory<P::Driver>,
{
    pub(crate) config: Arc<Config>,

    pub(crate) mode: Mode,

    pub(crate) state: SchedulerState,

    /// The [`MembershipQuery`] implementation.
    pub(crate) query: Q,

    /// The [`DriverProvider`] implementation.
    pub(crate) drivers: P,

    /// The [`FeedFactory`] implementation.
    pub(crate) feeds: F,

    pub(crate) sink: Arc<dyn EventSink>,

    pub(crate) evaluator: AlertEvaluator,

    pub(crate) members: MembershipSet,

    pub(crate) telemetry: TelemetryStore,

    pub(crate) subscriptions: SubscriptionManager<F::Feed>,

    /// Drivers of the members, keyed by bolt address.
    pub(crate) attached: BTreeMap<Address, P::Driver>,

    /// Tasks waiting for the first ping of an entering member.
    pub(crate) setups: BTreeMap<Address, JoinHandle<()>>,

    pub(crate) timer: RefreshTimer,

    pub(crate) fetch: Option<InFlightFetch>,

    /// The seq of the last started fetch.
    pub(crate) fetch_seq: u64,

    pub(crate) refreshes: u64,
    pub(crate) refresh_failures: u64,
    pub(crate) last_refresh: Option<DateTime<Utc>>,

    pub(crate) rx_api: mpsc::UnboundedReceiver<APIMessage>,

    /// A Sender handed out, as a weak reference, to the tasks spawned by
    /// [`Core`] so that they report back when done.
    pub(crate) tx_notification: mpsc::UnboundedSender<Notification>,

    /// A Receiver to receive callback from spawned tasks.
    pub(crate) rx_notification: mpsc::UnboundedReceiver<Notification>,

    pub(crate) tx_metrics: watch::Sender<Metrics>,

    pub(crate) span: Span,
}

impl<Q, P, F> Core<Q, P, F>
where
    Q: MembershipQuery,
    P: DriverProvider,
    F: FeedFactory<P::Driver>,
{
    /// Establish the initial membership with one awaited fetch.
    ///
    /// A database without the cluster overview procedure is monitored as a
    /// single member at the configured address. Any other failure, or an
    /// empty membership, leaves nothing behind and is returned.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) async fn initialize(&mut self) -> Result<(), FatalInitError> {
        self.state = SchedulerState::Fetching;

        let observed = match self.query.fetch_members().await {
            Ok(observed) => observed,
            Err(QueryError::Unsupported(reason)) => {
                info!(
                    "cluster overview is unsupported: {}; monitor {} as a standalone member",
                    reason, self.config.local_address
                );

                self.mode = Mode::Standalone;
                vec![MemberDescriptor::standalone(&self.config.local_address)]
            }
            Err(e) => {
                error!(error = display(&e), "failed to fetch initial membership");
                return Err(FatalInitError::Query(e));
            }
        };

        if observed.is_empty() {
            error!("initial membership is empty");
            return Err(FatalInitError::NoMembers);
        }

        self.state = SchedulerState::Reconciling;
        self.apply(observed);

        self.refreshes += 1;
        self.last_refresh = Some(Utc::now());

        info!(
            mode = display(self.mode),
            "initialized with members: {}", self.members
        );

        self.schedule_refresh();
        self.report_metrics();

        Ok(())
    }

    /// The main loop of the monitor.
    pub(crate) async fn main(mut self) -> Result<Infallible, Fatal> {
        debug!("Core started");

        self.report_metrics();

        let span = tracing::span!(parent: &self.span, Level::DEBUG, "main");
        let res = self.runtime_loop().instrument(span).await;

        let err = match res {
            Ok(never) => match never {},
            Err(e) => e,
        };

        match err {
            Fatal::Stopped => { /* Normal quit */ }
            _ => {
                error!(error = display(&err), "quit Core::main on error");
            }
        }

        // Release everything if the loop quit without a Stop message.
        self.stop();

        debug!("update the metrics for shutdown");
        {
            let mut curr = self.tx_metrics.borrow().clone();
            curr.running_state = Err(err.clone());

            let _ = self.tx_metrics.send(curr);
        }

        info!("Core shutdown complete");

        Err(err)
    }

    /// Run an event handling loop
    ///
    /// It always returns a [`Fatal`] error upon returning.
    #[tracing::instrument(level = "debug", skip_all, fields(name=display(&self.config.name)))]
    async fn runtime_loop(&mut self) -> Result<Infallible, Fatal> {
        loop {
            debug!("runtime_loop: wait for next event");

            // API messages go first so that `stop()` is never delayed by a
            // busy feed.
            futures::select_biased! {
                msg_res = self.rx_api.recv().fuse() => {
                    match msg_res {
                        Some(msg) => self.handle_api_msg(msg).await?,
                        None => {
                            info!("all rx_api senders are dropped");
                            return Err(Fatal::Stopped);
                        }
                    };
                }

                notify_res = self.rx_notification.recv().fuse() => {
                    match notify_res {
                        Some(notify) => self.handle_notification(notify).await,
                        None => {
                            error!("all rx_notification senders are dropped");
                            return Err(Fatal::Stopped);
                        }
                    };
                }
            }

            self.report_metrics();
        }
    }

    #[tracing::instrument(level = "debug", skip(self, msg))]
    pub(crate) async fn handle_api_msg(
        &mut self,
        msg: APIMessage,
    ) -> Result<(), Fatal> {
        debug!("MONITOR_event input: {}", msg);

        match msg {
            APIMessage::Refresh { tx } => {
                if self.mode == Mode::Standalone {
                    let _ = tx.send(Err(RefreshError::Standalone));
                    return Ok(());
                }

                self.start_fetch(Some(tx));
            }
            APIMessage::Watch { address, kind, tx } => {
                self.watch(&address, kind, tx);
            }
            APIMessage::Stop { tx } => {
                info!("received APIMessage::Stop: {}", func_name!());

                self.stop();
                let _ = tx.send(());
                return Err(Fatal::Stopped);
            }
        };

        Ok(())
    }

    pub(crate) async fn handle_notification(&mut self, notify: Notification) {
        debug!("MONITOR_event notify: {}", notify);

        match notify {
            Notification::RefreshDue { timer_id } => {
                if !self.timer.fire(timer_id) {
                    debug!("stale refresh timer {}, ignore", timer_id);
                    return;
                }

                self.start_fetch(None);
            }

            Notification::Fetched { seq, result } => {
                self.handle_fetched(seq, result);
            }

            Notification::FeedData {
                address,
                kind,
                id,
                sample,
            } => {
                self.handle_feed_data(address, kind, id, sample);
            }

            Notification::FeedError {
                address,
                kind,
                id,
                error,
            } => {
                if !self.subscriptions.is_current(&address, kind, id) {
                    debug!("error from released feed {}, ignore", id);
                    return;
                }

                if let Some(m) = self.members.by_address_mut(&address) {
                    m.mark_offline();
                }

                self.subscriptions.resolve(
                    &address,
                    kind,
                    Err(SubscriptionError::Feed {
                        address: address.clone(),
                        kind,
                        source: error,
                    }),
                );
            }

            Notification::SetupCompleted { address, result } => {
                self.setups.remove(&address);

                match result {
                    Ok(components) => {
                        self.handle_components(&address, components);
                    }
                    Err(e) => {
                        warn!(
                            address = display(&address),
                            error = display(&e),
                            "member setup failed"
                        );
                    }
                }
            }
        };
    }

    /// Start a membership fetch in a separate task.
    ///
    /// If a fetch is already in flight, `waiter` joins it instead.
    fn start_fetch(
        &mut self,
        waiter: Option<oneshot::Sender<Result<(), RefreshError>>>,
    ) {
        if let Some(fetch) = &mut self.fetch {
            debug!("fetch {} is in flight, join it", fetch.seq);
            fetch.waiters.extend(waiter);
            return;
        }

        // A manual refresh replaces the scheduled one.
        self.timer.cancel();

        self.fetch_seq += 1;
        let seq = self.fetch_seq;

        let mut query = self.query.clone();
        let tx = self.tx_notification.downgrade();

        let fu = async move {
            let result = query.fetch_members().await;

            let Some(tx) = tx.upgrade() else {
                debug!("Core quit, drop fetch result {}", seq);
                return;
            };
            let _ = tx.send(Notification::Fetched { seq, result });
        };

        let handle = tokio::spawn(fu.instrument(self.span.clone()));

        self.fetch = Some(InFlightFetch {
            seq,
            handle,
            waiters: waiter.into_iter().collect(),
        });

        self.state = SchedulerState::Fetching;
        debug!("fetch {} started", seq);
    }

    #[tracing::instrument(level = "debug", skip_all, fields(seq=seq))]
    fn handle_fetched(
        &mut self,
        seq: u64,
        result: Result<Vec<MemberDescriptor>, QueryError>,
    ) {
        if self.fetch.as_ref().map(|f| f.seq) != Some(seq) {
            debug!("fetch {} is discarded, ignore its result", seq);
            return;
        }

        let Some(fetch) = self.fetch.take() else {
            return;
        };

        let reply = match result {
            Ok(observed) => {
                self.state = SchedulerState::Reconciling;
                self.apply(observed);

                self.refreshes += 1;
                self.last_refresh = Some(Utc::now());

                Ok(())
            }
            Err(e) => {
                self.refresh_failures += 1;
                error!(
                    error = display(&e),
                    failures = self.refresh_failures,
                    "membership refresh failed"
                );

                Err(RefreshError::Query(e))
            }
        };

        for w in fetch.waiters {
            let _ = w.send(reply.clone());
        }

        self.schedule_refresh();
    }

    /// Schedule the next periodic refresh, or rest in `Idle` if periodic
    /// refresh does not apply.
    fn schedule_refresh(&mut self) {
        if self.mode == Mode::Standalone || !self.config.enable_refresh {
            self.timer.cancel();
            self.state = SchedulerState::Idle;
            return;
        }

        self.timer.schedule(
            self.config.refresh_interval(),
            self.tx_notification.downgrade(),
        );
        self.state = SchedulerState::Scheduled;
    }

    /// Reconcile an observed membership, then tear down, set up and emit
    /// events accordingly.
    fn apply(&mut self, observed: Vec<MemberDescriptor>) {
        let rec = reconcile(&mut self.members, observed);

        if rec.is_empty() {
            debug!("membership unchanged: {}", self.members);
            return;
        }

        info!("membership reconciled: {}; members: {}", rec, self.members);

        // Feeds are keyed by address and shared by every member on it: an
        // address is released only when no remaining member uses it.
        let released = rec
            .exiting
            .iter()
            .chain(rec.moved.iter().map(|(old, _new)| old))
            .cloned()
            .collect::<BTreeSet<_>>();

        for address in released.iter() {
            if let Some(m) = self.members.by_address(address) {
                debug!("{} is still used by member {}, keep it", address, m.id());
                continue;
            }
            self.teardown(address);
        }

        for (_old, new) in rec.moved.iter() {
            self.setup(new);
        }

        for address in rec.entering.iter() {
            self.setup(address);
        }

        // All mutations are visible before any event is delivered.
        self.report_metrics();
        self.emit(rec.events);
    }

    /// Attach a driver and the feeds of a member, then spawn a task waiting
    /// for its first ping.
    fn setup(&mut self, address: &str) {
        if address.is_empty() {
            warn!("member without address can not be monitored");
            return;
        }

        let driver = self.attach(address);

        for kind in FeedKind::all() {
            self.ensure_feed(address, kind, &driver);
        }

        let (tx, rx) = oneshot::channel();
        if self.subscriptions.add_waiter(address, FeedKind::Ping, tx).is_err() {
            return;
        }

        let weak = self.tx_notification.downgrade();
        let addr = address.to_string();
        let mut driver = driver;

        let fu = async move {
            let result = match rx.await {
                Ok(Ok(_ping)) => {
                    driver.components().await.map_err(|e| AnyError::new(&e))
                }
                Ok(Err(e)) => Err(AnyError::new(&e)),
                Err(_) => {
                    debug!("setup of {} is cancelled", addr);
                    return;
                }
            };

            let Some(tx) = weak.upgrade() else {
                return;
            };
            let _ = tx.send(Notification::SetupCompleted {
                address: addr,
                result,
            });
        };

        let handle = tokio::spawn(fu.instrument(self.span.clone()));

        if let Some(prev) = self.setups.insert(address.to_string(), handle) {
            prev.abort();
        }

        debug!("member {} set up", address);
    }

    /// Release the feeds, driver and telemetry of a member.
    fn teardown(&mut self, address: &str) {
        if let Some(h) = self.setups.remove(address) {
            h.abort();
        }

        let n = self.subscriptions.release(address);
        self.attached.remove(address);
        self.telemetry.remove(address);

        debug!("member {} torn down, {} feeds released", address, n);
    }

    /// Return the driver of `address`, creating it if there is none.
    fn attach(&mut self, address: &str) -> P::Driver {
        if let Some(d) = self.attached.get(address) {
            return d.clone();
        }

        let driver = self.drivers.driver_for(address);
        self.attached.insert(address.to_string(), driver.clone());
        driver
    }

    fn ensure_feed(
        &mut self,
        address: &str,
        kind: FeedKind,
        driver: &P::Driver,
    ) -> SubscriptionId {
        let feeds = &mut self.feeds;
        let tx = &self.tx_notification;

        self.subscriptions.ensure(address, kind, |id| {
            let sender = FeedSender::new(address, kind, id, tx.downgrade());
            feeds.create_feed(driver, address, FeedSpec::of(kind), sender)
        })
    }

    /// Register `tx` for the next outcome of the `kind` feed of a member.
    fn watch(&mut self, address: &str, kind: FeedKind, tx: Waiter) {
        // A member without address is never set up: nothing listens on "".
        if address.is_empty() || self.members.by_address(address).is_none() {
            let _ = tx.send(Err(SubscriptionError::UnknownMember {
                address: address.to_string(),
            }));
            return;
        }

        let driver = self.attach(address);
        self.ensure_feed(address, kind, &driver);

        if let Err(tx) = self.subscriptions.add_waiter(address, kind, tx) {
            let _ = tx.send(Err(SubscriptionError::UnknownMember {
                address: address.to_string(),
            }));
        }
    }

    fn handle_feed_data(
        &mut self,
        address: Address,
        kind: FeedKind,
        id: SubscriptionId,
        sample: FeedSample,
    ) {
        if !self.subscriptions.is_current(&address, kind, id) {
            debug!("data from released feed {}, ignore", id);
            return;
        }

        if sample.kind() != kind {
            warn!(
                "{} feed on {} delivered a {} sample, ignore",
                kind,
                address,
                sample.kind()
            );
            return;
        }

        let now = Utc::now();

        if let Some(m) = self.members.by_address_mut(&address) {
            m.mark_online(now);
        }

        let mut events = vec![];

        if let FeedSample::Memory(stats) = &sample {
            let (prev, curr) =
                self.telemetry.update(&address, stats.clone(), now);
            events = self.evaluator.evaluate(&address, prev.as_ref(), &curr);
        }

        self.subscriptions.resolve(&address, kind, Ok(sample));

        if !events.is_empty() {
            self.report_metrics();
            self.emit(events);
        }
    }

    fn handle_components(&mut self, address: &str, components: Components) {
        let Some(m) = self.members.by_address_mut(address) else {
            debug!("member {} is gone, ignore its components", address);
            return;
        };

        info!("member {} runs: {}", address, components);
        m.set_components(components);
    }

    fn emit(&self, events: Vec<Event>) {
        for ev in events {
            debug!("emit event: {}", ev);
            self.sink.add_event(ev);
        }
    }

    /// Cancel the timer, discard the in-flight fetch and release every
    /// subscription.
    ///
    /// It is a no-op once stopped.
    pub(crate) fn stop(&mut self) {
        if self.state == SchedulerState::Stopped {
            return;
        }

        self.timer.cancel();

        if let Some(fetch) = self.fetch.take() {
            info!("discard in-flight fetch {}", fetch.seq);
            fetch.handle.abort();

            for w in fetch.waiters {
                let _ = w.send(Err(RefreshError::Fatal(Fatal::Stopped)));
            }
        }

        for (_addr, h) in take(&mut self.setups) {
            h.abort();
        }

        let n = self.subscriptions.release_all();
        self.attached.clear();

        self.state = SchedulerState::Stopped;
        self.report_metrics();

        info!("monitor stopped, {} subscriptions released", n);
    }

    /// Report a metrics payload on the current state of the monitor.
    pub(crate) fn report_metrics(&mut self) {
        let m = Metrics {
            running_state: Ok(()),
            name: self.config.name.clone(),
            mode: self.mode,
            state: self.state,
            members: self.members.clone(),
            telemetry: self.telemetry.snapshot(),
            subscriptions: self.subscriptions.len(),
            refreshes: self.refreshes,
            refresh_failures: self.refresh_failures,
            last_refresh: self.last_refresh,
        };

        debug!("report_metrics: {}", m);
        let res = self.tx_metrics.send(m);

        if let Err(err) = res {
            error!(error=%err, name=display(&self.config.name), "error reporting metrics");
        }
    }
}
