//! Public interface of a running monitor.
//!
//! [`Monitor`] is the handle to the monitor core task. It is cheaply
//! cloneable: every part of the application that needs to query the monitor
//! may hold its own clone.

mod inner;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tracing::info;
use tracing::trace_span;
use tracing::Instrument;
use tracing::Level;

use crate::alert::AlertEvaluator;
use crate::config::Config;
use crate::core::core::Core;
use crate::core::core_state::CoreState;
use crate::core::io::api_message::APIMessage;
use crate::core::RefreshTimer;
use crate::errors::Fatal;
use crate::errors::FatalInitError;
use crate::errors::RefreshError;
use crate::errors::SubscriptionError;
use crate::event::EventSink;
use crate::membership::Address;
use crate::membership::MembershipSet;
use crate::metrics::Metrics;
use crate::metrics::Mode;
use crate::metrics::SchedulerState;
use crate::metrics::Wait;
use crate::monitor::inner::MonitorInner;
use crate::query::driver::DriverProvider;
use crate::query::MembershipQuery;
use crate::subscription::FeedFactory;
use crate::subscription::FeedKind;
use crate::subscription::FeedSample;
use crate::subscription::PingSample;
use crate::subscription::SubscriptionManager;
use crate::telemetry::MemoryStats;
use crate::telemetry::TelemetrySample;
use crate::telemetry::TelemetryStore;

/// The monitor API.
///
/// ### Clone
///
/// This type implements `Clone`, and cloning itself is very cheap and helps to
/// facilitate use with async workflows.
///
/// ### Shutting down
///
/// If any of the interfaces returns a [`Fatal`], the monitor core has quit.
/// Call [`Monitor::stop`] to release every feed and quit. Dropping every
/// clone of the handle stops the monitor too.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

impl Monitor {
    /// Establish the initial membership and spawn the monitor core.
    ///
    /// ### `config`
    /// See the docs on [`Config`] for details.
    ///
    /// ### `query`
    /// Reports the cluster members. If it returns
    /// [`QueryError::Unsupported`](crate::errors::QueryError::Unsupported),
    /// the database is monitored as a single member at
    /// [`Config::local_address`].
    ///
    /// ### `drivers`, `feeds`
    /// Connect to every member and poll it.
    ///
    /// ### `sink`
    /// Receives every topology and memory event.
    ///
    /// If the initial membership can not be established nothing is spawned
    /// and a [`FatalInitError`] is returned.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn new<Q, P, F, S>(
        config: Arc<Config>,
        query: Q,
        drivers: P,
        feeds: F,
        sink: S,
    ) -> Result<Self, FatalInitError>
    where
        Q: MembershipQuery,
        P: DriverProvider,
        F: FeedFactory<P::Driver>,
        S: EventSink,
    {
        let (tx_api, rx_api) = mpsc::unbounded_channel();
        let (tx_notify, rx_notify) = mpsc::unbounded_channel();
        let (tx_metrics, rx_metrics) =
            watch::channel(Metrics::new_initial(&config.name));

        let core_span = tracing::span!(
            parent: tracing::Span::current(),
            Level::DEBUG,
            "Core",
            name = display(&config.name),
        );

        let mut core: Core<Q, P, F> = Core {
            config: config.clone(),
            mode: Mode::Clustered,
            state: SchedulerState::Idle,

            query,
            drivers,
            feeds,
            sink: Arc::new(sink),
            evaluator: AlertEvaluator::new(config.heap_thresholds()),

            members: MembershipSet::new(),
            telemetry: TelemetryStore::new(),
            subscriptions: SubscriptionManager::new(),
            attached: BTreeMap::new(),
            setups: BTreeMap::new(),

            timer: RefreshTimer::new(),
            fetch: None,
            fetch_seq: 0,

            refreshes: 0,
            refresh_failures: 0,
            last_refresh: None,

            rx_api,

            tx_notification: tx_notify,
            rx_notification: rx_notify,

            tx_metrics,

            span: core_span,
        };

        let span = core.span.clone();
        core.initialize().instrument(span).await?;

        let core_handle = tokio::spawn(
            core.main().instrument(trace_span!("spawn").or_current()),
        );

        let inner = MonitorInner {
            config,
            tx_api,
            rx_metrics,
            core_state: Mutex::new(CoreState::Running(core_handle)),
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Return the config of this monitor.
    pub fn config(&self) -> &Arc<Config> {
        &self.inner.config
    }

    /// Refresh the membership now and wait for it to be applied.
    ///
    /// If a refresh is already in flight, this call waits for that one. The
    /// periodic schedule restarts after the refresh.
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        let (tx, rx) = oneshot::channel();
        self.inner.call_core(APIMessage::Refresh { tx }, rx).await?
    }

    /// Wait for the next ping of the member on `address`.
    pub async fn ping(
        &self,
        address: impl ToString,
    ) -> Result<PingSample, SubscriptionError> {
        match self.next_sample(address.to_string(), FeedKind::Ping).await? {
            FeedSample::Ping(p) => Ok(p),
            other => unreachable!("ping feed delivered: {}", other),
        }
    }

    /// Wait for the next memory sample of the member on `address`.
    pub async fn next_memory_sample(
        &self,
        address: impl ToString,
    ) -> Result<MemoryStats, SubscriptionError> {
        match self.next_sample(address.to_string(), FeedKind::Memory).await? {
            FeedSample::Memory(m) => Ok(m),
            other => unreachable!("memory feed delivered: {}", other),
        }
    }

    async fn next_sample(
        &self,
        address: Address,
        kind: FeedKind,
    ) -> Result<FeedSample, SubscriptionError> {
        let (tx, rx) = oneshot::channel();
        let msg = APIMessage::Watch { address, kind, tx };
        self.inner.call_core(msg, rx).await?
    }

    /// Get a handle to the metrics channel.
    pub fn metrics(&self) -> watch::Receiver<Metrics> {
        self.inner.rx_metrics.clone()
    }

    /// A copy of the monitored members.
    pub fn members(&self) -> MembershipSet {
        self.inner.rx_metrics.borrow().members.clone()
    }

    /// A copy of the latest heap sample of every member.
    pub fn stats(&self) -> BTreeMap<Address, TelemetrySample> {
        self.inner.rx_metrics.borrow().telemetry.clone()
    }

    /// Get a handle to wait for the metrics to satisfy some condition.
    ///
    /// If `timeout` is `None`, then it will wait forever(10 years).
    /// If `timeout` is `Some`, then it will wait for the specified duration.
    ///
    /// ```ignore
    /// # use std::time::Duration;
    /// # use clustermon::metrics::SchedulerState;
    ///
    /// let timeout = Duration::from_millis(200);
    ///
    /// // wait for the second refresh to complete:
    /// monitor.wait(Some(timeout)).refreshes_at_least(2, "refreshed").await?;
    ///
    /// // wait for the refresh to be scheduled:
    /// monitor.wait(None).state(SchedulerState::Scheduled, "scheduled").await?;
    /// ```
    pub fn wait(&self, timeout: Option<Duration>) -> Wait {
        let timeout = match timeout {
            Some(t) => t,
            None => Duration::from_secs(86400 * 365 * 100),
        };
        Wait {
            timeout,
            rx: self.inner.rx_metrics.clone(),
        }
    }

    /// Stop the monitor: cancel the pending refresh, discard any in-flight
    /// fetch and release every subscription.
    ///
    /// Calling it on a stopped monitor is a no-op. It returns the error the
    /// core failed with, if it did not quit normally.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn stop(&self) -> Result<(), Fatal> {
        let (tx, rx) = oneshot::channel();

        let res = self.inner.call_core(APIMessage::Stop { tx }, rx).await;

        match res {
            Ok(()) | Err(Fatal::Stopped) => {}
            Err(fatal) => return Err(fatal),
        }

        self.inner.join_core_task().await;

        info!("monitor {} stopped", self.inner.config.name);
        Ok(())
    }
}
