//! Fixtures for testing a [`Monitor`] with in-memory collaborators.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::sync::Once;
use std::time::Duration;

use anyhow::Context;
use clustermon::errors::FatalInitError;
use clustermon::impls::ChannelSink;
use clustermon::testing::descriptor;
use clustermon::Config;
use clustermon::Event;
use clustermon::MemberDescriptor;
use clustermon::Monitor;
use memsource::MemDrivers;
use memsource::MemSource;
use pseudofeed::PseudoFeeds;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

static INIT_TRACING: Once = Once::new();

/// Install a tracing subscriber writing to the test output, once per
/// process.
///
/// `RUST_LOG` overrides the default `debug` level.
pub fn init_ut_tracing() {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

/// Build a tokio runtime with test tracing and run an async test in it.
pub fn ut_harness<F, Fut>(f: F) -> anyhow::Result<()>
where
    F: FnOnce() -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<()>> + 'static,
{
    init_ut_tracing();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()?;

    let res = rt.block_on(f());
    if let Err(e) = &res {
        tracing::error!("{:?}", e);
    }
    res
}

/// A `Config` refreshing every `refresh_interval` milliseconds.
pub fn config(refresh_interval: u64) -> anyhow::Result<Arc<Config>> {
    let config = Config {
        refresh_interval,
        ..Default::default()
    }
    .validate()?;

    Ok(Arc::new(config))
}

/// A `Config` that refreshes only on demand.
pub fn manual_config() -> anyhow::Result<Arc<Config>> {
    let config = Config {
        enable_refresh: false,
        ..Default::default()
    }
    .validate()?;

    Ok(Arc::new(config))
}

/// Followers `a`, `b`, ... as a cluster overview reports them.
pub fn members(ids: &[&str]) -> Vec<MemberDescriptor> {
    ids.iter().map(|id| descriptor(id)).collect()
}

/// In-memory collaborators of a monitor and the events it emitted.
pub struct Cluster {
    pub source: MemSource,
    pub drivers: MemDrivers,
    pub feeds: PseudoFeeds,

    sink: ChannelSink,
    events: mpsc::UnboundedReceiver<Event>,
}

impl Cluster {
    pub fn new(source: MemSource) -> Self {
        let (sink, events) = ChannelSink::new();

        Self {
            source,
            drivers: MemDrivers::default(),
            feeds: PseudoFeeds::default(),
            sink,
            events,
        }
    }

    /// A cluster initially reporting followers `ids`.
    pub fn with_members(ids: &[&str]) -> Self {
        Self::new(MemSource::new(members(ids)))
    }

    pub async fn start(
        &self,
        config: Arc<Config>,
    ) -> Result<Monitor, FatalInitError> {
        Monitor::new(
            config,
            self.source.clone(),
            self.drivers.clone(),
            self.feeds.clone(),
            self.sink.clone(),
        )
        .await
    }

    /// Wait for the next emitted event.
    pub async fn next_event(&mut self) -> anyhow::Result<Event> {
        let ev = tokio::time::timeout(Duration::from_secs(5), self.events.recv())
            .await
            .context("timeout waiting for event")?
            .context("event channel closed")?;

        tracing::info!("received event: {}", ev);
        Ok(ev)
    }

    /// Wait for the next `n` emitted events.
    pub async fn next_events(&mut self, n: usize) -> anyhow::Result<Vec<Event>> {
        let mut res = vec![];
        for _ in 0..n {
            res.push(self.next_event().await?);
        }
        Ok(res)
    }

    /// Assert that no event is emitted within `wait`.
    pub async fn no_event_within(&mut self, wait: Duration) -> anyhow::Result<()> {
        match tokio::time::timeout(wait, self.events.recv()).await {
            Err(_elapsed) => Ok(()),
            Ok(None) => Ok(()),
            Ok(Some(ev)) => Err(anyhow::anyhow!("unexpected event: {}", ev)),
        }
    }
}

/// Poll `f` every few milliseconds until it returns `true` or 5 seconds
/// elapse.
pub async fn wait_until(
    msg: impl ToString,
    f: impl Fn() -> bool,
) -> anyhow::Result<()> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);

    while !f() {
        if tokio::time::Instant::now() >= deadline {
            return Err(anyhow::anyhow!("timeout waiting for: {}", msg.to_string()));
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    Ok(())
}

/// Default timeout of [`Monitor::wait`].
pub fn timeout() -> Option<Duration> {
    Some(Duration::from_secs(5))
}

/// Call `push` every few milliseconds until the task `h` finishes.
///
/// A caller waiting for the next sample is registered at some point after it
/// is spawned; pushing repeatedly makes sure one sample arrives after that.
pub async fn push_until_finished<T>(
    h: &tokio::task::JoinHandle<T>,
    push: impl Fn(),
) -> anyhow::Result<()> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);

    while !h.is_finished() {
        if tokio::time::Instant::now() >= deadline {
            return Err(anyhow::anyhow!("timeout waiting for the task to finish"));
        }
        push();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    Ok(())
}
