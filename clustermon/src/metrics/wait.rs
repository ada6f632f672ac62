use std::collections::BTreeSet;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::membership::Liveness;
use crate::membership::MemberId;
use crate::metrics::Metric;
use crate::metrics::Metrics;
use crate::metrics::SchedulerState;

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("timeout after {0:?} when {1}")]
    Timeout(Duration, String),

    #[error("monitor is shutting down")]
    ShuttingDown,
}

/// Wait is a wrapper of the [`Metrics`] channel that impls several utils to
/// wait for metrics to satisfy some condition.
pub struct Wait {
    pub timeout: Duration,
    pub rx: watch::Receiver<Metrics>,
}

impl Wait {
    /// Wait for metrics to satisfy some condition or timeout.
    #[tracing::instrument(level = "trace", skip(self, func), fields(msg=%msg.to_string()))]
    pub async fn metrics<T>(
        &self,
        func: T,
        msg: impl ToString,
    ) -> Result<Metrics, WaitError>
    where
        T: Fn(&Metrics) -> bool + Send,
    {
        let timeout_at = Instant::now() + self.timeout;

        let mut rx = self.rx.clone();
        loop {
            let latest = rx.borrow_and_update().clone();

            tracing::debug!(
                "name={} wait {} latest: {}",
                latest.name,
                msg.to_string(),
                latest
            );

            if func(&latest) {
                tracing::debug!(
                    "name={} done wait {} latest: {}",
                    latest.name,
                    msg.to_string(),
                    latest
                );
                return Ok(latest);
            }

            let now = Instant::now();
            if now >= timeout_at {
                return Err(WaitError::Timeout(
                    self.timeout,
                    format!("{} latest: {}", msg.to_string(), latest),
                ));
            }

            let delay = tokio::time::sleep_until(timeout_at);

            futures::select_biased! {
                _ = delay.fuse() => {
                    return Err(WaitError::Timeout(
                        self.timeout,
                        format!("{} latest: {}", msg.to_string(), latest),
                    ));
                }
                changed = rx.changed().fuse() => {
                    if let Err(err) = changed {
                        tracing::debug!(
                            "name={} error: {:?}; wait {} latest: {}",
                            latest.name,
                            err,
                            msg.to_string(),
                            latest
                        );

                        return Err(WaitError::ShuttingDown);
                    }
                }
            };
        }
    }

    /// Wait for the scheduler to enter `want_state` or timeout.
    #[tracing::instrument(level = "trace", skip(self), fields(msg=msg.to_string().as_str()))]
    pub async fn state(
        &self,
        want_state: SchedulerState,
        msg: impl ToString,
    ) -> Result<Metrics, WaitError> {
        self.metrics(
            |m| m.state == want_state,
            format!("{} .state == {}", msg.to_string(), want_state),
        )
        .await
    }

    /// Wait for the monitored member ids to become exactly `want` or timeout.
    #[tracing::instrument(level = "trace", skip(self), fields(msg=msg.to_string().as_str()))]
    pub async fn members(
        &self,
        want: BTreeSet<MemberId>,
        msg: impl ToString,
    ) -> Result<Metrics, WaitError> {
        self.metrics(
            |m| m.members.ids().cloned().collect::<BTreeSet<_>>() == want,
            format!("{} .members == {:?}", msg.to_string(), want),
        )
        .await
    }

    /// Wait for the member on `address` to reach `want` liveness or timeout.
    #[tracing::instrument(level = "trace", skip(self), fields(msg=msg.to_string().as_str()))]
    pub async fn liveness(
        &self,
        address: &str,
        want: Liveness,
        msg: impl ToString,
    ) -> Result<Metrics, WaitError> {
        self.metrics(
            |m| {
                m.members.by_address(address).map(|x| x.liveness())
                    == Some(want)
            },
            format!("{} .liveness({}) == {:?}", msg.to_string(), address, want),
        )
        .await
    }

    /// Wait for at least `n` completed refreshes or timeout.
    pub async fn refreshes_at_least(
        &self,
        n: u64,
        msg: impl ToString,
    ) -> Result<Metrics, WaitError> {
        self.ge(Metric::Refreshes(n), msg).await
    }

    /// Wait for at least `n` failed refreshes or timeout.
    pub async fn refresh_failures_at_least(
        &self,
        n: u64,
        msg: impl ToString,
    ) -> Result<Metrics, WaitError> {
        self.ge(Metric::RefreshFailures(n), msg).await
    }

    /// Block until a metric becomes greater than or equal the specified value
    /// or timeout.
    ///
    /// For example, to await until 3 members are monitored:
    /// ```ignore
    /// monitor.wait(None).ge(Metric::Members(3), "3 members").await?;
    /// ```
    pub async fn ge(
        &self,
        metric: Metric,
        msg: impl ToString,
    ) -> Result<Metrics, WaitError> {
        self.metrics(
            |m| m >= &metric,
            format!("{} .{} >= {}", msg.to_string(), metric.name(), metric),
        )
        .await
    }

    /// Block until a metric becomes equal to the specified value or timeout.
    pub async fn eq(
        &self,
        metric: Metric,
        msg: impl ToString,
    ) -> Result<Metrics, WaitError> {
        self.metrics(
            |m| m == &metric,
            format!("{} .{} == {}", msg.to_string(), metric.name(), metric),
        )
        .await
    }
}
