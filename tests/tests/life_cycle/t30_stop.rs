use clustermon::errors::Fatal;
use clustermon::errors::RefreshError;
use clustermon::errors::SubscriptionError;
use clustermon::metrics::SchedulerState;
use clustermon::testing::bolt;
use clustermon::FeedKind;
use pretty_assertions::assert_eq;

use crate::fixtures::config;
use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// Stop releases every feed exactly once, and a second stop is a no-op.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn stop_releases_feeds_once() -> anyhow::Result<()> {
    let cluster = Cluster::with_members(&["a", "b"]);
    let monitor = cluster.start(config(60_000)?).await?;

    assert_eq!(4, cluster.feeds.open_feeds());

    tracing::info!("--- stop");
    {
        monitor.stop().await?;

        assert_eq!(0, cluster.feeds.open_feeds());
        for id in ["a", "b"] {
            for kind in FeedKind::all() {
                assert_eq!(1, cluster.feeds.closed(&bolt(id), kind));
            }
        }

        let m = monitor.metrics().borrow().clone();
        assert_eq!(SchedulerState::Stopped, m.state);
        assert_eq!(Err(Fatal::Stopped), m.running_state);
        assert_eq!(0, m.subscriptions);
    }

    tracing::info!("--- stop again");
    {
        monitor.stop().await?;

        for id in ["a", "b"] {
            for kind in FeedKind::all() {
                assert_eq!(1, cluster.feeds.closed(&bolt(id), kind));
            }
        }
    }

    tracing::info!("--- calls after stop report the stopped core");
    {
        let res = monitor.refresh().await;
        assert_eq!(Err(RefreshError::Fatal(Fatal::Stopped)), res);

        let res = monitor.ping(bolt("a")).await;
        assert_eq!(Err(SubscriptionError::Fatal(Fatal::Stopped)), res);
    }

    Ok(())
}
