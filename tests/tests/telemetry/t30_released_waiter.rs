use std::time::Duration;

use clustermon::errors::Fatal;
use clustermon::errors::SubscriptionError;
use clustermon::testing::bolt;
use clustermon::FeedKind;
use pretty_assertions::assert_eq;

use crate::fixtures::manual_config;
use crate::fixtures::members;
use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// A caller waiting on a member that exits is released instead of waiting
/// forever.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn member_exit_releases_waiter() -> anyhow::Result<()> {
    let cluster = Cluster::with_members(&["a", "b"]);
    let monitor = cluster.start(manual_config()?).await?;

    let m = monitor.clone();
    let h = tokio::spawn(async move { m.next_memory_sample(bolt("a")).await });

    // Let the waiter reach the core.
    tokio::time::sleep(Duration::from_millis(50)).await;

    cluster.source.set_members(members(&["b"]));
    monitor.refresh().await?;

    let res = h.await?;
    assert_eq!(
        Err(SubscriptionError::Released {
            address: bolt("a"),
            kind: FeedKind::Memory,
        }),
        res
    );

    monitor.stop().await?;
    Ok(())
}

/// Stop releases callers waiting on any feed.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn stop_releases_waiter() -> anyhow::Result<()> {
    let cluster = Cluster::with_members(&["a"]);
    let monitor = cluster.start(manual_config()?).await?;

    let m = monitor.clone();
    let h = tokio::spawn(async move { m.ping(bolt("a")).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    monitor.stop().await?;

    let res = h.await?;
    assert!(
        matches!(
            res,
            Err(SubscriptionError::Released { .. }) | Err(SubscriptionError::Fatal(Fatal::Stopped))
        ),
        "got: {:?}",
        res
    );

    Ok(())
}
