use crate::fixtures::config;
use crate::fixtures::ut_harness;
use crate::fixtures::wait_until;
use crate::fixtures::Cluster;

/// Dropping every handle stops the core and releases its feeds.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn drop_monitor_releases_feeds() -> anyhow::Result<()> {
    let cluster = Cluster::with_members(&["a", "b", "c"]);
    let monitor = cluster.start(config(20)?).await?;

    let other = monitor.clone();
    assert_eq!(6, cluster.feeds.open_feeds());

    tracing::info!("--- drop one clone, the core keeps running");
    {
        drop(other);

        let source = cluster.source.clone();
        wait_until("refreshed after drop", || source.fetches() >= 3).await?;
        assert_eq!(6, cluster.feeds.open_feeds());
    }

    tracing::info!("--- drop the last handle");
    {
        drop(monitor);

        let feeds = cluster.feeds.clone();
        wait_until("all feeds closed", || feeds.open_feeds() == 0).await?;
    }

    tracing::info!("--- no more fetches");
    {
        let n = cluster.source.fetches();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(n, cluster.source.fetches());
    }

    Ok(())
}
