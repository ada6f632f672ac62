use pretty_assertions::assert_eq;

use crate::fixtures::manual_config;
use crate::fixtures::members;
use crate::fixtures::ut_harness;
use crate::fixtures::wait_until;
use crate::fixtures::Cluster;

/// Refreshes requested while a fetch is in flight join it instead of
/// starting another one.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn concurrent_refreshes_share_one_fetch() -> anyhow::Result<()> {
    let cluster = Cluster::with_members(&["a"]);
    let monitor = cluster.start(manual_config()?).await?;

    cluster.source.hold();
    cluster.source.set_members(members(&["a", "b"]));

    tracing::info!("--- first refresh blocks in the query");
    let first = {
        let m = monitor.clone();
        let h = tokio::spawn(async move { m.refresh().await });

        let source = cluster.source.clone();
        wait_until("fetch starts", || source.fetches() == 2).await?;
        h
    };

    tracing::info!("--- second refresh joins it");
    let second = {
        let m = monitor.clone();
        tokio::spawn(async move { m.refresh().await })
    };

    // Let the second request reach the core before the fetch completes.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    cluster.source.release();

    first.await??;
    second.await??;

    assert_eq!(2, cluster.source.fetches());
    assert_eq!(2, monitor.members().len());

    monitor.stop().await?;
    Ok(())
}
