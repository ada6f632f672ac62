use std::time::Duration;

use clustermon::errors::Fatal;
use clustermon::errors::RefreshError;
use clustermon::testing::bolt;
use clustermon::FeedKind;
use maplit::btreeset;
use pretty_assertions::assert_eq;

use crate::fixtures::manual_config;
use crate::fixtures::members;
use crate::fixtures::ut_harness;
use crate::fixtures::wait_until;
use crate::fixtures::Cluster;

/// A fetch still in flight when the monitor stops is discarded: its result
/// is never applied and its waiters are told the monitor stopped.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn stop_discards_in_flight_fetch() -> anyhow::Result<()> {
    let mut cluster = Cluster::with_members(&["a"]);
    let monitor = cluster.start(manual_config()?).await?;

    cluster.next_event().await?;

    tracing::info!("--- start a refresh that blocks in the query");
    let refresh = {
        cluster.source.hold();
        cluster.source.set_members(members(&["c"]));

        let m = monitor.clone();
        let h = tokio::spawn(async move { m.refresh().await });

        let source = cluster.source.clone();
        wait_until("second fetch starts", || source.fetches() >= 2).await?;
        h
    };

    tracing::info!("--- stop while the fetch is in flight");
    {
        monitor.stop().await?;

        let res = refresh.await?;
        assert_eq!(Err(RefreshError::Fatal(Fatal::Stopped)), res);
    }

    tracing::info!("--- releasing the query changes nothing");
    {
        cluster.source.release();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let ids = monitor.members().ids().cloned().collect();
        assert_eq!(btreeset! {"a".to_string()}, ids);

        assert_eq!(0, cluster.feeds.created(&bolt("c"), FeedKind::Ping));
        assert_eq!(1, cluster.feeds.closed(&bolt("a"), FeedKind::Ping));
        assert_eq!(1, cluster.feeds.closed(&bolt("a"), FeedKind::Memory));

        cluster.no_event_within(Duration::from_millis(50)).await?;
    }

    Ok(())
}
