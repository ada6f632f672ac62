use std::time::Duration;

use clustermon::event::EventPayload;
use clustermon::testing::bolt;
use clustermon::EventKind;
use clustermon::FeedKind;
use maplit::btreeset;
use pretty_assertions::assert_eq;

use crate::fixtures::config;
use crate::fixtures::members;
use crate::fixtures::timeout;
use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// A periodic refresh reconciles `{a, b}` into `{b, c}`: `a` exits and is torn
/// down, `c` enters and is set up, `b` is left alone.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn periodic_refresh_reconciles() -> anyhow::Result<()> {
    let mut cluster = Cluster::with_members(&["a", "b"]);
    let monitor = cluster.start(config(20)?).await?;

    cluster.next_events(2).await?;

    tracing::info!("--- unchanged membership emits nothing");
    {
        monitor.wait(timeout()).refreshes_at_least(3, "refreshed twice").await?;
        cluster.no_event_within(Duration::from_millis(50)).await?;
    }

    tracing::info!("--- the cluster changes to b, c");
    {
        cluster.source.set_members(members(&["b", "c"]));

        monitor
            .wait(timeout())
            .members(btreeset! {"b".to_string(), "c".to_string()}, "b, c")
            .await?;

        let evs = cluster.next_events(2).await?;

        assert_eq!(EventKind::Exit, evs[0].kind);
        assert_eq!(bolt("a"), evs[0].address);
        assert!(matches!(&evs[0].payload, EventPayload::Member { address, .. } if address == &bolt("a")));

        assert_eq!(EventKind::Enter, evs[1].kind);
        assert_eq!(bolt("c"), evs[1].address);

        cluster.no_event_within(Duration::from_millis(50)).await?;
    }

    tracing::info!("--- a is torn down, c is set up, b keeps its feeds");
    {
        for kind in FeedKind::all() {
            assert_eq!(1, cluster.feeds.closed(&bolt("a"), kind));
            assert!(!cluster.feeds.is_open(&bolt("a"), kind));

            assert_eq!(1, cluster.feeds.created(&bolt("b"), kind));
            assert_eq!(0, cluster.feeds.closed(&bolt("b"), kind));

            assert_eq!(1, cluster.feeds.created(&bolt("c"), kind));
            assert!(cluster.feeds.is_open(&bolt("c"), kind));
        }

        assert_eq!(vec![bolt("a"), bolt("b"), bolt("c")], cluster.drivers.attached());
    }

    monitor.stop().await?;
    Ok(())
}
