use std::time::Duration;

use clustermon::metrics::Mode;
use clustermon::metrics::SchedulerState;
use clustermon::testing::bolt;
use clustermon::EventKind;
use clustermon::FeedKind;
use maplit::btreeset;
use pretty_assertions::assert_eq;

use crate::fixtures::config;
use crate::fixtures::timeout;
use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// Initialization fetches the membership once, sets up every member and
/// schedules the next refresh.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn initialize_clustered() -> anyhow::Result<()> {
    let mut cluster = Cluster::with_members(&["a", "b"]);

    let monitor = cluster.start(config(60_000)?).await?;

    tracing::info!("--- all members are monitored after start");
    {
        let m = monitor.metrics().borrow().clone();
        assert_eq!(Ok(()), m.running_state);
        assert_eq!(Mode::Clustered, m.mode);
        assert_eq!(SchedulerState::Scheduled, m.state);
        assert_eq!(1, m.refreshes);
        assert_eq!(0, m.refresh_failures);
        assert!(m.last_refresh.is_some());

        let ids = m.members.ids().cloned().collect::<Vec<_>>();
        assert_eq!(vec!["a".to_string(), "b".to_string()], ids);

        assert_eq!(4, m.subscriptions);
    }

    tracing::info!("--- one enter event per member, in reported order");
    {
        let evs = cluster.next_events(2).await?;
        assert_eq!(EventKind::Enter, evs[0].kind);
        assert_eq!(bolt("a"), evs[0].address);
        assert_eq!(EventKind::Enter, evs[1].kind);
        assert_eq!(bolt("b"), evs[1].address);
    }

    tracing::info!("--- a driver and both feeds per member");
    {
        assert_eq!(vec![bolt("a"), bolt("b")], cluster.drivers.attached());

        for id in ["a", "b"] {
            for kind in FeedKind::all() {
                assert_eq!(1, cluster.feeds.created(&bolt(id), kind));
                assert!(cluster.feeds.is_open(&bolt(id), kind));
            }
        }
        assert_eq!(1, cluster.source.fetches());
    }

    tracing::info!("--- no refresh happens before the interval elapses");
    {
        cluster.no_event_within(Duration::from_millis(100)).await?;
        assert_eq!(1, cluster.source.fetches());
    }

    monitor
        .wait(timeout())
        .members(btreeset! {"a".to_string(), "b".to_string()}, "still a, b")
        .await?;

    monitor.stop().await?;
    Ok(())
}
