use std::io;

use clustermon::errors::QueryError;
use clustermon::metrics::SchedulerState;
use maplit::btreeset;
use pretty_assertions::assert_eq;

use crate::fixtures::config;
use crate::fixtures::members;
use crate::fixtures::timeout;
use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// A failed periodic refresh is counted, leaves the members untouched and
/// does not stop the refresh loop.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn refresh_failure_is_rescheduled() -> anyhow::Result<()> {
    let mut cluster = Cluster::with_members(&["a", "b"]);
    let monitor = cluster.start(config(20)?).await?;

    cluster.next_events(2).await?;

    tracing::info!("--- the query fails repeatedly");
    let refreshes = {
        cluster.source.fail_with(QueryError::new(&io::Error::new(
            io::ErrorKind::TimedOut,
            "query timed out",
        )));

        let m = monitor
            .wait(timeout())
            .refresh_failures_at_least(2, "failed twice")
            .await?;

        assert_eq!(btreeset! {"a".to_string(), "b".to_string()}, m.members.ids().cloned().collect());
        assert_eq!(4, m.subscriptions);
        m.refreshes
    };

    tracing::info!("--- the query recovers with a new membership");
    {
        cluster.source.set_members(members(&["a"]));

        let m = monitor
            .wait(timeout())
            .members(btreeset! {"a".to_string()}, "b exits")
            .await?;
        assert!(m.refreshes > refreshes);

        let ev = cluster.next_event().await?;
        assert_eq!("bolt://b:7687", ev.address);

        monitor.wait(timeout()).state(SchedulerState::Scheduled, "rescheduled").await?;
    }

    monitor.stop().await?;
    Ok(())
}
