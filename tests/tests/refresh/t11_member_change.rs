use clustermon::event::EventPayload;
use clustermon::testing::bolt;
use clustermon::testing::descriptor;
use clustermon::EventKind;
use clustermon::FeedKind;
use clustermon::MemberDescriptor;
use clustermon::Role;
use pretty_assertions::assert_eq;

use crate::fixtures::manual_config;
use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// A change of database roles emits a change event carrying the new roles
/// and keeps the member's feeds.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn database_role_change() -> anyhow::Result<()> {
    let mut cluster = Cluster::with_members(&["a"]);
    let monitor = cluster.start(manual_config()?).await?;

    cluster.next_event().await?;

    tracing::info!("--- a becomes the leader of `neo4j`");
    {
        cluster.source.set_members(vec![descriptor("a").with_database("neo4j", Role::Leader)]);
        monitor.refresh().await?;

        let ev = cluster.next_event().await?;
        assert_eq!(EventKind::Change, ev.kind);
        assert_eq!(bolt("a"), ev.address);

        let EventPayload::Member { databases, .. } = &ev.payload else {
            panic!("unexpected payload: {:?}", ev.payload);
        };
        assert_eq!(Some(&Role::Leader), databases.get("neo4j"));

        assert_eq!(1, cluster.feeds.created(&bolt("a"), FeedKind::Ping));
        assert_eq!(0, cluster.feeds.closed(&bolt("a"), FeedKind::Ping));
    }

    monitor.stop().await?;
    Ok(())
}

/// A member that moved to another bolt address is torn down on the old
/// address and set up on the new one.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn bolt_address_move() -> anyhow::Result<()> {
    let mut cluster = Cluster::with_members(&["a"]);
    let monitor = cluster.start(manual_config()?).await?;

    cluster.next_event().await?;

    let moved = "bolt://a2:7687";

    tracing::info!("--- a moves to a new address");
    {
        cluster.source.set_members(vec![MemberDescriptor::new("a", [moved], Role::Follower)]);
        monitor.refresh().await?;

        let ev = cluster.next_event().await?;
        assert_eq!(EventKind::Change, ev.kind);
        assert_eq!(moved, ev.address);

        for kind in FeedKind::all() {
            assert_eq!(1, cluster.feeds.closed(&bolt("a"), kind));
            assert!(cluster.feeds.is_open(moved, kind));
        }

        let members = monitor.members();
        assert_eq!(1, members.len());
        assert!(members.by_address(moved).is_some());
        assert!(members.by_address(&bolt("a")).is_none());
    }

    monitor.stop().await?;
    Ok(())
}
