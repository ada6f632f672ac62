use std::time::Duration;

use clustermon::event::EventPayload;
use clustermon::testing::bolt;
use clustermon::EventKind;
use clustermon::FeedSample;
use clustermon::MemoryStats;
use clustermon::Severity;
use pretty_assertions::assert_eq;

use crate::fixtures::manual_config;
use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// Memory samples are evaluated against the heap thresholds and the
/// resulting events reach the sink.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn memory_alerts_reach_sink() -> anyhow::Result<()> {
    let mut cluster = Cluster::with_members(&["a"]);
    let monitor = cluster.start(manual_config()?).await?;

    cluster.next_event().await?;

    let gb = 1_000_000_000;
    let feeds = cluster.feeds.clone();
    let push = move |used: u64, committed: u64| {
        let sample = FeedSample::Memory(MemoryStats::heap(used, committed));
        assert!(feeds.push(&bolt("a"), sample));
    };

    tracing::info!("--- a healthy heap raises nothing");
    {
        push(gb / 2, gb);
        cluster.no_event_within(Duration::from_millis(50)).await?;
    }

    tracing::info!("--- 95% used raises an alert");
    {
        push(gb * 95 / 100, gb);

        let ev = cluster.next_event().await?;
        assert_eq!(EventKind::Memory, ev.kind);
        assert_eq!(Severity::Alert, ev.severity);
        assert_eq!(bolt("a"), ev.address);
        assert_eq!("Heap is >= 95% utilization on bolt://a:7687", ev.message);
        assert!(matches!(ev.payload, EventPayload::Heap(_)));

        cluster.no_event_within(Duration::from_millis(50)).await?;
    }

    tracing::info!("--- 99% used raises an alert and an error");
    {
        push(gb * 99 / 100, gb);

        let evs = cluster.next_events(2).await?;
        assert_eq!(Severity::Alert, evs[0].severity);
        assert_eq!(Severity::Error, evs[1].severity);
    }

    tracing::info!("--- a larger heap raises a heap change");
    {
        push(gb / 2, gb * 2);

        let ev = cluster.next_event().await?;
        assert_eq!(EventKind::Memory, ev.kind);
        assert_eq!(Severity::Info, ev.severity);
        assert_eq!(
            "Heap allocation changed on bolt://a:7687 from 1.0 GB to 2.0 GB",
            ev.message
        );

        let EventPayload::HeapChange { old, new } = &ev.payload else {
            panic!("unexpected payload: {:?}", ev.payload);
        };
        assert_eq!(Some(gb), old.heap_committed());
        assert_eq!(Some(gb * 2), new.heap_committed());

        cluster.no_event_within(Duration::from_millis(50)).await?;
    }

    monitor.stop().await?;
    Ok(())
}
