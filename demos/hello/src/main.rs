mod logging;

use std::sync::Arc;
use std::time::Duration;

use clustermon::impls::ChannelSink;
use clustermon::metrics::SchedulerState;
use clustermon::testing::descriptor;
use clustermon::Config;
use clustermon::Monitor;
use clustermon::Role;
use memsource::MemDrivers;
use memsource::MemSource;
use pseudofeed::TickingFeeds;

use crate::logging::init_logging;

/// Monitor an imaginary three member cluster whose heap fills up, then
/// replace one member and print every event as a JSON line.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_logging("hello", "_log", "DEBUG")?;

    let args = ["hello", "--refresh-interval", "200"];
    let config = Arc::new(Config::build(&args)?);

    let source = MemSource::new(vec![
        descriptor("core-1").with_database("neo4j", Role::Leader),
        descriptor("core-2").with_database("neo4j", Role::Follower),
        descriptor("core-3").with_database("neo4j", Role::Follower),
    ]);

    // Every member reports a 1 GB heap that fills up tick by tick.
    let feeds = TickingFeeds::new(Duration::from_millis(100))
        .with_heap(1_000_000_000, vec![0.5, 0.8, 0.92, 0.99]);

    let (sink, mut events) = ChannelSink::new();

    let monitor = Monitor::new(
        config,
        source.clone(),
        MemDrivers::default(),
        feeds,
        sink,
    )
    .await?;

    let printer = tokio::spawn(async move {
        while let Some(ev) = events.recv().await {
            match serde_json::to_string(&ev) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("can not serialize event {}: {}", ev, e),
            }
        }
    });

    let ping = monitor.ping("bolt://core-1:7687").await?;
    println!("core-1 answered a ping in {:?}", ping.elapsed);

    tokio::time::sleep(Duration::from_millis(500)).await;

    println!("core-3 is replaced by read-replica-1");
    source.set_members(vec![
        descriptor("core-1").with_database("neo4j", Role::Leader),
        descriptor("core-2").with_database("neo4j", Role::Follower),
        descriptor("read-replica-1").with_database("neo4j", Role::ReadReplica),
    ]);

    let m = monitor
        .wait(Some(Duration::from_secs(5)))
        .metrics(
            |m| m.members.contains("read-replica-1") && m.state == SchedulerState::Scheduled,
            "read-replica-1 joined",
        )
        .await?;
    println!("members: {}", m.members);

    for (address, sample) in monitor.stats() {
        println!("{}: {}", address, sample);
    }

    monitor.stop().await?;
    printer.await?;

    Ok(())
}
