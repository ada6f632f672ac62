use std::time::Duration;

use clustermon::query::driver::Components;
use clustermon::subscription::PingSample;
use clustermon::testing::bolt;
use clustermon::FeedSample;
use pretty_assertions::assert_eq;

use crate::fixtures::manual_config;
use crate::fixtures::timeout;
use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// The components of a member are queried once its first ping arrives.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn components_after_first_ping() -> anyhow::Result<()> {
    let cluster = Cluster::with_members(&["a"]);

    let components = Components {
        name: "Neo4j Kernel".to_string(),
        versions: vec!["5.12.0".to_string()],
        edition: "community".to_string(),
    };
    cluster.drivers.set_components(Ok(components.clone()));

    let monitor = cluster.start(manual_config()?).await?;

    tracing::info!("--- unknown until the member answers");
    {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let members = monitor.members();
        assert!(members.by_address(&bolt("a")).expect("a").components().is_none());
    }

    tracing::info!("--- the first ping triggers the components query");
    {
        cluster.feeds.push(
            &bolt("a"),
            FeedSample::Ping(PingSample {
                elapsed: Duration::from_millis(2),
            }),
        );

        let m = monitor
            .wait(timeout())
            .metrics(
                |m| m.members.by_address(&bolt("a")).and_then(|x| x.components()).is_some(),
                "a has components",
            )
            .await?;

        let got = m.members.by_address(&bolt("a")).and_then(|x| x.components()).cloned();
        assert_eq!(Some(components), got);
    }

    monitor.stop().await?;
    Ok(())
}
