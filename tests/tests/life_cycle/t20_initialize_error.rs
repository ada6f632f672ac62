use std::io;

use clustermon::errors::FatalInitError;
use clustermon::errors::QueryError;
use memsource::MemSource;
use pretty_assertions::assert_eq;

use crate::fixtures::config;
use crate::fixtures::ut_harness;
use crate::fixtures::Cluster;

/// A failing initial fetch is returned to the caller and nothing is set up.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn initialize_query_error() -> anyhow::Result<()> {
    let cluster = Cluster::with_members(&["a"]);

    let err = QueryError::new(&io::Error::new(
        io::ErrorKind::ConnectionRefused,
        "connection refused",
    ));
    cluster.source.fail_with(err.clone());

    let res = cluster.start(config(20)?).await;

    assert_eq!(Err(FatalInitError::Query(err)), res.map(|_| ()));
    assert_eq!(0, cluster.feeds.open_feeds());
    assert!(cluster.drivers.attached().is_empty());

    Ok(())
}

/// An empty initial membership is fatal.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn initialize_no_members() -> anyhow::Result<()> {
    let cluster = Cluster::new(MemSource::new(vec![]));

    let res = cluster.start(config(20)?).await;

    assert_eq!(Err(FatalInitError::NoMembers), res.map(|_| ()));
    assert_eq!(1, cluster.source.fetches());
    assert_eq!(0, cluster.feeds.open_feeds());

    Ok(())
}
