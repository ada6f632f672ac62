/// States of the refresh scheduler.
///
/// A periodic refresh cycles through
/// `Fetching -> Reconciling -> Scheduled -> Fetching`. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, Default)]
#[derive(PartialEq, Eq)]
#[derive(derive_more::Display)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum SchedulerState {
    /// No refresh is pending: before initialization, in standalone mode, or
    /// with periodic refresh disabled.
    #[default]
    #[display("Idle")]
    Idle,

    /// A membership fetch is in flight.
    #[display("Fetching")]
    Fetching,

    /// A fetched membership is being applied.
    #[display("Reconciling")]
    Reconciling,

    /// The next refresh is waiting for its timer.
    #[display("Scheduled")]
    Scheduled,

    #[display("Stopped")]
    Stopped,
}

/// Whether the monitored database is a cluster.
#[derive(Debug, Clone, Copy, Default)]
#[derive(PartialEq, Eq)]
#[derive(derive_more::Display)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum Mode {
    #[default]
    #[display("Clustered")]
    Clustered,

    /// The database does not report a cluster overview; it is monitored as a
    /// single member and never refreshed.
    #[display("Standalone")]
    Standalone,
}
