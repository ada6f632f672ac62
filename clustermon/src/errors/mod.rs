//! Error types exposed by this crate.

use std::error::Error;

use anyerror::AnyError;

use crate::membership::Address;
use crate::subscription::FeedKind;

/// Fatal is unrecoverable: the monitor core has quit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum Fatal {
    #[error("panicked")]
    Panicked,

    /// The monitor stopped normally.
    #[error("Stopped normally")]
    Stopped,
}

/// Error returned by the external query collaborators, i.e.,
/// [`MembershipQuery`](crate::MembershipQuery) and [`Driver`](crate::Driver).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum QueryError {
    /// The server does not provide the requested procedure.
    ///
    /// A single instance database reports this for the cluster overview
    /// procedure. It is an expected condition rather than a failure.
    #[error("operation not supported: {0}")]
    Unsupported(String),

    #[error("QueryError: {0}")]
    Failed(#[from] AnyError),
}

impl QueryError {
    pub fn unsupported(reason: impl ToString) -> Self {
        Self::Unsupported(reason.to_string())
    }

    pub fn new<E: Error + 'static>(e: &E) -> Self {
        Self::Failed(AnyError::new(e))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// The set of errors which may take place when starting a
/// [`Monitor`](crate::Monitor).
///
/// This is the only error kind that reaches the application: no membership
/// has been established and the monitor is not running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum FatalInitError {
    #[error("failed to fetch the initial membership: {0}")]
    Query(QueryError),

    #[error("failed to connect to any valid cluster members")]
    NoMembers,
}

/// Error returned by an on-demand membership refresh.
///
/// Periodic refresh failures are logged and counted in
/// [`Metrics::refresh_failures`](crate::Metrics::refresh_failures); they never
/// stop the refresh loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum RefreshError {
    #[error("refresh failed: {0}")]
    Query(#[from] QueryError),

    /// A standalone database has only one member; there is nothing to
    /// refresh.
    #[error("refresh is disabled in standalone mode")]
    Standalone,

    #[error(transparent)]
    Fatal(#[from] Fatal),
}

/// Error delivered to a caller waiting for the next sample of a feed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum SubscriptionError {
    #[error("{kind} feed on {address} failed: {source}")]
    Feed {
        address: Address,
        kind: FeedKind,
        source: AnyError,
    },

    #[error("no member is known by address {address}")]
    UnknownMember { address: Address },

    /// The subscription was torn down before a sample arrived, e.g., the
    /// member exited the cluster.
    #[error("{kind} subscription on {address} is released")]
    Released { address: Address, kind: FeedKind },

    #[error(transparent)]
    Fatal(#[from] Fatal),
}

/// The core task never returns `Ok`: it returns `Result<Infallible, Fatal>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("infallible")]
pub enum Infallible {}
