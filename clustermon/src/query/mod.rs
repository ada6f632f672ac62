//! Interfaces to the queries the monitor issues against the cluster.
//!
//! The monitor never talks to a database by itself. The host application
//! provides implementations of [`MembershipQuery`] and
//! [`DriverProvider`](driver::DriverProvider).

use openraft_macros::add_async_trait;

use crate::errors::QueryError;
use crate::membership::MemberDescriptor;

pub mod driver;

/// Reports the members of the cluster, e.g., by calling the cluster overview
/// procedure on any reachable member.
///
/// The monitor clones the query for every fetch and runs the fetch in a
/// separate task, so that a slow query never blocks the monitor.
#[add_async_trait]
pub trait MembershipQuery: Clone + Send + Sync + 'static {
    /// Fetch the current cluster members.
    ///
    /// A non-clustered database does not provide the overview procedure and
    /// should return [`QueryError::Unsupported`]: the monitor then describes
    /// it as a single member.
    async fn fetch_members(
        &mut self,
    ) -> Result<Vec<MemberDescriptor>, QueryError>;
}
