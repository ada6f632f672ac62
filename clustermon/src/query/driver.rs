//! Per member connections.

use std::fmt;

use openraft_macros::add_async_trait;

use crate::base::display_ext::DisplaySlice;
use crate::errors::QueryError;

/// Product information reported by a member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Components {
    pub name: String,
    pub versions: Vec<String>,
    pub edition: String,
}

impl fmt::Display for Components {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}({})",
            self.name,
            DisplaySlice(&self.versions),
            self.edition
        )
    }
}

/// A connection to a single member, addressed by its bolt address.
///
/// A driver is attached when a member enters and dropped when it exits.
#[add_async_trait]
pub trait Driver: Clone + Send + Sync + 'static {
    /// Query the product name, versions and edition of the member.
    async fn components(&mut self) -> Result<Components, QueryError>;
}

/// Builds a [`Driver`] for a member.
///
/// This function should **not** connect but rather return a client that
/// connects when required. Failures to reach the member surface through its
/// feeds instead.
pub trait DriverProvider: Send + 'static {
    type Driver: Driver;

    fn driver_for(&mut self, address: &str) -> Self::Driver;
}
