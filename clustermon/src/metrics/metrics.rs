use std::collections::BTreeMap;
use std::fmt;

use chrono::DateTime;
use chrono::Utc;

use crate::base::display_ext::DisplayOptionExt;
use crate::errors::Fatal;
use crate::membership::Address;
use crate::membership::MembershipSet;
use crate::metrics::Mode;
use crate::metrics::SchedulerState;
use crate::telemetry::TelemetrySample;

/// A set of metrics describing the current state of a monitor.
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Metrics {
    pub running_state: Result<(), Fatal>,

    /// The name of the monitor, from [`Config::name`](crate::Config::name).
    pub name: String,

    pub mode: Mode,

    pub state: SchedulerState,

    /// A copy of the monitored members.
    pub members: MembershipSet,

    /// The latest heap sample of every member, keyed by bolt address.
    pub telemetry: BTreeMap<Address, TelemetrySample>,

    /// Number of live feeds.
    pub subscriptions: usize,

    /// Number of completed refreshes, including the initial one.
    pub refreshes: u64,

    /// Number of failed refreshes.
    pub refresh_failures: u64,

    /// When the last successful refresh completed.
    pub last_refresh: Option<DateTime<Utc>>,
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Metrics{{")?;

        write!(
            f,
            "name:{}, {:?}, {}, {}, members:{}, subscriptions:{}, refreshes:{}, failures:{}, last_refresh:{}",
            self.name,
            self.running_state,
            self.mode,
            self.state,
            self.members,
            self.subscriptions,
            self.refreshes,
            self.refresh_failures,
            self.last_refresh.display(),
        )?;

        write!(f, "}}")?;
        Ok(())
    }
}

impl Metrics {
    pub fn new_initial(name: impl ToString) -> Self {
        Self {
            running_state: Ok(()),
            name: name.to_string(),
            mode: Mode::default(),
            state: SchedulerState::default(),
            members: MembershipSet::new(),
            telemetry: BTreeMap::new(),
            subscriptions: 0,
            refreshes: 0,
            refresh_failures: 0,
            last_refresh: None,
        }
    }
}
