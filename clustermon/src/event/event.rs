use std::collections::BTreeMap;
use std::fmt;

use chrono::DateTime;
use chrono::Utc;

use crate::membership::Address;
use crate::membership::Member;
use crate::membership::Role;
use crate::telemetry::TelemetrySample;

/// What an [`Event`] is about.
#[derive(Debug, Clone, Copy)]
#[derive(PartialEq, Eq)]
#[derive(derive_more::Display)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum EventKind {
    /// A member joined the monitored set.
    #[display("enter")]
    Enter,

    /// A member is no longer reported by the cluster.
    #[display("exit")]
    Exit,

    /// Addresses, role, database assignments or groups of a member changed.
    #[display("change")]
    Change,

    /// Heap allocation or utilization of a member.
    #[display("memory")]
    Memory,
}

#[derive(Debug, Clone, Copy)]
#[derive(PartialEq, Eq, PartialOrd, Ord)]
#[derive(derive_more::Display)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum Severity {
    #[display("info")]
    Info,
    #[display("alert")]
    Alert,
    #[display("error")]
    Error,
}

/// A copy of the state an [`Event`] was raised for.
///
/// Payloads never refer to the monitor's live state: updating the monitor
/// after an event is emitted does not alter the event.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum EventPayload {
    Member {
        address: Address,
        databases: BTreeMap<String, Role>,
    },

    HeapChange {
        old: TelemetrySample,
        new: TelemetrySample,
    },

    Heap(TelemetrySample),
}

/// An immutable record of something the monitor observed.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Event {
    pub kind: EventKind,
    pub severity: Severity,

    /// The bolt address of the member this event is about.
    pub address: Address,

    pub message: String,
    pub payload: EventPayload,
    pub date: DateTime<Utc>,
}

impl Event {
    pub fn new(
        kind: EventKind,
        severity: Severity,
        address: impl ToString,
        message: impl ToString,
        payload: EventPayload,
    ) -> Self {
        Self {
            kind,
            severity,
            address: address.to_string(),
            message: message.to_string(),
            payload,
            date: Utc::now(),
        }
    }

    /// Build a topology event about `member`, carrying its address and
    /// database roles.
    pub(crate) fn member(kind: EventKind, member: &Member) -> Self {
        let message = match kind {
            EventKind::Enter => "Cluster member entered.",
            EventKind::Exit => "Cluster member exited.",
            _ => "Cluster member changed database assignments, groups, or addresses.",
        };

        let address = member.bolt_address().to_string();

        Self::new(kind, Severity::Info, &address, message, EventPayload::Member {
            address: address.clone(),
            databases: member.databases().clone(),
        })
    }

    /// Whether this event is more severe than informational.
    pub fn is_alert(&self) -> bool {
        self.severity > Severity::Info
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}({}): {}",
            self.severity, self.kind, self.address, self.message
        )
    }
}
