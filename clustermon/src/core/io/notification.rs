use std::fmt;

use anyerror::AnyError;

use crate::errors::QueryError;
use crate::membership::Address;
use crate::membership::MemberDescriptor;
use crate::query::driver::Components;
use crate::subscription::FeedKind;
use crate::subscription::FeedSample;
use crate::subscription::SubscriptionId;

/// A message coming from the tasks spawned by the core.
pub(crate) enum Notification {
    /// The refresh timer fired.
    RefreshDue {
        /// Identifies the timer; a replaced timer is ignored.
        timer_id: u64,
    },

    /// A membership fetch finished.
    Fetched {
        /// Identifies the fetch; the result of a discarded fetch is ignored.
        seq: u64,
        result: Result<Vec<MemberDescriptor>, QueryError>,
    },

    FeedData {
        address: Address,
        kind: FeedKind,
        id: SubscriptionId,
        sample: FeedSample,
    },

    FeedError {
        address: Address,
        kind: FeedKind,
        id: SubscriptionId,
        error: AnyError,
    },

    /// An entering member answered its first ping and reported its
    /// components, or failed to.
    SetupCompleted {
        address: Address,
        result: Result<Components, AnyError>,
    },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RefreshDue { timer_id } => {
                write!(f, "RefreshDue: timer_id={}", timer_id)
            }
            Self::Fetched { seq, result } => match result {
                Ok(members) => {
                    write!(f, "Fetched: seq={}, {} members", seq, members.len())
                }
                Err(e) => write!(f, "Fetched: seq={}, error: {}", seq, e),
            },
            Self::FeedData {
                address,
                kind,
                id,
                sample,
            } => {
                write!(
                    f,
                    "FeedData: {} on {}, id={}: {}",
                    kind, address, id, sample
                )
            }
            Self::FeedError {
                address,
                kind,
                id,
                error,
            } => {
                write!(
                    f,
                    "FeedError: {} on {}, id={}: {}",
                    kind, address, id, error
                )
            }
            Self::SetupCompleted { address, result } => match result {
                Ok(c) => write!(f, "SetupCompleted: {}: {}", address, c),
                Err(e) => {
                    write!(f, "SetupCompleted: {}, error: {}", address, e)
                }
            },
        }
    }
}
