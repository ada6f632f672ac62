use std::fmt;

use tokio::sync::oneshot;

use crate::errors::RefreshError;
use crate::membership::Address;
use crate::subscription::FeedKind;
use crate::subscription::Waiter;

/// A message sent by the application to the [`Core`].
///
/// [`Core`]: crate::core::core::Core
pub(crate) enum APIMessage {
    /// Run a membership refresh now, or join the one in flight.
    Refresh {
        tx: oneshot::Sender<Result<(), RefreshError>>,
    },

    /// Wait for the next outcome of a feed of a member.
    Watch {
        address: Address,
        kind: FeedKind,
        tx: Waiter,
    },

    /// Release everything and quit.
    Stop { tx: oneshot::Sender<()> },
}

impl fmt::Display for APIMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            APIMessage::Refresh { .. } => {
                write!(f, "Refresh")
            }
            APIMessage::Watch { address, kind, .. } => {
                write!(f, "Watch: {} on {}", kind, address)
            }
            APIMessage::Stop { .. } => {
                write!(f, "Stop")
            }
        }
    }
}
