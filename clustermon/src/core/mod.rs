//! The `Core` is the single task owning all monitor state.
//!
//! It receives [`APIMessage`](io::api_message::APIMessage)s from the
//! [`Monitor`](crate::Monitor) handle and
//! [`Notification`](io::notification::Notification)s from the tasks it spawns:
//! membership fetches, refresh timers, feeds and member setups. Every mutation
//! of the membership, telemetry and subscriptions happens in this task.

#[allow(clippy::module_inception)]
pub(crate) mod core;
pub(crate) mod core_state;
pub(crate) mod io;
mod timer;

pub(crate) use timer::RefreshTimer;
