//! Monitor metrics for observability.
//!
//! A [`Metrics`] snapshot is published on a `watch` channel after every state
//! change of the monitor core. It is obtained with
//! [`Monitor::metrics`](crate::Monitor::metrics).
//!
//! Metrics is not a stream: it only guarantees to provide the latest state,
//! not every change of the state, because `watch::channel()` only stores the
//! last value.
//!
//! [`Wait`] blocks until the metrics satisfy a condition, which is mostly
//! useful in tests.

mod metric;
mod metrics;
mod scheduler_state;
mod wait;


pub use metric::Metric;
pub use metrics::Metrics;
pub use scheduler_state::Mode;
pub use scheduler_state::SchedulerState;
pub use wait::Wait;
pub use wait::WaitError;
