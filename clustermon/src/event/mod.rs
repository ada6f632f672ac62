//! Events emitted by the monitor and the sink receiving them.

#[allow(clippy::module_inception)]
mod event;
mod sink;


pub use event::Event;
pub use event::EventKind;
pub use event::EventPayload;
pub use event::Severity;
pub use sink::EventSink;
