use tracing::error;
use tracing::info;
use tracing::warn;

use crate::event::Event;
use crate::event::EventSink;
use crate::event::Severity;

/// An [`EventSink`] writing every event to the `tracing` log, at a level
/// matching its severity.
#[derive(Debug, Clone, Default)]
pub struct LogSink {}

impl EventSink for LogSink {
    fn add_event(&self, event: Event) {
        match event.severity {
            Severity::Info => {
                info!(kind = display(event.kind), "{}: {}", event.address, event.message)
            }
            Severity::Alert => {
                warn!(kind = display(event.kind), "{}: {}", event.address, event.message)
            }
            Severity::Error => {
                error!(kind = display(event.kind), "{}: {}", event.address, event.message)
            }
        }
    }
}
