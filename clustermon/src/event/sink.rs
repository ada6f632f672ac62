use std::sync::Arc;

use crate::event::Event;

/// Receives every event the monitor emits.
///
/// `add_event` is called from the monitor's core task and must return
/// promptly: a slow or unavailable sink must drop or buffer events rather
/// than block.
pub trait EventSink: Send + Sync + 'static {
    fn add_event(&self, event: Event);
}

impl<T> EventSink for Arc<T>
where T: EventSink + ?Sized
{
    fn add_event(&self, event: Event) {
        self.as_ref().add_event(event)
    }
}
