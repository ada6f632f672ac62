use tokio::sync::mpsc;
use tracing::debug;

use crate::event::Event;
use crate::event::EventSink;

/// An [`EventSink`] forwarding every event to an unbounded channel.
///
/// Events are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn add_event(&self, event: Event) {
        if let Err(e) = self.tx.send(event) {
            debug!("event receiver is closed, drop: {}", e.0);
        }
    }
}
