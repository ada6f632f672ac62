use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::io::notification::Notification;

/// A one-shot timer sending [`Notification::RefreshDue`] to the core.
///
/// At most one timer is pending: scheduling replaces the previous one.
#[derive(Default)]
pub(crate) struct RefreshTimer {
    /// The id assigned to the last scheduled timer.
    last_id: u64,

    /// The pending timer and its id.
    pending: Option<(u64, JoinHandle<()>)>,
}

impl RefreshTimer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Cancel the pending timer, if any, and start a new one firing after
    /// `delay`.
    pub(crate) fn schedule(
        &mut self,
        delay: Duration,
        tx: mpsc::WeakUnboundedSender<Notification>,
    ) -> u64 {
        self.cancel();

        self.last_id += 1;
        let timer_id = self.last_id;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(tx) = tx.upgrade() else {
                debug!("Core quit, drop refresh timer {}", timer_id);
                return;
            };
            let _ = tx.send(Notification::RefreshDue { timer_id });
        });

        self.pending = Some((timer_id, handle));

        debug!("refresh timer {} scheduled in {:?}", timer_id, delay);
        timer_id
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Accept a fired timer.
    ///
    /// Returns `false` if `timer_id` is not the pending timer: it was
    /// cancelled or replaced after it had already sent its notification.
    pub(crate) fn fire(&mut self, timer_id: u64) -> bool {
        match &self.pending {
            Some((id, _)) if *id == timer_id => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn cancel(&mut self) {
        if let Some((id, handle)) = self.pending.take() {
            debug!("cancel refresh timer {}", id);
            handle.abort();
        }
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
