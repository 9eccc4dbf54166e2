//! Resize notification channel between the host (container geometry) and an editor session.
//!
//! The host keeps a [`ResizeHandle`] and reports container widths as fast as it likes. The session
//! owns the matching [`ResizeFeed`] and drains it on its geometry tick, applying only the most
//! recent usable width.

use tokio::sync::mpsc;

/// Create a connected handle/feed pair.
pub fn resize_channel() -> (ResizeHandle, ResizeFeed) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ResizeHandle { tx }, ResizeFeed { rx })
}

/// Host side of a resize subscription.
#[derive(Clone, Debug)]
pub struct ResizeHandle {
    tx: mpsc::UnboundedSender<f64>,
}

impl ResizeHandle {
    /// Report a new container width. Returns `false` once the subscription was released.
    pub fn notify(&self, container_width: f64) -> bool {
        self.tx.send(container_width).is_ok()
    }

    /// True after the owning session released the subscription.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Session side of a resize subscription.
#[derive(Debug)]
pub struct ResizeFeed {
    rx: mpsc::UnboundedReceiver<f64>,
}

impl ResizeFeed {
    /// Drain every queued notification and return the last usable width, if any.
    pub fn drain_latest(&mut self) -> Option<f64> {
        let mut latest = None;
        while let Ok(width) = self.rx.try_recv() {
            latest = coalesce(latest, width);
        }
        latest
    }

    /// Wait for at least one notification, then coalesce whatever else is already queued.
    ///
    /// Returns `None` when every handle was dropped and the queue is empty.
    pub async fn next_latest(&mut self) -> Option<f64> {
        loop {
            let first = self.rx.recv().await?;
            let mut latest = coalesce(None, first);
            while let Ok(width) = self.rx.try_recv() {
                latest = coalesce(latest, width);
            }
            if latest.is_some() {
                return latest;
            }
        }
    }
}

fn coalesce(latest: Option<f64>, width: f64) -> Option<f64> {
    if width.is_finite() && width >= 0.0 {
        Some(width)
    } else {
        tracing::debug!(width, "dropping transient resize fault");
        latest
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/observer.rs"]
mod tests;
