// ── Reactive subscription handle ──

use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::error::CoreError;
use crate::model::NotificationEntry;

type Snapshot = Arc<Vec<Arc<NotificationEntry>>>;

/// Subscription to registry snapshots, vended by
/// [`Notifier::subscribe`](crate::Notifier::subscribe).
///
/// `current()` reads without waiting; `changed()` waits for the next
/// mutation. For combinator-style consumers, [`into_stream`]
/// (Self::into_stream) adapts it to a `futures` `Stream`.
pub struct NotificationStream {
    rx: watch::Receiver<Snapshot>,
}

impl NotificationStream {
    pub(crate) fn new(rx: watch::Receiver<Snapshot>) -> Self {
        Self { rx }
    }

    /// The latest snapshot (cheap `Arc` clone, no waiting).
    pub fn current(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// Wait until the registry changes again.
    pub async fn changed(&mut self) -> Result<(), CoreError> {
        self.rx.changed().await.map_err(|_| CoreError::NotRunning)
    }

    /// Wait for the next change and return the new snapshot, or `None`
    /// once the manager is gone.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Adapt into a `Stream` of snapshots.
    pub fn into_stream(self) -> WatchStream<Snapshot> {
        WatchStream::new(self.rx)
    }
}
