// ── Reactive status streams ──
//
// Subscription types for consuming status changes from the StatusStore.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::Snapshot;

/// A subscription to one keyed status collection.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed`](Self::changed) or by converting to a `Stream`.
pub struct StatusStream<T: Send + Sync + 'static> {
    current: Snapshot<T>,
    receiver: watch::Receiver<Snapshot<T>>,
}

impl<T: Send + Sync + 'static> StatusStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot<T>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Snapshot<T> {
        &self.current
    }

    /// Latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Snapshot<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> StatusWatchStream<T> {
        StatusWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding a snapshot after every store write.
pub struct StatusWatchStream<T: Send + Sync + 'static> {
    inner: WatchStream<Snapshot<T>>,
}

impl<T: Send + Sync + 'static> Stream for StatusWatchStream<T> {
    type Item = Snapshot<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // Snapshot<T> is an Arc and therefore Unpin.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
