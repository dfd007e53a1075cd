//! Bounded, in-order write queue decoupling hot-path latency from disk.
//!
//! The synchronous write path saves under the tier lock before returning.
//! For callers that cannot afford that latency, [`WriteJournal`] accepts a
//! persistence request per staged entry and applies it from a single
//! consumer task, preserving order. The producer blocks only once the bound
//! is exceeded (backpressure, no unbounded buffering).

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::store::TierStore;

pub struct WriteJournal {
    tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl WriteJournal {
    /// Start the consumer task for one tier's store.
    pub fn spawn(store: Arc<TierStore>, depth: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<()>(depth.max(1));
        let handle = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                // Drain whatever accumulated; one save covers them all.
                while rx.try_recv().is_ok() {}
                flush(&store).await;
            }
            // Channel closed: one final save so staged entries are not lost.
            flush(&store).await;
            debug!(tier = %store.tier(), "write journal drained");
        });
        Self { tx, handle }
    }

    /// Request persistence of the tier's current contents. Blocks the async
    /// caller only when the queue is at its bound.
    pub async fn notify(&self) {
        if self.tx.send(()).await.is_err() {
            warn!("write journal consumer gone; staged entries persist on shutdown only");
        }
    }

    /// Close the queue and wait for the final save to land.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "write journal task panicked");
        }
    }
}

async fn flush(store: &Arc<TierStore>) {
    let store = Arc::clone(store);
    let result = tokio::task::spawn_blocking(move || store.persist()).await;
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "journaled save failed; entries remain in memory"),
        Err(e) => warn!(error = %e, "journal flush task failed"),
    }
}
