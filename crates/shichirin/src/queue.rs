//! Bounded producer/consumer queue carrying sealed and poison batches from
//! the batching layer to the worker pool.
//!
//! Producers block when the queue is full and workers block when it is
//! empty; those, plus awaiting a response, are the only blocking points in
//! the crate. Batches move wholly from producer to consumer, never shared
//! across threads concurrently.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

use crate::batch::Batch;

/// Returned by [`BatchSender::push`] when every worker has dropped its end
/// of the queue; carries the batch back so its work is not silently lost.
#[derive(Debug, Error)]
#[error("batch queue closed")]
pub struct QueueClosed(pub Batch);

/// Creates a bounded FIFO queue with room for `capacity` batches.
pub fn bounded(capacity: usize) -> (BatchSender, BatchReceiver) {
    let (sender, receiver) = mpsc::channel(capacity);
    (
        BatchSender { sender },
        BatchReceiver {
            receiver: Arc::new(Mutex::new(receiver)),
        },
    )
}

/// Producer handle, cloneable across batching threads.
#[derive(Clone)]
pub struct BatchSender {
    sender: mpsc::Sender<Batch>,
}

impl BatchSender {
    /// Enqueues a batch, waiting while the queue is at capacity.
    pub async fn push(&self, batch: Batch) -> Result<(), QueueClosed> {
        self.sender
            .send(batch)
            .await
            .map_err(|err| QueueClosed(err.0))
    }
}

/// Consumer handle. Clones share one receiver behind a mutex so a pool of
/// workers drains a single FIFO; each batch is popped by exactly one
/// worker.
#[derive(Clone)]
pub struct BatchReceiver {
    receiver: Arc<Mutex<mpsc::Receiver<Batch>>>,
}

impl BatchReceiver {
    /// Dequeues the oldest batch, waiting while the queue is empty.
    /// Returns `None` once all producers are gone and the queue has
    /// drained.
    pub async fn pop(&self) -> Option<Batch> {
        self.receiver.lock().await.recv().await
    }
}
