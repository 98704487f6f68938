//! # Worker pool
//!
//! Consumes batches from the bounded queue, hands their sentences to the
//! decoder, and fans the results back through
//! [`complete_batch`](crate::Batch::complete_batch). The pool drains on
//! poison: the batching layer enqueues one poison batch per worker, and
//! each worker stops pulling work after consuming exactly one.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::queue::{BatchReceiver, BatchSender, QueueClosed};
use crate::sentence::RequestSentence;
use crate::types::History;

/// The decoding seam. Implementations wrap the actual translation model
/// and beam search; the pool only requires that a batch of sentences comes
/// back as one history per sentence, in the same order.
#[async_trait]
pub trait BatchDecoder: Send + Sync {
    async fn decode(&self, sentences: &[RequestSentence]) -> Vec<History>;
}

/// A pool of worker tasks draining one shared batch queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `workers` tasks over a shared decoder. Each worker loops:
    /// pop a batch, stop on poison, otherwise decode and complete.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<D>(decoder: D, receiver: BatchReceiver, workers: usize) -> Self
    where
        D: BatchDecoder + 'static,
    {
        let decoder = Arc::new(decoder);
        let handles = (0..workers)
            .map(|worker| {
                let decoder = Arc::clone(&decoder);
                let receiver = receiver.clone();
                tokio::spawn(async move {
                    while let Some(mut batch) = receiver.pop().await {
                        if batch.is_poison() {
                            tracing::debug!(worker, "poison received, stopping");
                            break;
                        }
                        batch.log();
                        let histories = decoder.decode(batch.sentences()).await;
                        batch.complete_batch(histories);
                    }
                })
            })
            .collect();

        Self { handles }
    }

    /// Waits for every worker to stop. Re-raises the panic of any worker
    /// that died on a contract violation.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        }
    }
}

/// Enqueues one poison batch per worker. Every worker consumes exactly one
/// poison, so all `workers` tasks observe shutdown and no sealed batch
/// already in the queue is dropped.
pub async fn poison_all(sender: &BatchSender, workers: usize) -> Result<(), QueueClosed> {
    for _ in 0..workers {
        sender.push(crate::batch::Batch::poison()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::batch::Batch;
    use crate::queue::bounded;
    use crate::test_utils::request_with_segments;

    /// Echoes every segment back as its own translation.
    struct EchoDecoder;

    #[async_trait]
    impl BatchDecoder for EchoDecoder {
        async fn decode(&self, sentences: &[RequestSentence]) -> Vec<History> {
            sentences
                .iter()
                .map(|sentence| History::single(sentence.segment()))
                .collect()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn pool_drains_all_work_then_shuts_down_on_poison() {
        const WORKERS: usize = 3;
        const REQUESTS: u64 = 20;

        let (sender, receiver) = bounded(8);
        let pool = WorkerPool::spawn(EchoDecoder, receiver, WORKERS);

        let mut response_futures = Vec::new();
        for id in 0..REQUESTS {
            let (request, future) =
                request_with_segments(id, 0, vec![vec![id as u32], vec![id as u32 + 1]]);
            response_futures.push(future);

            // One batch per segment, so segments of a request land on
            // different workers.
            for index in 0..request.num_segments() {
                let mut batch = Batch::new();
                batch.add(RequestSentence::new(index, Arc::clone(&request)));
                batch.set_id((id * 2 + index as u64 + 1) as i32);
                sender.push(batch).await.unwrap();
            }
        }

        poison_all(&sender, WORKERS).await.unwrap();
        pool.join().await;

        // No work lost: every request resolved despite the poisons.
        for (id, future) in response_futures.into_iter().enumerate() {
            let response = future.await.unwrap();
            assert_eq!(
                response.histories[0].best().unwrap().tokens,
                vec![id as u32]
            );
            assert_eq!(
                response.histories[1].best().unwrap().tokens,
                vec![id as u32 + 1]
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn each_worker_consumes_exactly_one_poison() {
        let (sender, receiver) = bounded(4);
        let pool = WorkerPool::spawn(EchoDecoder, receiver.clone(), 2);

        poison_all(&sender, 2).await.unwrap();
        pool.join().await;

        // Both poisons were consumed; the queue is empty but still open.
        let mut pending = std::pin::pin!(receiver.pop());
        assert!(futures::FutureExt::now_or_never(pending.as_mut()).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn decoder_contract_violation_surfaces_on_join() {
        struct ShortDecoder;

        #[async_trait]
        impl BatchDecoder for ShortDecoder {
            async fn decode(&self, _sentences: &[RequestSentence]) -> Vec<History> {
                Vec::new()
            }
        }

        let (sender, receiver) = bounded(2);
        let pool = WorkerPool::spawn(ShortDecoder, receiver, 1);

        let (request, _future) = request_with_segments(0, 0, vec![vec![1]]);
        let mut batch = Batch::new();
        batch.add(RequestSentence::new(0, request));
        batch.set_id(1);
        sender.push(batch).await.unwrap();

        let result = tokio::spawn(pool.join()).await;
        assert!(result.is_err(), "mismatched history count must be fatal");
    }
}
