//! # Batch
//!
//! An ordered, reusable container of [`RequestSentence`]s tagged with a
//! batch id. Batches are what travels through the producer/consumer queue
//! between the batching layer and the worker pool.
//!
//! The id encodes the batch's state:
//!
//! ```text
//! id < 0 : poison, the shutdown signal, carries no sentences
//! id = 0 : empty / building, sentences accumulating
//! id > 0 : sealed, ready for a worker
//! ```
//!
//! A batch moves `Building -> Sealed -> Completed`, then back to building
//! via [`reset`](Batch::reset). Completing a batch consumes its sentences
//! and returns the id to zero, so a batch instance can never fan the same
//! results out twice.

use crate::sentence::RequestSentence;
use crate::types::History;

const POISON_ID: i32 = -1;

#[derive(Debug, Default)]
pub struct Batch {
    id: i32,
    sentences: Vec<RequestSentence>,
}

impl Batch {
    /// An empty batch in building state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the sentence list and returns the id to zero, making the
    /// batch safe to refill. Refilling without resetting first would
    /// re-complete stale sentences, so [`add`](Batch::add) refuses sealed
    /// batches outright.
    pub fn reset(&mut self) {
        self.id = 0;
        self.sentences.clear();
    }

    /// A shutdown signal. Workers receiving a poison batch stop pulling
    /// further work; the batching layer enqueues one per worker that must
    /// terminate.
    pub fn poison() -> Self {
        Self {
            id: POISON_ID,
            sentences: Vec::new(),
        }
    }

    pub fn is_poison(&self) -> bool {
        self.id < 0
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    /// Number of sentences in the batch.
    pub fn size(&self) -> usize {
        self.sentences.len()
    }

    /// Appends a sentence while the batch is building.
    ///
    /// # Panics
    ///
    /// Panics when the batch is sealed or poison; segments must all be
    /// added before [`set_id`](Batch::set_id) seals the batch.
    pub fn add(&mut self, sentence: RequestSentence) {
        assert_eq!(
            self.id, 0,
            "cannot add a sentence to a batch with id {}",
            self.id
        );
        self.sentences.push(sentence);
    }

    /// Seals the batch under a positive id, transitioning it from building
    /// to ready-for-a-worker.
    ///
    /// # Panics
    ///
    /// Panics when `id <= 0` (poison batches come from
    /// [`poison`](Batch::poison), zero is the building state) or when the
    /// batch is already sealed.
    pub fn set_id(&mut self, id: i32) {
        assert!(id > 0, "batch id must be positive, got {id}");
        assert_eq!(self.id, 0, "batch {} is already sealed", self.id);
        self.id = id;
    }

    /// The sentences in the batch, in the order the decoder must return
    /// results.
    pub fn sentences(&self) -> &[RequestSentence] {
        &self.sentences
    }

    /// Fans decode output back to the owning requests: `histories[i]` is
    /// forwarded through sentence `i`. Consumes the sentences and returns
    /// the batch to building state; some of the touched requests may
    /// finalize as a result, others still have segments in other batches.
    ///
    /// # Panics
    ///
    /// Panics when the batch is not sealed (including a second completion
    /// of the same instance) or when `histories` does not match the
    /// sentence count.
    pub fn complete_batch(&mut self, histories: Vec<History>) {
        assert!(
            self.id > 0,
            "completed a batch with id {} that was never sealed",
            self.id
        );
        assert_eq!(
            histories.len(),
            self.sentences.len(),
            "batch {} holds {} sentences but received {} histories",
            self.id,
            self.sentences.len(),
            histories.len()
        );
        for (sentence, history) in self.sentences.drain(..).zip(histories) {
            sentence.complete(history);
        }
        self.id = 0;
    }

    /// Emits packing statistics for the sealed batch.
    pub fn log(&self) {
        let max_tokens = self
            .sentences
            .iter()
            .map(RequestSentence::num_tokens)
            .max()
            .unwrap_or(0);
        let total_tokens: usize = self.sentences.iter().map(RequestSentence::num_tokens).sum();
        tracing::debug!(
            id = self.id,
            size = self.sentences.len(),
            total_tokens,
            max_tokens,
            "batch sealed"
        );
    }
}
