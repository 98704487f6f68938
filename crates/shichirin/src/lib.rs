//! # Shichirin
//!
//! The request-batching and completion-synchronization core of a
//! concurrent translation serving pipeline.
//!
//! ## Overview
//!
//! A client submits one text; the surrounding service segments it into
//! independently translatable token sequences and constructs a
//! [`Request`]. The batching layer carves requests into
//! [`RequestSentence`] views, groups them across requests into sealed
//! [`Batch`]es, and moves those through a bounded queue to a pool of
//! decode workers. Segments of the same request may finish on different
//! workers at different times; each completion decrements the request's
//! atomic outstanding-count, and the completion that reaches zero
//! assembles the [`Response`] and resolves the submitter's
//! [`ResponseFuture`] exactly once, in original segment order.
//!
//! ## Architecture
//!
//! The crate is built around a few invariants:
//!
//! - **Shared ownership without cycles**: a request is kept alive by its
//!   submitter, its sentence views, and any in-flight batch, through
//!   `Arc`; the request never points back at its views or batches.
//! - **Exactly-once finalization**: the outstanding-count is decremented
//!   with an atomic fetch-and-subtract, and the single caller observing
//!   the transition to zero fires the one-shot completion channel.
//! - **Poison-pill shutdown**: termination is a reserved [`Batch`]
//!   identity flowing through the same queue as real work, one per worker
//!   that must stop.
//!
//! Contract violations (completing a segment twice, adding to a sealed
//! batch, completing a batch with a mismatched result count) panic at
//! the point of the call; they indicate a broken batching layer upstream
//! and continuing would corrupt other requests' results.
//!
//! Decoding, tokenization, and the transport surface all live outside
//! this crate, behind [`BatchDecoder`] and the construction arguments of
//! [`Request`].

mod batch;
mod error;
mod queue;
mod request;
mod response;
mod sentence;
mod types;
mod worker;

#[cfg(test)]
pub(crate) mod test_utils;

pub use batch::Batch;
pub use error::{RequestError, Result};
pub use queue::{BatchReceiver, BatchSender, QueueClosed, bounded};
pub use request::Request;
pub use response::{Response, ResponseFuture};
pub use sentence::RequestSentence;
pub use types::{
    History, Hypothesis, Segment, SharedVocabularies, TokenId, TokenRange, Vocabulary,
};
pub use worker::{BatchDecoder, WorkerPool, poison_all};
