//! # Request
//!
//! A `Request` owns one submitted text, the segments the external
//! segmenter produced from it, and the completion barrier that fires when
//! the last of those segments has been decoded.
//!
//! Segments of the same request travel in different batches and finish on
//! different worker tasks at different times. Each completion writes its
//! history into the slot for its segment index and decrements an atomic
//! outstanding-count; the single caller that observes the count reach zero
//! assembles the [`Response`] and fulfills the request's one-shot promise.
//!
//! Requests are shared-owned: the submitter, every
//! [`RequestSentence`](crate::RequestSentence) carved out of the request,
//! and any in-flight batch holding such sentences all keep the request
//! alive through `Arc`. The request never points back at its sentences or
//! batches, so plain reference counting reclaims everything.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::error::{RequestError, Result};
use crate::response::{Response, ResponseFuture};
use crate::types::{History, Segment, SharedVocabularies, TokenRange};

/// Process-wide insertion sequence. Breaks ties between requests that were
/// constructed with equal ids, keeping the order total and stable.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

pub struct Request {
    /// Submission id assigned by the caller, monotonically increasing.
    /// Primary sort key for batching priority: oldest submission first.
    id: u64,

    /// Tie-break key drawn from [`SEQUENCE`] at construction.
    sequence: u64,

    /// Line number of the first segment in the caller's input, used only
    /// for correlation with line-oriented external formats and logging.
    line_number_begin: usize,

    /// Count of segments not yet completed. Multiple worker tasks complete
    /// segments of the same request concurrently; the decrement is an
    /// atomic fetch-and-subtract so exactly one caller observes zero.
    counter: AtomicUsize,

    /// The source text the segments were produced from.
    source: String,

    /// Token-id sequences, one per segment.
    segments: Vec<Segment>,

    /// For each segment, the span of `source` it aligns to.
    source_token_ranges: Vec<TokenRange>,

    /// One slot per segment, written at most once, by at most one worker.
    histories: Mutex<Vec<Option<History>>>,

    /// The producing half of the completion channel. Taken exactly once,
    /// by the completion that drops the counter to zero.
    promise: Mutex<Option<oneshot::Sender<Response>>>,

    /// Read-only token tables supplied by the surrounding service; the
    /// last entry is the target-side table used for response assembly.
    vocabs: SharedVocabularies,
}

impl Request {
    /// Creates a request over `segments.len()` pending segments, returning
    /// it together with the future the submitter awaits for the assembled
    /// response.
    ///
    /// A request with zero segments finalizes immediately with an empty
    /// response.
    ///
    /// # Errors
    ///
    /// [`RequestError::SegmentRangeMismatch`] when `segments` and
    /// `source_token_ranges` differ in length.
    pub fn new(
        id: u64,
        line_number_begin: usize,
        vocabs: SharedVocabularies,
        source: String,
        segments: Vec<Segment>,
        source_token_ranges: Vec<TokenRange>,
    ) -> Result<(Arc<Self>, ResponseFuture)> {
        if segments.len() != source_token_ranges.len() {
            return Err(RequestError::SegmentRangeMismatch {
                segments: segments.len(),
                ranges: source_token_ranges.len(),
            });
        }

        let (sender, receiver) = oneshot::channel();
        let request = Arc::new(Self {
            id,
            sequence: SEQUENCE.fetch_add(1, Ordering::Relaxed),
            line_number_begin,
            counter: AtomicUsize::new(segments.len()),
            histories: Mutex::new(vec![None; segments.len()]),
            source,
            segments,
            source_token_ranges,
            promise: Mutex::new(Some(sender)),
            vocabs,
        });

        if request.num_segments() == 0 {
            request.complete_request();
        }

        Ok((request, ResponseFuture::new(receiver)))
    }

    /// Submission id assigned at construction.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of segments in this request.
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Line number of the first segment in the caller's input.
    pub fn line_number_begin(&self) -> usize {
        self.line_number_begin
    }

    /// Token count of segment `index`, used by the batching layer to place
    /// the segment in a size bucket.
    ///
    /// # Panics
    ///
    /// Indexing outside `0..num_segments()` is a programming error and
    /// panics; callers must only index segments they enumerated through
    /// [`num_segments`](Self::num_segments).
    pub fn segment_tokens(&self, index: usize) -> usize {
        self.segments[index].len()
    }

    /// A copy of segment `index`'s token sequence, for feeding into a
    /// worker's batch.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range, as with
    /// [`segment_tokens`](Self::segment_tokens).
    pub fn get_segment(&self, index: usize) -> Segment {
        self.segments[index].clone()
    }

    /// Stores the decode output for segment `index` and decrements the
    /// outstanding-count. The caller whose decrement observes the count
    /// reach zero, and only that caller, assembles the response and
    /// fulfills the promise.
    ///
    /// Safe to call concurrently from different worker tasks for different
    /// indices.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range or when segment `index` was
    /// already completed. Both indicate the batching layer assigned a
    /// segment to more than one batch, which is a fatal invariant
    /// violation rather than a recoverable condition.
    pub fn complete_segment(&self, index: usize, history: History) {
        {
            let mut histories = self.histories.lock().unwrap();
            let slot = &mut histories[index];
            assert!(
                slot.is_none(),
                "segment {index} of request {} completed twice",
                self.id
            );
            *slot = Some(history);
        }

        // fetch_sub returns the previous value, so exactly one completion
        // observes 1 -> 0 even when the last two segments race.
        if self.counter.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.complete_request();
        }
    }

    /// Assembles the response from the now-complete history slots and
    /// fires the promise. Reached exactly once, from the completion of the
    /// last outstanding segment.
    fn complete_request(&self) {
        let histories: Vec<History> = {
            let mut slots = self.histories.lock().unwrap();
            slots
                .iter_mut()
                .map(|slot| {
                    slot.take()
                        .expect("request finalized with an unfilled history slot")
                })
                .collect()
        };

        let target = self.vocabs.last();
        let translations = histories
            .iter()
            .map(|history| match (target, history.best()) {
                (Some(vocab), Some(best)) => vocab.decode(&best.tokens),
                _ => String::new(),
            })
            .collect();

        let response = Response {
            source: self.source.clone(),
            source_ranges: self.source_token_ranges.clone(),
            histories,
            translations,
        };

        let sender = self
            .promise
            .lock()
            .unwrap()
            .take()
            .expect("request response promise already fulfilled");
        if sender.send(response).is_err() {
            tracing::debug!(id = self.id, "response receiver dropped before completion");
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("line_number_begin", &self.line_number_begin)
            .field("num_segments", &self.segments.len())
            .finish()
    }
}

/// Requests with equal ids are distinct; the insertion sequence is unique
/// per process.
impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for Request {}

/// Total order used by the batching layer's priority structure: oldest
/// submission first, with the insertion sequence as a stable tie-break so
/// equal-id requests keep their construction order.
impl Ord for Request {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        (self.id, self.sequence).cmp(&(other.id, other.sequence))
    }
}

impl PartialOrd for Request {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}
