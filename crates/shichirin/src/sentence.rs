//! # RequestSentence
//!
//! A view over one segment of a [`Request`]. The batching layer carves a
//! request into sentences so each segment can be bucketed and batched with
//! segments of other requests; the back-reference lets the worker that
//! decodes the segment signal the owning request without re-deriving which
//! request the segment came from.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::request::Request;
use crate::types::{History, Segment};

/// A lightweight handle pairing a segment index with shared ownership of
/// its [`Request`]. Cheap to clone; keeps the request alive while any
/// batch still holds the view.
#[derive(Debug, Clone)]
pub struct RequestSentence {
    index: usize,
    request: Arc<Request>,
}

impl RequestSentence {
    /// Creates a view over segment `index` of `request`.
    ///
    /// Valid only while `index < request.num_segments()`; the batching
    /// layer only constructs views for indices it enumerated.
    pub fn new(index: usize, request: Arc<Request>) -> Self {
        Self { index, request }
    }

    /// Token count of the viewed segment.
    pub fn num_tokens(&self) -> usize {
        self.request.segment_tokens(self.index)
    }

    /// Line number of this sentence in the caller's input, for correlating
    /// with flat line-oriented external formats.
    pub fn line_number(&self) -> usize {
        self.request.line_number_begin() + self.index
    }

    /// A copy of the viewed segment's token sequence.
    pub fn segment(&self) -> Segment {
        self.request.get_segment(self.index)
    }

    /// Forwards the decode output to the owning request, completing this
    /// view. Must be called exactly once per sentence; the last completion
    /// of a request triggers response assembly.
    pub fn complete(self, history: History) {
        self.request.complete_segment(self.index, history);
    }
}

impl PartialEq for RequestSentence {
    fn eq(&self, other: &Self) -> bool {
        self.request == other.request && self.index == other.index
    }
}

impl Eq for RequestSentence {}

/// Delegates to the owning requests' total order so sentences can populate
/// a priority structure directly; sentences of the same request order by
/// segment index.
impl Ord for RequestSentence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.request
            .cmp(&other.request)
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for RequestSentence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::request_with_segments;

    #[tokio::test]
    async fn delegates_to_owning_request() {
        let (request, _future) = request_with_segments(0, 10, vec![vec![1, 2], vec![3]]);

        let first = RequestSentence::new(0, Arc::clone(&request));
        let second = RequestSentence::new(1, Arc::clone(&request));

        assert_eq!(first.num_tokens(), 2);
        assert_eq!(second.num_tokens(), 1);
        assert_eq!(first.line_number(), 10);
        assert_eq!(second.line_number(), 11);
        assert_eq!(first.segment(), vec![1, 2]);
    }

    #[tokio::test]
    async fn complete_forwards_to_request() {
        let (request, future) = request_with_segments(0, 0, vec![vec![5]]);

        RequestSentence::new(0, request).complete(History::single(vec![5]));

        let response = future.await.unwrap();
        assert_eq!(response.histories[0].best().unwrap().tokens, vec![5]);
    }

    #[tokio::test]
    async fn orders_by_request_then_index() {
        let (older, _f1) = request_with_segments(1, 0, vec![vec![1], vec![2]]);
        let (newer, _f2) = request_with_segments(2, 0, vec![vec![3]]);

        let a = RequestSentence::new(1, Arc::clone(&older));
        let b = RequestSentence::new(0, Arc::clone(&older));
        let c = RequestSentence::new(0, Arc::clone(&newer));

        let mut sentences = vec![c.clone(), a.clone(), b.clone()];
        sentences.sort();

        assert_eq!(sentences, vec![b, a, c]);
    }
}
