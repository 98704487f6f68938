//! Shared fixtures for the crate's tests.

use std::sync::Arc;

use crate::batch::Batch;
use crate::request::Request;
use crate::response::ResponseFuture;
use crate::sentence::RequestSentence;
use crate::types::{Segment, SharedVocabularies, TokenId, TokenRange, Vocabulary};

/// Renders token ids as space-separated digits, e.g. `[10, 11]` -> "10 11".
pub struct DigitVocabulary;

impl Vocabulary for DigitVocabulary {
    fn decode(&self, tokens: &[TokenId]) -> String {
        tokens
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A request over the given segments with synthetic one-byte alignment
/// ranges and a digit vocabulary.
pub fn request_with_segments(
    id: u64,
    line_number_begin: usize,
    segments: Vec<Segment>,
) -> (Arc<Request>, ResponseFuture) {
    let vocabs: SharedVocabularies = vec![Arc::new(DigitVocabulary)];
    let ranges = (0..segments.len())
        .map(|index| TokenRange::new(index, index + 1))
        .collect();
    Request::new(
        id,
        line_number_begin,
        vocabs,
        "x".repeat(segments.len()),
        segments,
        ranges,
    )
    .expect("test request construction")
}

/// One sentence view per segment of `request`, in segment order.
pub fn sentences_of(request: &Arc<Request>) -> Vec<RequestSentence> {
    (0..request.num_segments())
        .map(|index| RequestSentence::new(index, Arc::clone(request)))
        .collect()
}

/// A single-sentence batch sealed under `id`, paired with the future of
/// the request it was built from.
pub fn sealed_batch(id: i32) -> (Batch, ResponseFuture) {
    let (request, future) = request_with_segments(id as u64, 0, vec![vec![id as TokenId]]);
    let mut batch = Batch::new();
    batch.add(RequestSentence::new(0, request));
    batch.set_id(id);
    (batch, future)
}
