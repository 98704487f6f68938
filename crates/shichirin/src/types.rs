//! Shared vocabulary and token-level types used across the batching core.
//!
//! Segmentation and decoding both live outside this crate; these types pin
//! down the data that crosses that boundary: token-id sequences, their
//! alignment back into the submitted text, and the ranked decode output
//! produced for each segment.

use std::sync::Arc;

/// Identifier of a single token in a vocabulary.
pub type TokenId = u32;

/// One independently translatable unit of text, reduced to token ids by the
/// external segmenter.
pub type Segment = Vec<TokenId>;

/// Half-open byte range `[begin, end)` into the submitted source text that a
/// segment's tokens were produced from. Used to reconstruct an aligned
/// response once all segments are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRange {
    pub begin: usize,
    pub end: usize,
}

impl TokenRange {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }
}

/// A single decode candidate for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    /// Target-side token ids.
    pub tokens: Segment,

    /// Model score assigned by the decoder. Higher is better.
    pub score: f32,
}

impl Hypothesis {
    pub fn new(tokens: Segment, score: f32) -> Self {
        Self { tokens, score }
    }
}

/// The decode output for one segment: the decoder's candidates, ranked best
/// first. The core stores and routes histories without inspecting beam
/// contents; only response assembly reads the top hypothesis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct History {
    hypotheses: Vec<Hypothesis>,
}

impl History {
    /// Creates a history from hypotheses already ranked best-first by the
    /// decoder.
    pub fn new(hypotheses: Vec<Hypothesis>) -> Self {
        Self { hypotheses }
    }

    /// Convenience constructor for a single-candidate history.
    pub fn single(tokens: Segment) -> Self {
        Self {
            hypotheses: vec![Hypothesis::new(tokens, 0.0)],
        }
    }

    /// The top-ranked hypothesis, if the decoder produced any.
    pub fn best(&self) -> Option<&Hypothesis> {
        self.hypotheses.first()
    }

    pub fn hypotheses(&self) -> &[Hypothesis] {
        &self.hypotheses
    }
}

/// A read-only token table owned by the surrounding service. The core never
/// mutates vocabularies; it holds references only long enough to detokenize
/// the top hypothesis of each segment during response assembly.
pub trait Vocabulary: Send + Sync {
    /// Renders a token-id sequence as surface text.
    fn decode(&self, tokens: &[TokenId]) -> String;
}

/// Vocabularies as supplied at request construction, source tables first and
/// the target table last.
pub type SharedVocabularies = Vec<Arc<dyn Vocabulary>>;
