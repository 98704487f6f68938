//! Error types for the batching core.
//!
//! Only malformed construction input is recoverable. Invariant violations
//! that occur once a request is in flight (double completion, adding to a
//! sealed batch, mismatched result counts) indicate a broken batching layer
//! upstream and panic instead, since continuing would corrupt another
//! request's results.

use thiserror::Error;

/// Result type alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, RequestError>;

#[derive(Error, Debug)]
pub enum RequestError {
    /// A request was constructed with a different number of segments than
    /// alignment ranges.
    #[error("segment/range arity mismatch: {segments} segments, {ranges} ranges")]
    SegmentRangeMismatch { segments: usize, ranges: usize },
}
