//! The assembled translation result and the future that delivers it.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::types::{History, TokenRange};

/// The final output for one submitted request, assembled exactly once when
/// its last segment finishes decoding.
///
/// All per-segment vectors are in the original segment order derived from
/// stored indices, never the order in which workers happened to finish.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// The source text as submitted.
    pub source: String,

    /// For each segment, the span of `source` its tokens came from.
    pub source_ranges: Vec<TokenRange>,

    /// For each segment, the decoder's ranked output.
    pub histories: Vec<History>,

    /// For each segment, the target vocabulary's rendering of the top
    /// hypothesis. Empty for segments whose history carried no hypotheses.
    pub translations: Vec<String>,
}

/// # ResponseFuture
///
/// The consuming half of a request's single-fire completion channel.
///
/// Returned to the submitter at request construction; resolves once, when
/// the last segment of the request has been completed by a worker and the
/// response has been assembled.
///
/// Resolving to an error means every producing handle for the request was
/// dropped before the request finalized, which only happens when the
/// pipeline is torn down with work still in flight.
pub struct ResponseFuture {
    /// The underlying channel receiver
    receiver: oneshot::Receiver<Response>,
}

impl ResponseFuture {
    pub(crate) fn new(receiver: oneshot::Receiver<Response>) -> Self {
        Self { receiver }
    }
}

impl Future for ResponseFuture {
    type Output = Result<Response, oneshot::error::RecvError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver).poll(cx)
    }
}
