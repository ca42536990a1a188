//! Streamed crawl results
//!
//! Results flow through a bounded channel from the workers to the
//! consumer, so pages are delivered while the crawl is still running.
//! The channel closing is the end-of-crawl marker, and dropping the
//! stream cancels the run.

use crate::url::CanonicalUrl;
use crate::LinkmapError;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::{CancellationToken, DropGuard};

/// How processing one dispatched page went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// A 2xx HTML page; links were extracted
    Success,
    /// Fetched fine but not an HTML page, so it was not parsed
    Skipped { content_type: String },
    /// The server answered with an error status
    HttpError { status: u16 },
    /// The fetch failed at the transport level, retries included
    FetchFailed { message: String },
}

/// One processed page
#[derive(Debug, Clone)]
pub struct PageResult {
    /// The page's URL after any redirects
    pub url: CanonicalUrl,
    /// URLs discovered on the page, in document order, both inside and
    /// outside the crawl's domain
    pub links: Vec<CanonicalUrl>,
    pub outcome: PageOutcome,
}

impl PageResult {
    pub fn is_success(&self) -> bool {
        self.outcome == PageOutcome::Success
    }
}

/// Stream of crawl results handed to the caller
///
/// Yields `Ok(PageResult)` for each processed page and at most one
/// final `Err` when the run aborts; after that (or after a clean
/// finish) the stream ends. Dropping it signals cancellation to every
/// worker of the run.
pub struct CrawlStream {
    inner: ReceiverStream<Result<PageResult, LinkmapError>>,
    _cancel_on_drop: DropGuard,
}

impl CrawlStream {
    pub(crate) fn new(
        rx: mpsc::Receiver<Result<PageResult, LinkmapError>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
            _cancel_on_drop: cancel.drop_guard(),
        }
    }

    /// The next result, or `None` once the crawl has fully settled
    pub async fn recv(&mut self) -> Option<Result<PageResult, LinkmapError>> {
        self.inner.next().await
    }
}

impl Stream for CrawlStream {
    type Item = Result<PageResult, LinkmapError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}
