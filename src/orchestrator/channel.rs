//! Async surface: a search running on a blocking task, feeding a bounded channel

use super::cancel::CancellationToken;
use super::stream::SearchState;
use super::{SearchOptions, SearchOrchestrator};
use crate::error::HoundError;
use crate::git::GitRepository;
use crate::types::{SearchMetrics, SearchQuery, SearchResult};
use futures::Stream;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const RECEIVER_DROPPED: &str = "receiver dropped";
const RECEIVER_FINISHED: &str = "receiver finished";

/// Final state of a search that ran on a background task
#[derive(Debug, Clone, Serialize)]
pub struct SearchSummary {
    pub state: SearchState,
    pub metrics: SearchMetrics,
    /// Repository error that ended the search, when `state` is `Failed`
    pub failure: Option<String>,
    pub cancel_reason: Option<String>,
}

/// Receiving end of a background search
///
/// Results arrive in the same order the synchronous stream yields them. The
/// channel is bounded, so a slow consumer pauses the search instead of letting
/// results pile up. Dropping the receiver cancels the search.
pub struct ResultReceiver {
    rx: mpsc::Receiver<SearchResult>,
    cancellation: CancellationToken,
    handle: Option<JoinHandle<Result<SearchSummary, HoundError>>>,
}

impl ResultReceiver {
    /// Next result, or `None` once the search has ended
    pub async fn recv(&mut self) -> Option<SearchResult> {
        self.rx.recv().await
    }

    pub fn cancel(&self, reason: impl Into<String>) {
        self.cancellation.cancel(reason);
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Wait for the search task and return its summary
    ///
    /// Results not yet received are discarded; if the search is still running
    /// it is cancelled first.
    pub async fn finish(mut self) -> Result<SearchSummary, HoundError> {
        if self.handle.as_ref().is_some_and(|h| !h.is_finished()) {
            self.cancellation.cancel(RECEIVER_FINISHED);
        }
        self.rx.close();
        while self.rx.recv().await.is_some() {}

        let handle = self
            .handle
            .take()
            .ok_or_else(|| HoundError::other("search task already joined"))?;
        handle
            .await
            .map_err(|e| HoundError::other(format!("Search task failed: {}", e)))?
    }

    /// Adapt into a `futures::Stream` of results
    pub fn into_stream(self) -> impl Stream<Item = SearchResult> {
        futures::stream::unfold(self, |mut receiver| async move {
            receiver.recv().await.map(|result| (result, receiver))
        })
    }
}

impl Drop for ResultReceiver {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle
            && !handle.is_finished()
        {
            self.cancellation.cancel(RECEIVER_DROPPED);
        }
    }
}

impl SearchOrchestrator {
    /// Run a search on tokio's blocking pool, streaming results over a bounded channel
    ///
    /// The repository is opened and the query validated on the blocking task;
    /// those errors are returned here, before any receiver exists. Requires a
    /// tokio runtime.
    pub async fn spawn_search(
        self: &Arc<Self>,
        repo_path: impl Into<PathBuf>,
        query: SearchQuery,
        mut options: SearchOptions,
    ) -> Result<ResultReceiver, HoundError> {
        let repo_path = repo_path.into();
        let cancellation = options.cancellation.get_or_insert_with(CancellationToken::new).clone();
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let (ready_tx, ready_rx) = oneshot::channel::<()>();

        let orchestrator = Arc::clone(self);
        let token = cancellation.clone();
        let handle = tokio::task::spawn_blocking(move || -> Result<SearchSummary, HoundError> {
            let repo = GitRepository::discover(&repo_path)?;
            // The stream borrows `repo`, so it is driven to completion on this thread.
            let mut stream = orchestrator.search(&repo, query, options)?;
            let _ = ready_tx.send(());

            for result in stream.by_ref() {
                if tx.blocking_send(result).is_err() && !token.is_cancelled() {
                    token.cancel(RECEIVER_DROPPED);
                }
            }

            Ok(SearchSummary {
                state: stream.state(),
                metrics: stream.metrics().clone(),
                failure: stream.failure().map(|e| e.to_string()),
                cancel_reason: token.reason().map(str::to_string),
            })
        });

        if ready_rx.await.is_err() {
            // The task ended before a stream existed: surface its error.
            return match handle.await {
                Ok(Err(e)) => Err(e),
                Ok(Ok(_)) => Err(HoundError::other("search ended before it started")),
                Err(e) => Err(HoundError::other(format!("Search task failed: {}", e))),
            };
        }

        Ok(ResultReceiver {
            rx,
            cancellation,
            handle: Some(handle),
        })
    }
}
