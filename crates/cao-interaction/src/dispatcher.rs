//! Background completion dispatch.
//!
//! One request at a time runs on a spawned tokio task. The task writes its
//! outcome once into a oneshot slot; the foreground polls that slot without
//! blocking, so it can keep animating and watch for Ctrl-C.

use std::sync::Arc;

use cao_core::error::{CaoError, Result};
use cao_core::message::Message;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::completion_client::CompletionClient;
use crate::response::strip_think_block;

/// Outcome of one dispatch as seen by the foreground.
///
/// While `done` is false both fields are unset. Once done, exactly one of
/// `text` and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DispatchResult {
    pub text: Option<String>,
    pub error: Option<String>,
    pub done: bool,
}

impl DispatchResult {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn completed(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            error: None,
            done: true,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            text: None,
            error: Some(error.into()),
            done: true,
        }
    }
}

struct InFlight {
    slot: oneshot::Receiver<DispatchResult>,
    worker: JoinHandle<()>,
}

/// Runs completions on a background task, one at a time.
pub struct Dispatcher {
    client: Arc<dyn CompletionClient>,
    in_flight: Option<InFlight>,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            in_flight: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Starts completing `snapshot` on a background task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `CaoError::Internal` if a dispatch is already in flight.
    pub fn dispatch(&mut self, snapshot: Vec<Message>) -> Result<()> {
        if self.is_busy() {
            return Err(CaoError::internal("a completion is already in flight"));
        }

        let (tx, rx) = oneshot::channel();
        let client = Arc::clone(&self.client);
        debug!(messages = snapshot.len(), "Dispatching completion");

        let worker = tokio::spawn(async move {
            let result = match client.complete(snapshot).await {
                Ok(raw) => DispatchResult::completed(strip_think_block(&raw)),
                Err(err) => {
                    warn!("Completion failed: {}", err);
                    DispatchResult::failed(err.to_string())
                }
            };
            // The receiver is gone when the dispatch was abandoned.
            let _ = tx.send(result);
        });

        self.in_flight = Some(InFlight { slot: rx, worker });
        Ok(())
    }

    /// Checks the result slot without blocking.
    ///
    /// Returns a pending result while the worker runs. A finished result
    /// frees the dispatcher for the next request.
    pub fn poll(&mut self) -> DispatchResult {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return DispatchResult::failed("no completion in flight");
        };

        let result = match in_flight.slot.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return DispatchResult::pending(),
            Err(TryRecvError::Closed) => DispatchResult::failed("completion worker stopped unexpectedly"),
        };

        self.in_flight = None;
        debug!(ok = result.text.is_some(), "Completion finished");
        result
    }

    /// Waits for the in-flight dispatch to finish.
    pub async fn wait(&mut self) -> DispatchResult {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return DispatchResult::failed("no completion in flight");
        };

        let result = (&mut in_flight.slot)
            .await
            .unwrap_or_else(|_| DispatchResult::failed("completion worker stopped unexpectedly"));
        self.in_flight = None;
        result
    }

    /// Drops the in-flight dispatch without waiting for it.
    pub fn abandon(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.worker.abort();
            debug!("Abandoned in-flight completion");
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.abandon();
    }
}
