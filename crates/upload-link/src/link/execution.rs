//! Running a prepared request.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use futures_util::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::graphql::{Context, GraphQLResponse};
use crate::http::{
    AbortController, Fetch, FetchBody, FetchOptions, parse_and_check_http_response,
};
use crate::multipart::{EncodedBody, materialize};

/// Lifecycle of an execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionState {
    /// Prepared, not yet subscribed.
    Created,
    /// Waiting for deferred uploads to be drained.
    AwaitingMaterialization,
    /// The transport call is in progress.
    InFlight,
    /// A result was delivered.
    Completed,
    /// An error was delivered.
    Errored,
    /// Cancelled by the subscriber.
    Cancelled,
}

impl ExecutionState {
    /// Whether no further transitions can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored | Self::Cancelled)
    }
}

/// Cancels an execution from anywhere.
#[derive(Clone)]
pub struct CancelHandle {
    controller: AbortController,
    state: Arc<Mutex<ExecutionState>>,
}

impl CancelHandle {
    fn new() -> Self {
        Self {
            controller: AbortController::new(),
            state: Arc::new(Mutex::new(ExecutionState::Created)),
        }
    }

    /// Cancel the execution.
    ///
    /// Trips the abort signal handed to the transport and stops any further
    /// delivery. Returns `true` only for the first call.
    pub fn cancel(&self) -> bool {
        let fired = self.controller.abort();
        if fired {
            let mut state = self.state.lock();
            if !state.is_terminal() {
                *state = ExecutionState::Cancelled;
                tracing::debug!(target: "upload_link::link", "execution cancelled");
            }
        }
        fired
    }

    /// Whether the execution was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.controller.is_aborted()
    }

    /// The current state.
    pub fn state(&self) -> ExecutionState {
        *self.state.lock()
    }

    fn advance(&self, next: ExecutionState) {
        let mut state = self.state.lock();
        let current = *state;
        if !current.is_terminal() {
            tracing::debug!(target: "upload_link::link", from = ?current, to = ?next, "execution state");
            *state = next;
        }
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .field("state", &self.state())
            .finish()
    }
}

/// A request that has been prepared but not sent.
///
/// Nothing touches the network until [`subscribe`](Self::subscribe) is
/// called. Subscribing consumes the execution; to send the operation again,
/// execute it again.
pub struct Execution {
    pub(super) uri: String,
    pub(super) options: FetchOptions,
    pub(super) body: EncodedBody,
    pub(super) fetch: Arc<dyn Fetch>,
    pub(super) context: Context,
    pub(super) operation_name: Option<String>,
}

impl Execution {
    /// The endpoint the request will be sent to.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The merged transport options. The body is attached on subscribe.
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Whether the request will be sent as multipart.
    pub fn is_multipart(&self) -> bool {
        self.body.is_multipart()
    }

    /// The operation's context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Start the request on the tokio runtime.
    ///
    /// Subscribing consumes the execution because stream uploads can only
    /// be read once. To run the whole sequence again (extraction,
    /// materialization and the network call), pass a fresh [`Operation`]
    /// to [`UploadLink::execute`](super::UploadLink::execute).
    ///
    /// [`Operation`]: crate::graphql::Operation
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn subscribe(self) -> UploadSubscription {
        let (tx, receiver) = mpsc::channel(4);
        let handle = CancelHandle::new();
        tokio::spawn(run(self, handle.clone(), tx));
        UploadSubscription { receiver, handle }
    }
}

impl fmt::Debug for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("uri", &self.uri)
            .field("options", &self.options)
            .field("body", &self.body)
            .field("operation_name", &self.operation_name)
            .finish_non_exhaustive()
    }
}

struct Emitter {
    tx: mpsc::Sender<Result<GraphQLResponse>>,
    handle: CancelHandle,
}

impl Emitter {
    async fn emit(&self, item: Result<GraphQLResponse>) {
        if self.handle.is_cancelled() {
            return;
        }
        let _ = self.tx.send(item).await;
    }

    fn finish(&self, state: ExecutionState) {
        if self.handle.is_cancelled() {
            self.handle.advance(ExecutionState::Cancelled);
        } else {
            self.handle.advance(state);
        }
    }
}

async fn run(execution: Execution, handle: CancelHandle, tx: mpsc::Sender<Result<GraphQLResponse>>) {
    let Execution {
        uri,
        mut options,
        body,
        fetch,
        context,
        operation_name,
    } = execution;
    let emitter = Emitter { tx, handle };

    options.body = match body {
        EncodedBody::Json(payload) => FetchBody::Text(payload),
        EncodedBody::Multipart(pending) => {
            emitter.handle.advance(ExecutionState::AwaitingMaterialization);
            match materialize(pending).await {
                Ok(form) => FetchBody::Form(form),
                Err(e) => {
                    tracing::debug!(target: "upload_link::link", error = %e, "upload materialization failed");
                    emitter.emit(Err(e)).await;
                    emitter.finish(ExecutionState::Errored);
                    return;
                }
            }
        }
    };

    if emitter.handle.is_cancelled() {
        emitter.finish(ExecutionState::Cancelled);
        return;
    }

    if fetch.supports_abort() {
        options.signal = Some(emitter.handle.controller.signal());
    }

    emitter.handle.advance(ExecutionState::InFlight);
    tracing::debug!(target: "upload_link::link", uri = %uri, "sending request");

    let result = fetch.fetch(uri, options).await.and_then(|response| {
        context.set(|data| data.response = Some(response.info()));
        parse_and_check_http_response(operation_name.as_deref(), &response)
    });

    match result {
        Ok(response) => {
            emitter.emit(Ok(response)).await;
            emitter.finish(ExecutionState::Completed);
        }
        Err(e) if e.is_abort() => {
            tracing::debug!(target: "upload_link::link", "request aborted");
            emitter.finish(ExecutionState::Cancelled);
        }
        Err(e) => {
            if let Some(partial) = e.partial_result().cloned() {
                emitter.emit(Ok(partial)).await;
            }
            emitter.emit(Err(e)).await;
            emitter.finish(ExecutionState::Errored);
        }
    }
}

/// The results of a subscribed [`Execution`].
///
/// Yields at most one successful result, possibly followed by an error when
/// the server sent a partial result. Dropping the subscription cancels it.
pub struct UploadSubscription {
    receiver: mpsc::Receiver<Result<GraphQLResponse>>,
    handle: CancelHandle,
}

impl UploadSubscription {
    /// Get the next result. Returns `None` once the execution has finished
    /// or was cancelled.
    pub async fn next(&mut self) -> Option<Result<GraphQLResponse>> {
        if self.handle.is_cancelled() {
            return None;
        }
        let item = self.receiver.recv().await?;
        if self.handle.is_cancelled() {
            return None;
        }
        Some(item)
    }

    /// Cancel the execution. Returns `true` only for the first call.
    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    /// A handle that can cancel the execution from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    /// The current state.
    pub fn state(&self) -> ExecutionState {
        self.handle.state()
    }
}

impl Stream for UploadSubscription {
    type Item = Result<GraphQLResponse>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.handle.is_cancelled() {
            return Poll::Ready(None);
        }
        match this.receiver.poll_recv(cx) {
            Poll::Ready(Some(_)) if this.handle.is_cancelled() => Poll::Ready(None),
            other => other,
        }
    }
}

impl fmt::Debug for UploadSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSubscription")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Drop for UploadSubscription {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}
