//! Typed request submission from any thread.
//!
//! [`ConcurrentSender`] serializes a typed call, registers the caller's
//! `done` / `fail` closures under a fresh request id, and hands the envelope
//! to the [`Instance`](crate::Instance) on the instance's runner. Replies
//! come back through handlers that hold only a weak reference to the
//! sender; they re-enter it on the sender's runner, where the closures run.
//!
//! ```rust,no_run
//! # use mtp_core::ConcurrentSender;
//! # use mtp_tl_types::mtproto::functions::Ping;
//! # fn demo(sender: &ConcurrentSender) {
//! let id = sender
//!     .request(Ping { ping_id: 1 })
//!     .to_dc(2)
//!     .done(|pong| println!("pong for {}", pong.ping_id))
//!     .fail(|err| eprintln!("ping failed: {err}"))
//!     .send();
//! sender.sent(id).cancel();
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use mtp_tl_types::{Boxed, Deserializable, RemoteCall, deserialize};
use tokio::sync::oneshot;

use crate::dc::ShiftedDcId;
use crate::instance::{DoneHandler, FailHandler, InstanceRef, ResponseHandler};
use crate::message::{RequestId, next_request_id};
use crate::request::SerializedRequest;
use crate::response::{Response, RpcError};
use crate::runner::Runner;

/// Which failures reach the caller's `fail` closure. The rest are left to
/// the instance's default handling and never reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailSkipPolicy {
    /// Skip every default-handled (temporary or flood) error.
    #[default]
    Simple,
    /// Report flood errors; skip the other default-handled ones.
    HandleFlood,
    /// Report everything.
    HandleAll,
}

impl FailSkipPolicy {
    fn skips(self, error: &RpcError) -> bool {
        match self {
            Self::Simple => error.is_default_handled(),
            Self::HandleFlood => error.is_default_handled() && !error.is_flood(),
            Self::HandleAll => false,
        }
    }
}

type DoneCallback = Box<dyn FnOnce(RequestId, &Response) -> deserialize::Result<()> + Send>;
type FailCallback = Box<dyn FnOnce(RequestId, RpcError) + Send>;

struct Handlers {
    done: DoneCallback,
    fail: FailCallback,
}

struct SenderInner {
    instance: InstanceRef,
    runner: Runner,
    requests: Mutex<HashMap<RequestId, Handlers>>,
}

impl SenderInner {
    fn requests(&self) -> MutexGuard<'_, HashMap<RequestId, Handlers>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn register(&self, id: RequestId, handlers: Handlers) {
        let previous = self.requests().insert(id, handlers);
        assert!(previous.is_none(), "request id {id} registered twice");
    }

    fn take(&self, id: RequestId) -> Option<Handlers> {
        self.requests().remove(&id)
    }

    fn request_done(&self, id: RequestId, response: &Response) {
        let Some(handlers) = self.take(id) else {
            tracing::trace!("[mtp] reply for request {id} arrived after it was dropped");
            return;
        };
        tracing::debug!("[mtp] request {id} done");
        if let Err(e) = (handlers.done)(id, response) {
            tracing::warn!("[mtp] request {id}: reply parse failed: {e}");
            tracing::trace!("[mtp] reply: {}", mtp_tl_types::dump::dump_lossy(&response.reply));
            let error = RpcError::local("RESPONSE_PARSE_FAILED", "ConcurrentSender::request_done");
            (handlers.fail)(id, error);
        }
    }

    fn request_fail(&self, id: RequestId, error: RpcError) {
        let Some(handlers) = self.take(id) else {
            return;
        };
        tracing::debug!("[mtp] request {id} failed: {error}");
        (handlers.fail)(id, error);
    }
}

/// Wrap the sender's bookkeeping into the handler pair the instance calls.
/// Outcomes are routed to `id` whatever the instance puts in the response.
fn make_response_handler(
    id: RequestId,
    sender: Weak<SenderInner>,
    runner: Runner,
    policy: FailSkipPolicy,
) -> ResponseHandler {
    let done: DoneHandler = {
        let sender = sender.clone();
        let runner = runner.clone();
        Box::new(move |response: &Response| {
            let sender = sender.clone();
            let response = response.clone();
            runner.post(move || {
                if let Some(strong) = sender.upgrade() {
                    strong.request_done(id, &response);
                }
            });
            true
        })
    };
    let fail: FailHandler = Box::new(move |error: &RpcError, _response: &Response| {
        if policy.skips(error) {
            return false;
        }
        let sender = sender.clone();
        let error = error.clone();
        runner.post(move || {
            if let Some(strong) = sender.upgrade() {
                strong.request_fail(id, error);
            }
        });
        true
    });
    ResponseHandler { done, fail }
}

// ─── ConcurrentSender ─────────────────────────────────────────────────────────

/// Thread-safe request façade over one connection instance.
///
/// Dropping the sender cancels every request still outstanding; replies
/// that race with the drop find nothing to call.
pub struct ConcurrentSender {
    inner: Arc<SenderInner>,
}

impl ConcurrentSender {
    /// `runner` is where completion closures run.
    pub fn new(instance: InstanceRef, runner: Runner) -> Self {
        Self {
            inner: Arc::new(SenderInner { instance, runner, requests: Mutex::new(HashMap::new()) }),
        }
    }

    /// Start building a request for `call`.
    pub fn request<R: RemoteCall>(&self, call: R) -> RequestBuilder<'_, R> {
        RequestBuilder {
            sender: self,
            serialized: SerializedRequest::serialize(&Boxed(call)),
            dc: 0,
            can_wait: Duration::ZERO,
            after: None,
            policy: FailSkipPolicy::default(),
            done: None,
            fail: None,
            _call: std::marker::PhantomData,
        }
    }

    /// Handle to a request already sent.
    pub fn sent(&self, request_id: RequestId) -> SentRequestWrap<'_> {
        SentRequestWrap { sender: self, request_id }
    }

    /// Number of requests whose handlers are still registered.
    pub fn pending_count(&self) -> usize {
        self.inner.requests().len()
    }

    fn detach(&self, id: RequestId) {
        if self.inner.take(id).is_some() {
            tracing::debug!("[mtp] request {id} detached");
        }
    }

    fn cancel(&self, id: RequestId) {
        self.detach(id);
        self.inner.instance.with_instance(move |instance| instance.cancel(id));
    }
}

impl Drop for ConcurrentSender {
    fn drop(&mut self) {
        let ids: Vec<_> = self.inner.requests().drain().map(|(id, _)| id).collect();
        if ids.is_empty() {
            return;
        }
        tracing::debug!("[mtp] sender dropped, cancelling {} requests", ids.len());
        self.inner.instance.with_instance(move |instance| {
            for id in ids {
                instance.cancel(id);
            }
        });
    }
}

impl std::fmt::Debug for ConcurrentSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentSender").field("pending", &self.pending_count()).finish()
    }
}

/// Returned by [`ConcurrentSender::sent`].
pub struct SentRequestWrap<'a> {
    sender: &'a ConcurrentSender,
    request_id: RequestId,
}

impl SentRequestWrap<'_> {
    /// Drop the handlers and tell the instance to stop. A no-op for
    /// requests that already completed.
    pub fn cancel(self) {
        self.sender.cancel(self.request_id);
    }

    /// Drop the handlers but let the request itself run its course.
    pub fn detach(self) {
        self.sender.detach(self.request_id);
    }
}

// ─── RequestBuilder ───────────────────────────────────────────────────────────

/// Options for one request; finished with [`RequestBuilder::send`].
#[must_use = "a request is only sent by calling `send`"]
pub struct RequestBuilder<'a, R: RemoteCall> {
    sender: &'a ConcurrentSender,
    serialized: SerializedRequest,
    dc: ShiftedDcId,
    can_wait: Duration,
    after: Option<RequestId>,
    policy: FailSkipPolicy,
    done: Option<Box<dyn FnOnce(R::Return, RequestId) + Send>>,
    fail: Option<Box<dyn FnOnce(RpcError, RequestId) + Send>>,
    _call: std::marker::PhantomData<fn(R)>,
}

impl<'a, R: RemoteCall> RequestBuilder<'a, R>
where
    R::Return: Send + 'static,
{
    /// Target data center; `0` means the main one.
    pub fn to_dc(mut self, dc: ShiftedDcId) -> Self {
        self.dc = dc;
        self
    }

    /// Allow the instance to hold the request back this long to batch it.
    pub fn after_delay(mut self, can_wait: Duration) -> Self {
        self.can_wait = can_wait;
        self
    }

    /// Do not transmit before `request_id` has completed.
    pub fn after_request(mut self, request_id: RequestId) -> Self {
        self.after = Some(request_id);
        self
    }

    pub fn handle_flood_errors(mut self) -> Self {
        self.policy = FailSkipPolicy::HandleFlood;
        self
    }

    pub fn handle_all_errors(mut self) -> Self {
        self.policy = FailSkipPolicy::HandleAll;
        self
    }

    pub fn done(self, f: impl FnOnce(R::Return) + Send + 'static) -> Self {
        self.done_with_id(move |result, _| f(result))
    }

    pub fn done_with_id(mut self, f: impl FnOnce(R::Return, RequestId) + Send + 'static) -> Self {
        self.done = Some(Box::new(f));
        self
    }

    pub fn fail(self, f: impl FnOnce(RpcError) + Send + 'static) -> Self {
        self.fail_with_id(move |error, _| f(error))
    }

    pub fn fail_with_id(mut self, f: impl FnOnce(RpcError, RequestId) + Send + 'static) -> Self {
        self.fail = Some(Box::new(f));
        self
    }

    /// Register the handlers and post the request to the instance.
    pub fn send(self) -> RequestId {
        let id = next_request_id();
        let sender = self.sender;

        let done: DoneCallback = match self.done {
            Some(done) => Box::new(move |id, response: &Response| {
                let result = Boxed::<R::Return>::from_primes(&response.reply)?;
                done(result.into_inner(), id);
                Ok(())
            }),
            None => Box::new(|_, _| Ok(())),
        };
        let fail: FailCallback = match self.fail {
            Some(fail) => Box::new(move |id, error| fail(error, id)),
            None => Box::new(|id, error| {
                tracing::debug!("[mtp] request {id} failed with no handler: {error}");
            }),
        };
        sender.inner.register(id, Handlers { done, fail });

        let handler = make_response_handler(
            id,
            Arc::downgrade(&sender.inner),
            sender.inner.runner.clone(),
            self.policy,
        );
        let (request, dc, can_wait, after) = (self.serialized, self.dc, self.can_wait, self.after);
        tracing::debug!("[mtp] request {id} registered for dc {dc}");
        sender.inner.instance.with_instance(move |instance| {
            instance.send_serialized(id, request, handler, dc, can_wait, after);
        });
        id
    }

    /// Send, delivering the outcome through the returned future instead of
    /// closures. Any `done` / `fail` set before are replaced.
    pub fn send_awaitable(self) -> PendingReply<R::Return> {
        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let on_fail = Arc::clone(&tx);
        let request_id = self
            .done(move |result| {
                if let Some(tx) = tx.lock().unwrap_or_else(|e| e.into_inner()).take() {
                    let _ = tx.send(Ok(result));
                }
            })
            .fail(move |error| {
                if let Some(tx) = on_fail.lock().unwrap_or_else(|e| e.into_inner()).take() {
                    let _ = tx.send(Err(error));
                }
            })
            .send();
        PendingReply { request_id, rx }
    }
}

/// Future returned by [`RequestBuilder::send_awaitable`].
///
/// Resolves to a local `REQUEST_DROPPED` error if the request is cancelled,
/// detached or the sender is dropped first.
pub struct PendingReply<T> {
    request_id: RequestId,
    rx: oneshot::Receiver<Result<T, RpcError>>,
}

impl<T> PendingReply<T> {
    pub fn request_id(&self) -> RequestId { self.request_id }
}

impl<T> Future for PendingReply<T> {
    type Output = Result<T, RpcError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| Err(RpcError::local("REQUEST_DROPPED", "handlers dropped")))
        })
    }
}
