//! The seam to the connection layer.

use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::dc::ShiftedDcId;
use crate::message::RequestId;
use crate::request::SerializedRequest;
use crate::response::{Response, RpcError};
use crate::runner::Runner;

/// Called with a successful reply. Returns whether it was handled.
pub type DoneHandler = Box<dyn FnMut(&Response) -> bool + Send>;

/// Called with a failure. Returning `false` leaves the error to the
/// instance's default handling (retry, backoff).
pub type FailHandler = Box<dyn FnMut(&RpcError, &Response) -> bool + Send>;

/// The pair of handlers attached to one sent request.
pub struct ResponseHandler {
    pub done: DoneHandler,
    pub fail: FailHandler,
}

impl std::fmt::Debug for ResponseHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ResponseHandler")
    }
}

/// Whatever actually delivers requests to data centers: sessions, sockets,
/// transport encryption and network-level retries.
///
/// Methods are called on the instance's own runner.
pub trait Instance: Send + Sync {
    /// Transmit `request` to `dc`, possibly held back up to `can_wait`
    /// for batching, and not before `after` has completed.
    fn send_serialized(
        &self,
        request_id: RequestId,
        request: SerializedRequest,
        handler: ResponseHandler,
        dc: ShiftedDcId,
        can_wait: Duration,
        after: Option<RequestId>,
    );

    /// Stop transmitting `request_id` and forget its handlers.
    fn cancel(&self, request_id: RequestId);

    /// Drop the session to `dc` so it is re-established from scratch.
    fn kill_session(&self, dc: ShiftedDcId);

    /// The server no longer knows persistent key `key_id` for `dc`.
    fn key_destroyed_on_server(&self, dc: ShiftedDcId, key_id: u64);
}

/// Non-owning handle to an [`Instance`] together with the runner of the
/// thread it lives on.
#[derive(Clone)]
pub struct InstanceRef {
    instance: Weak<dyn Instance>,
    runner: Runner,
}

impl InstanceRef {
    pub fn new<I: Instance + 'static>(instance: &Arc<I>, runner: Runner) -> Self {
        let weak: Weak<I> = Arc::downgrade(instance);
        Self { instance: weak, runner }
    }

    /// Post `f` to the instance's runner. It is silently skipped if the
    /// instance is gone by the time it runs.
    pub fn with_instance(&self, f: impl FnOnce(&dyn Instance) + Send + 'static) {
        let weak = self.instance.clone();
        self.runner.post(move || match weak.upgrade() {
            Some(instance) => f(&*instance),
            None => tracing::trace!("[mtp] instance gone, dropping call"),
        });
    }

    pub fn is_alive(&self) -> bool {
        self.instance.strong_count() > 0
    }
}

impl std::fmt::Debug for InstanceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceRef").field("alive", &self.is_alive()).finish()
    }
}
