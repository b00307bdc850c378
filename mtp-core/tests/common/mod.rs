#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mtp_core::{Instance, InstanceRef, RequestId, ResponseHandler, Runner, SerializedRequest, ShiftedDcId};

/// One `send_serialized` call as the instance saw it.
pub struct Sent {
    pub request_id: RequestId,
    pub request: SerializedRequest,
    pub handler: ResponseHandler,
    pub dc: ShiftedDcId,
    pub can_wait: Duration,
    pub after: Option<RequestId>,
}

/// An instance that records every call and delivers nothing.
#[derive(Default)]
pub struct RecordingInstance {
    pub sent: Mutex<Vec<Sent>>,
    pub cancelled: Mutex<Vec<RequestId>>,
    pub killed: Mutex<Vec<ShiftedDcId>>,
    pub destroyed: Mutex<Vec<(ShiftedDcId, u64)>>,
}

impl RecordingInstance {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take_sent(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn cancelled(&self) -> Vec<RequestId> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl Instance for RecordingInstance {
    fn send_serialized(
        &self,
        request_id: RequestId,
        request: SerializedRequest,
        handler: ResponseHandler,
        dc: ShiftedDcId,
        can_wait: Duration,
        after: Option<RequestId>,
    ) {
        self.sent.lock().unwrap().push(Sent { request_id, request, handler, dc, can_wait, after });
    }

    fn cancel(&self, request_id: RequestId) {
        self.cancelled.lock().unwrap().push(request_id);
    }

    fn kill_session(&self, dc: ShiftedDcId) {
        self.killed.lock().unwrap().push(dc);
    }

    fn key_destroyed_on_server(&self, dc: ShiftedDcId, key_id: u64) {
        self.destroyed.lock().unwrap().push((dc, key_id));
    }
}

/// A recording instance reached through an immediate runner.
pub fn immediate_instance() -> (Arc<RecordingInstance>, InstanceRef) {
    let instance = RecordingInstance::new();
    let reference = InstanceRef::new(&instance, Runner::immediate());
    (instance, reference)
}
