//! MTProto request layer.
//!
//! This crate handles:
//! * Request envelopes: header words, padding, containers ([`request`])
//! * The RPC error model and its retry classification ([`response`])
//! * Typed request submission from any thread ([`ConcurrentSender`])
//! * Binding temporary auth keys to persistent ones ([`DcKeyChecker`])
//!
//! Actual delivery is left to an [`Instance`]: bring your own sessions and
//! sockets.

#![deny(unsafe_code)]

pub mod concurrent_sender;
pub mod config;
pub mod dc;
pub mod dc_key_checker;
pub mod instance;
pub mod message;
pub mod request;
pub mod response;
pub mod runner;

pub use concurrent_sender::{ConcurrentSender, FailSkipPolicy, PendingReply, RequestBuilder};
pub use config::Config;
pub use dc::{DcId, ShiftedDcId};
pub use dc_key_checker::DcKeyChecker;
pub use instance::{Instance, InstanceRef, ResponseHandler};
pub use message::{MsgId, RequestId};
pub use request::SerializedRequest;
pub use response::{Response, RpcError};
pub use runner::{Runner, Task, TaskQueue};
