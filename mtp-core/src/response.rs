//! Replies and the RPC error model.

use std::fmt;

use mtp_tl_types::mtproto::types;
use mtp_tl_types::{Boxed, Buffer, Deserializable, Prime};

use crate::message::{MsgId, RequestId};

/// The raw reply to one request, as delivered by the connection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response {
    /// The boxed result value.
    pub reply: Buffer,
    /// Message id of the message the reply arrived in.
    pub outer_msg_id: MsgId,
    pub request_id: RequestId,
}

/// Type prefixes of flood-wait errors; the suffix is the wait in seconds.
pub const FLOOD_PREFIXES: [&str; 2] = ["FLOOD_WAIT_", "FLOOD_PREMIUM_WAIT_"];

const LOCAL_PREFIX: &str = "CLIENT_";

// ─── RpcError ─────────────────────────────────────────────────────────────────

/// An error answered by the server, or synthesized locally.
///
/// Server messages follow `TYPE` or `TYPE: description`, where `TYPE` is
/// made of `A-Z`, `0-9` and `_`. Messages that don't are coerced:
///
/// * code `< 0` or `>= 500` → `INTERNAL_SERVER_ERROR`, raw text as description
/// * otherwise → `CLIENT_BAD_RPC_ERROR`
///
/// Locally synthesized errors have code `0` and a `CLIENT_` type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcError {
    code: i32,
    kind: String,
    description: String,
}

fn split_message(message: &str) -> Option<(&str, &str)> {
    let (kind, rest) = match message.find(':') {
        Some(idx) => message.split_at(idx),
        None => (message, ""),
    };
    let valid_kind = !kind.is_empty()
        && kind.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
    if !valid_kind {
        return None;
    }
    if rest.is_empty() {
        return Some((kind, ""));
    }
    rest.strip_prefix(": ").map(|description| (kind, description))
}

impl RpcError {
    /// Classify a server `rpc_error`.
    pub fn new(code: i32, message: &str) -> Self {
        if let Some((kind, description)) = split_message(message) {
            return Self { code, kind: kind.into(), description: description.into() };
        }
        if code < 0 || code >= 500 {
            Self { code, kind: "INTERNAL_SERVER_ERROR".into(), description: message.into() }
        } else {
            Self {
                code,
                kind: format!("{LOCAL_PREFIX}BAD_RPC_ERROR"),
                description: format!("Bad rpc error received, text = '{message}'"),
            }
        }
    }

    /// A client-side error of type `CLIENT_<kind>`.
    pub fn local(kind: &str, description: impl Into<String>) -> Self {
        Self { code: 0, kind: format!("{LOCAL_PREFIX}{kind}"), description: description.into() }
    }

    /// Parse `reply` as a boxed `rpc_error`; anything else becomes a local
    /// `RESPONSE_PARSE_FAILED` error.
    pub fn from_reply(reply: &[Prime]) -> Self {
        match Boxed::<types::RpcError>::from_primes(reply) {
            Ok(Boxed(err)) => Self::from(&err),
            Err(e) => Self::local("RESPONSE_PARSE_FAILED", format!("Error parse failed: {e}")),
        }
    }

    pub fn code(&self) -> i32 { self.code }

    /// The error type, e.g. `FLOOD_WAIT_30`.
    pub fn kind(&self) -> &str { &self.kind }

    pub fn description(&self) -> &str { &self.description }

    pub fn is_local(&self) -> bool {
        self.code == 0 && self.kind.starts_with(LOCAL_PREFIX)
    }

    pub fn is_flood(&self) -> bool {
        FLOOD_PREFIXES.iter().any(|p| self.kind.starts_with(p))
    }

    /// The same request may succeed later without changes.
    pub fn is_temporary(&self) -> bool {
        self.code < 0 || self.code >= 500 || self.is_flood()
    }

    /// Errors handled by default retry logic unless the caller opts out.
    pub fn is_default_handled(&self) -> bool {
        self.is_temporary()
    }

    /// Wait in seconds carried by a flood error.
    pub fn flood_wait_seconds(&self) -> Option<u64> {
        FLOOD_PREFIXES
            .iter()
            .find_map(|p| self.kind.strip_prefix(p))
            .and_then(|secs| secs.parse().ok())
    }

    /// Match the error type, with an optional `*` wildcard at either end.
    ///
    /// - `err.is("AUTH_KEY_UNREGISTERED")`: exact match
    /// - `err.is("FLOOD_WAIT_*")`: starts-with match
    /// - `err.is("*_INVALID")`: ends-with match
    pub fn is(&self, pattern: &str) -> bool {
        if let Some(prefix) = pattern.strip_suffix('*') {
            self.kind.starts_with(prefix)
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            self.kind.ends_with(suffix)
        } else {
            self.kind == pattern
        }
    }
}

impl From<&types::RpcError> for RpcError {
    fn from(err: &types::RpcError) -> Self {
        Self::new(err.error_code, &err.error_message.to_string_lossy())
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RPC {}: {}", self.code, self.kind)?;
        if !self.description.is_empty() {
            write!(f, " ({})", self.description)?;
        }
        Ok(())
    }
}

impl std::error::Error for RpcError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_requires_space_after_colon() {
        assert_eq!(split_message("A_B: c"), Some(("A_B", "c")));
        assert_eq!(split_message("A_B:c"), None);
        assert_eq!(split_message("A_B: "), Some(("A_B", "")));
        assert_eq!(split_message(""), None);
        assert_eq!(split_message("lower"), None);
    }
}
