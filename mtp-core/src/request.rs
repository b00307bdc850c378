//! Serialized request envelopes.
//!
//! A request is kept as one word buffer laid out exactly like the plaintext
//! of an encrypted message:
//!
//! ```text
//! word 0..2  server salt
//! word 2..4  session id
//! word 4..6  message id
//! word 6     seq no
//! word 7     body length in bytes
//! word 8..   body, then padding
//! ```
//!
//! The structural queries below only look at these header words and are
//! safe on any buffer: one too short to hold a body answers `0` / `false`.

use mtp_crypto::random;
use mtp_tl_types::{Buffer, Prime, Serializable, TypeId, ids};

use crate::message::{MsgId, RequestId};

pub const MESSAGE_ID_POSITION: usize = 4;
pub const SEQ_NO_POSITION: usize = 6;
pub const MESSAGE_LENGTH_POSITION: usize = 7;
pub const MESSAGE_BODY_POSITION: usize = 8;

/// Whether a message with this leading constructor must be acknowledged
/// by the receiver. Service messages are not.
pub fn constructor_needs_ack(cons: TypeId) -> bool {
    !matches!(
        cons,
        ids::MSG_CONTAINER
            | ids::MSGS_ACK
            | ids::HTTP_WAIT
            | ids::BAD_MSG_NOTIFICATION
            | ids::MSGS_ALL_INFO
            | ids::MSGS_STATE_INFO
            | ids::MSG_DETAILED_INFO
            | ids::MSG_NEW_DETAILED_INFO
    )
}

/// Number of padding words for a body of `request_words` words.
///
/// `old` pads just to a 16-byte block. Otherwise at least 12 bytes are
/// added, and `extended` adds a random number (0..=15) of further blocks.
pub fn padding_words(request_words: usize, extended: bool, old: bool) -> usize {
    let rem = (MESSAGE_BODY_POSITION + request_words) & 3;
    let mut result = if rem != 0 { 4 - rem } else { 0 };
    if old {
        return result;
    }
    if result < 3 {
        result += 4;
    }
    if extended {
        result += usize::from(random::u8() & 0x0F) << 2;
    }
    result
}

/// One outgoing request: header words, body and padding, plus the
/// bookkeeping the connection needs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SerializedRequest {
    data: Buffer,
    /// Request this envelope belongs to, `0` for service messages.
    pub request_id: RequestId,
    /// Unix milliseconds of the last transmission, `0` if never sent.
    pub last_sent_time: i64,
}

impl SerializedRequest {
    /// An envelope with a zeroed header declaring a `size`-word body.
    ///
    /// The body itself is appended by the caller.
    pub fn prepare(size: usize) -> Self {
        let reserve = MESSAGE_BODY_POSITION + size + padding_words(size, false, false);
        let mut data = Vec::with_capacity(reserve);
        data.resize(MESSAGE_LENGTH_POSITION, 0);
        data.push((size << 2) as Prime);
        Self { data, request_id: 0, last_sent_time: 0 }
    }

    /// Serialize `value` as the body of a fresh envelope.
    pub fn serialize<T: Serializable + ?Sized>(value: &T) -> Self {
        let mut result = Self::prepare(value.serialized_len() / 4);
        value.serialize(&mut result.data);
        result
    }

    /// Build a `msg_container` body out of already numbered requests.
    pub fn container(inner: &[SerializedRequest]) -> Self {
        let inner: Vec<_> = inner.iter().filter(|r| r.has_body()).collect();
        let size = 2 + inner.iter().map(|r| r.message_size()).sum::<usize>();
        let mut result = Self::prepare(size);
        result.data.push(ids::MSG_CONTAINER as Prime);
        result.data.push(inner.len() as Prime);
        for request in inner {
            result.data.extend_from_slice(&request.data[MESSAGE_ID_POSITION..MESSAGE_BODY_POSITION]);
            request.write(&mut result.data);
        }
        result
    }

    /// The request-like wrap that remembers which message ids went out
    /// together in one container. Its time and seq no are both zero.
    pub fn sent_container(msg_ids: &[MsgId]) -> Self {
        let mut result = Self::prepare(msg_ids.len() * 2);
        for id in msg_ids {
            id.serialize(&mut result.data);
        }
        result
    }

    pub fn as_slice(&self) -> &[Prime] { &self.data }

    pub fn len(&self) -> usize { self.data.len() }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    fn has_body(&self) -> bool { self.data.len() > MESSAGE_BODY_POSITION }

    /// The body's leading constructor, if there is a body.
    pub fn body_constructor(&self) -> Option<TypeId> {
        self.data.get(MESSAGE_BODY_POSITION).map(|&p| p as TypeId)
    }

    pub fn set_msg_id(&mut self, msg_id: MsgId) {
        if self.data.len() < MESSAGE_BODY_POSITION {
            return;
        }
        self.data[MESSAGE_ID_POSITION] = (msg_id & 0xffff_ffff) as u32 as Prime;
        self.data[MESSAGE_ID_POSITION + 1] = (msg_id >> 32) as u32 as Prime;
    }

    pub fn msg_id(&self) -> MsgId {
        if self.data.len() < MESSAGE_BODY_POSITION {
            return 0;
        }
        let low = self.data[MESSAGE_ID_POSITION] as u32 as u64;
        let high = self.data[MESSAGE_ID_POSITION + 1] as u32 as u64;
        low | (high << 32)
    }

    pub fn set_seq_no(&mut self, seq_no: i32) {
        if self.data.len() < MESSAGE_BODY_POSITION {
            return;
        }
        self.data[SEQ_NO_POSITION] = seq_no;
    }

    pub fn seq_no(&self) -> i32 {
        self.data.get(SEQ_NO_POSITION).copied().unwrap_or(0)
    }

    /// Overwrite the salt and session words with random filler.
    pub fn randomize_header(&mut self) {
        if self.data.len() < MESSAGE_ID_POSITION {
            return;
        }
        let filler = random::words(MESSAGE_ID_POSITION);
        self.data[..MESSAGE_ID_POSITION].copy_from_slice(&filler);
    }

    /// Pad the body with random words, see [`padding_words`].
    ///
    /// Anything past the declared body is replaced.
    pub fn add_padding(&mut self, extended: bool, old: bool) {
        if self.data.len() < MESSAGE_BODY_POSITION {
            return;
        }
        let request_words = self.inner_length() >> 2;
        let full = MESSAGE_BODY_POSITION + request_words + padding_words(request_words, extended, old);
        let current = self.data.len();
        if current > full {
            self.data.truncate(full);
        } else if current < full {
            self.data.extend(random::words(full - current));
        }
    }

    /// Words this request occupies inside a container: message id, seq
    /// no, length and body.
    pub fn message_size(&self) -> usize {
        if !self.has_body() {
            return 0;
        }
        4 + (self.inner_length() >> 2)
    }

    /// Declared body length in bytes.
    pub fn inner_length(&self) -> usize {
        if !self.has_body() {
            return 0;
        }
        self.data[MESSAGE_LENGTH_POSITION] as u32 as usize
    }

    /// Append exactly the body words (no header, no padding) to `to`.
    pub fn write(&self, to: &mut Buffer) {
        if !self.has_body() {
            return;
        }
        let end = (MESSAGE_BODY_POSITION + (self.inner_length() >> 2)).min(self.data.len());
        to.extend_from_slice(&self.data[MESSAGE_BODY_POSITION..end]);
    }

    /// Whether this is the id wrap of a sent container rather than a
    /// real request.
    pub fn is_sent_container(&self) -> bool {
        self.has_body() && self.last_sent_time == 0 && self.seq_no() == 0
    }

    pub fn is_state_request(&self) -> bool {
        self.has_body() && self.body_constructor() == Some(ids::MSGS_STATE_REQ)
    }

    pub fn need_ack(&self) -> bool {
        self.body_constructor().is_some_and(constructor_needs_ack)
    }

    /// Message ids recorded by [`SerializedRequest::sent_container`].
    pub fn contained_msg_ids(&self) -> Vec<MsgId> {
        if !self.has_body() {
            return Vec::new();
        }
        self.data[MESSAGE_BODY_POSITION..]
            .chunks_exact(2)
            .map(|w| (w[0] as u32 as u64) | ((w[1] as u32 as u64) << 32))
            .collect()
    }

    /// Replace `old` with `new` in a sent-container wrap. Returns whether
    /// anything changed.
    pub fn replace_contained_msg_id(&mut self, old: MsgId, new: MsgId) -> bool {
        if !self.is_sent_container() {
            return false;
        }
        let mut changed = false;
        for pair in self.data[MESSAGE_BODY_POSITION..].chunks_exact_mut(2) {
            let id = (pair[0] as u32 as u64) | ((pair[1] as u32 as u64) << 32);
            if id == old {
                pair[0] = (new & 0xffff_ffff) as u32 as Prime;
                pair[1] = (new >> 32) as u32 as Prime;
                changed = true;
            }
        }
        changed
    }
}
