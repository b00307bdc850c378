//! Binding a temporary auth key to a persistent one.
//!
//! The client proves ownership of both keys by sending
//! `auth.bindTempAuthKey` over the temporary-key session, carrying a
//! `bind_auth_key_inner` encrypted MTProto 1.0 style under the persistent
//! key. Whatever the answer, the session to the DC is killed afterwards so
//! it is rebuilt on top of the new binding state.

use mtp_crypto::{AuthKey, AuthKeyPtr, Side};
use mtp_tl_types::mtproto::functions::auth::BindTempAuthKey;
use mtp_tl_types::mtproto::types::{BindAuthKeyInner, RpcError};
use mtp_tl_types::{Boxed, Bytes, Deserializable, Prime, ids, primes_to_bytes};

use crate::config::Config;
use crate::dc::ShiftedDcId;
use crate::instance::InstanceRef;
use crate::message::{MsgId, next_msg_id, unixtime};
use crate::request::{MESSAGE_BODY_POSITION, SerializedRequest};

/// Error the server answers when the persistent key is unknown to it.
const KEY_DESTROYED_ERROR: &str = "ENCRYPTED_MESSAGE_INVALID";

/// One bind attempt at a time for a persistent key on one DC.
#[derive(Debug)]
pub struct DcKeyChecker {
    config: Config,
    instance: InstanceRef,
    shifted_dc_id: ShiftedDcId,
    persistent_key: AuthKeyPtr,
    request_msg_id: MsgId,
}

impl DcKeyChecker {
    pub fn new(
        config: Config,
        instance: InstanceRef,
        shifted_dc_id: ShiftedDcId,
        persistent_key: AuthKeyPtr,
    ) -> Self {
        Self { config, instance, shifted_dc_id, persistent_key, request_msg_id: 0 }
    }

    /// Message id of the outstanding bind request, `0` when idle.
    pub fn awaiting_msg_id(&self) -> MsgId {
        self.request_msg_id
    }

    /// Build the bind request for `temporary_key` used by `session_id`.
    ///
    /// # Panics
    ///
    /// If a previous bind request is still awaiting its response.
    pub fn prepare_request(&mut self, temporary_key: &AuthKey, session_id: u64) -> SerializedRequest {
        assert_eq!(self.request_msg_id, 0, "a bind request is already outstanding");

        let nonce = mtp_crypto::random::u64();
        let msg_id = next_msg_id(self.config.time_offset);
        let expires_in = self.config.bind_key_expires_in.as_secs() as i64;
        let expires_at = (unixtime() + expires_in) as i32;

        let inner = BindAuthKeyInner {
            nonce,
            temp_auth_key_id: temporary_key.key_id(),
            perm_auth_key_id: self.persistent_key.key_id(),
            temp_session_id: session_id,
            expires_at,
        };
        let encrypted = encrypt_inner(&self.persistent_key, &inner, msg_id);

        let mut result = SerializedRequest::serialize(&Boxed(BindTempAuthKey {
            perm_auth_key_id: self.persistent_key.key_id(),
            nonce,
            expires_at,
            encrypted_message: Bytes::from(encrypted),
        }));
        result.set_msg_id(msg_id);

        self.request_msg_id = msg_id;
        tracing::debug!(
            "[mtp] bind request {msg_id} prepared for dc {}, key {}",
            self.shifted_dc_id,
            self.persistent_key.key_id()
        );
        result
    }

    /// Handle the reply to message `msg_id`. Returns `false`, touching
    /// nothing, unless it answers the outstanding bind request.
    pub fn handle_response(&mut self, msg_id: MsgId, reply: &[Prime]) -> bool {
        if self.request_msg_id == 0 || msg_id != self.request_msg_id {
            return false;
        }

        let destroyed = is_key_destroyed_reply(reply);
        let key_id = self.persistent_key.key_id();
        let dc = self.shifted_dc_id;
        if destroyed {
            tracing::info!("[mtp] persistent key {key_id} destroyed on server, dc {dc}");
        } else {
            tracing::info!("[mtp] bind result for key {key_id} received, dc {dc}");
        }

        self.persistent_key.set_last_check_time(unixtime());
        self.instance.with_instance(move |instance| {
            instance.kill_session(dc);
            if destroyed {
                instance.key_destroyed_on_server(dc, key_id);
            }
        });

        self.request_msg_id = 0;
        true
    }
}

fn is_key_destroyed_reply(reply: &[Prime]) -> bool {
    if reply.first().map(|&p| p as u32) != Some(ids::RPC_ERROR) {
        return false;
    }
    match Boxed::<RpcError>::from_primes(reply) {
        Ok(Boxed(err)) => err.error_code == 400 && &*err.error_message == KEY_DESTROYED_ERROR.as_bytes(),
        Err(e) => {
            tracing::warn!("[mtp] bind reply looked like rpc_error but did not parse: {e}");
            false
        }
    }
}

/// Serialize `inner` as a standalone message numbered `msg_id` and encrypt
/// it under `key`: `key_id || msg_key || aes_ige(message)`.
fn encrypt_inner(key: &AuthKey, inner: &BindAuthKeyInner, msg_id: MsgId) -> Vec<u8> {
    let mut message = SerializedRequest::serialize(&Boxed(inner.clone()));
    message.set_msg_id(msg_id);
    message.set_seq_no(0);
    message.add_padding(false, true);
    message.randomize_header();

    let unpadded = (MESSAGE_BODY_POSITION * 4) + message.inner_length();
    let plain = primes_to_bytes(message.as_slice());
    mtp_crypto::encrypt_oldmtp(key, &plain, unpadded, Side::Client)
}
