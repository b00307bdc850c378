//! Cryptographic primitives for the MTProto request layer.
//!
//! Provides:
//! - AES-256-IGE encryption/decryption
//! - the `sha1!` hash macro
//! - `AuthKey`, the 256-byte authorization key
//! - MTProto 1.0 message encryption / decryption
//! - random fill helpers

#![deny(unsafe_code)]

pub mod aes;
mod auth_key;
pub mod random;
mod sha;

pub use auth_key::{AuthKey, AuthKeyPtr};

#[doc(hidden)]
pub mod __private {
    pub use sha1;
}

// ─── MTProto 1.0 encrypt / decrypt ───────────────────────────────────────────

/// Errors from [`decrypt_oldmtp`].
#[derive(Clone, Debug, PartialEq)]
pub enum DecryptError {
    /// Ciphertext too short or not block-aligned.
    InvalidBuffer,
    /// The `auth_key_id` in the ciphertext does not match our key.
    AuthKeyMismatch,
    /// The declared message length does not fit in the plaintext.
    InvalidLength,
    /// The `msg_key` in the ciphertext does not match our computed value.
    MessageKeyMismatch,
}

impl std::fmt::Display for DecryptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBuffer => write!(f, "invalid ciphertext buffer length"),
            Self::AuthKeyMismatch => write!(f, "auth_key_id mismatch"),
            Self::InvalidLength => write!(f, "message length out of bounds"),
            Self::MessageKeyMismatch => write!(f, "msg_key mismatch"),
        }
    }
}
impl std::error::Error for DecryptError {}

/// Which party produced a message; selects the key half used for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Client,
    Server,
}

impl Side {
    fn send(self) -> bool { matches!(self, Side::Client) }
}

/// Bytes of plaintext header in front of the message body: salt, session
/// id, message id, seq no and length.
const PLAIN_HEADER_LEN: usize = 32;

fn msg_key_of(data: &[u8]) -> [u8; 16] {
    let sha = sha1!(data);
    let mut msg_key = [0u8; 16];
    msg_key.copy_from_slice(&sha[4..20]);
    msg_key
}

/// Encrypt a padded plaintext message with MTProto 1.0.
///
/// `plain` must be block-aligned; its first `unpadded_len` bytes are the
/// message proper and feed the `msg_key`. Returns
/// `key_id || msg_key || ciphertext`.
pub fn encrypt_oldmtp(auth_key: &AuthKey, plain: &[u8], unpadded_len: usize, side: Side) -> Vec<u8> {
    let msg_key = msg_key_of(&plain[..unpadded_len]);
    let (key, iv) = auth_key.prepare_aes_oldmtp(&msg_key, side.send());

    let mut out = Vec::with_capacity(24 + plain.len());
    out.extend_from_slice(&auth_key.key_id().to_le_bytes());
    out.extend_from_slice(&msg_key);
    out.extend_from_slice(plain);
    aes::ige_encrypt(&mut out[24..], &key, &iv);
    out
}

/// Decrypt an MTProto 1.0 message produced by `side`.
///
/// `buffer` must start with `key_id || msg_key || ciphertext`, and the
/// plaintext must carry the standard 32-byte header whose last word is the
/// body length. On success returns the full plaintext, padding included.
pub fn decrypt_oldmtp(auth_key: &AuthKey, buffer: &[u8], side: Side) -> Result<Vec<u8>, DecryptError> {
    if buffer.len() < 24 + PLAIN_HEADER_LEN || (buffer.len() - 24) % 16 != 0 {
        return Err(DecryptError::InvalidBuffer);
    }
    if auth_key.key_id().to_le_bytes() != buffer[..8] {
        return Err(DecryptError::AuthKeyMismatch);
    }
    let mut msg_key = [0u8; 16];
    msg_key.copy_from_slice(&buffer[8..24]);

    let (key, iv) = auth_key.prepare_aes_oldmtp(&msg_key, side.send());
    let mut plain = buffer[24..].to_vec();
    aes::ige_decrypt(&mut plain, &key, &iv);

    let mut len = [0u8; 4];
    len.copy_from_slice(&plain[28..32]);
    let unpadded = PLAIN_HEADER_LEN + u32::from_le_bytes(len) as usize;
    if unpadded > plain.len() {
        return Err(DecryptError::InvalidLength);
    }
    if msg_key_of(&plain[..unpadded]) != msg_key {
        return Err(DecryptError::MessageKeyMismatch);
    }
    Ok(plain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> AuthKey {
        let mut data = [0u8; 256];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i * 7 + 3) as u8;
        }
        AuthKey::from_bytes(data)
    }

    fn message(body_len: u32, padding: usize) -> Vec<u8> {
        let mut plain = vec![0u8; 28];
        plain.extend_from_slice(&body_len.to_le_bytes());
        plain.extend(std::iter::repeat_n(0xab, body_len as usize + padding));
        plain
    }

    #[test]
    fn roundtrip_client_to_server() {
        let key = key();
        let plain = message(12, 4);
        let sealed = encrypt_oldmtp(&key, &plain, plain.len() - 4, Side::Client);
        assert_eq!(&sealed[..8], &key.key_id().to_le_bytes());
        assert_eq!(decrypt_oldmtp(&key, &sealed, Side::Client).unwrap(), plain);
    }

    #[test]
    fn wrong_direction_is_rejected() {
        let key = key();
        let plain = message(16, 0);
        let sealed = encrypt_oldmtp(&key, &plain, plain.len(), Side::Server);
        assert!(decrypt_oldmtp(&key, &sealed, Side::Client).is_err());
        assert_eq!(decrypt_oldmtp(&key, &sealed, Side::Server).unwrap(), plain);
    }

    #[test]
    fn foreign_key_is_rejected() {
        let plain = message(16, 0);
        let sealed = encrypt_oldmtp(&key(), &plain, plain.len(), Side::Client);
        let other = AuthKey::from_bytes([0x11; 256]);
        assert_eq!(decrypt_oldmtp(&other, &sealed, Side::Client), Err(DecryptError::AuthKeyMismatch));
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert_eq!(decrypt_oldmtp(&key(), &[0u8; 40], Side::Client), Err(DecryptError::InvalidBuffer));
    }
}
