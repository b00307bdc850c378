//! `AuthKey`: a 256-byte MTProto authorization key.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::sha1;

/// Shared handle to an [`AuthKey`].
pub type AuthKeyPtr = Arc<AuthKey>;

/// An authorization key plus its pre-computed identifier.
///
/// The key material never changes; the last successful check time is the
/// only mutable part and may be updated through a shared handle.
pub struct AuthKey {
    pub(crate) data: [u8; 256],
    key_id: u64,
    last_check_time: AtomicI64,
}

impl AuthKey {
    /// Construct from the raw 256 key bytes.
    pub fn from_bytes(data: [u8; 256]) -> Self {
        let sha = sha1!(&data);
        let mut id = [0u8; 8];
        id.copy_from_slice(&sha[12..20]);
        Self { data, key_id: u64::from_le_bytes(id), last_check_time: AtomicI64::new(0) }
    }

    /// Return the raw 256-byte representation.
    pub fn to_bytes(&self) -> [u8; 256] { self.data }

    /// The key identifier: `SHA1(key)[12..20]` read as a little-endian u64.
    pub fn key_id(&self) -> u64 { self.key_id }

    /// Unix time of the last confirmed check, `0` if never checked.
    pub fn last_check_time(&self) -> i64 {
        self.last_check_time.load(Ordering::Relaxed)
    }

    pub fn set_last_check_time(&self, unixtime: i64) {
        self.last_check_time.store(unixtime, Ordering::Relaxed);
    }

    /// MTProto 1.0 AES key and IV for a message with `msg_key`.
    ///
    /// `send` selects the client-to-server half of the key (offset 0);
    /// messages in the other direction use offset 8.
    pub fn prepare_aes_oldmtp(&self, msg_key: &[u8; 16], send: bool) -> ([u8; 32], [u8; 32]) {
        let x = if send { 0 } else { 8 };
        let key = &self.data;

        let sha1_a = sha1!(msg_key, &key[x..x + 32]);
        let sha1_b = sha1!(&key[32 + x..48 + x], msg_key, &key[48 + x..64 + x]);
        let sha1_c = sha1!(&key[64 + x..96 + x], msg_key);
        let sha1_d = sha1!(msg_key, &key[96 + x..128 + x]);

        let mut aes_key = [0u8; 32];
        aes_key[..8].copy_from_slice(&sha1_a[..8]);
        aes_key[8..20].copy_from_slice(&sha1_b[8..20]);
        aes_key[20..].copy_from_slice(&sha1_c[4..16]);

        let mut aes_iv = [0u8; 32];
        aes_iv[..12].copy_from_slice(&sha1_a[8..20]);
        aes_iv[12..20].copy_from_slice(&sha1_b[..8]);
        aes_iv[20..24].copy_from_slice(&sha1_c[16..20]);
        aes_iv[24..].copy_from_slice(&sha1_d[..8]);

        (aes_key, aes_iv)
    }
}

impl std::fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthKey(id={})", self.key_id)
    }
}

impl PartialEq for AuthKey {
    fn eq(&self, other: &Self) -> bool { self.key_id == other.key_id }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> AuthKey {
        let mut data = [0u8; 256];
        for (i, b) in data.iter_mut().enumerate() {
            *b = i as u8;
        }
        AuthKey::from_bytes(data)
    }

    #[test]
    fn key_id_is_tail_of_sha1() {
        let key = key();
        let sha = sha1!(&key.to_bytes());
        let mut id = [0u8; 8];
        id.copy_from_slice(&sha[12..]);
        assert_eq!(key.key_id(), u64::from_le_bytes(id));
    }

    #[test]
    fn directions_derive_different_material() {
        let key = key();
        let msg_key = [3u8; 16];
        let send = key.prepare_aes_oldmtp(&msg_key, true);
        let recv = key.prepare_aes_oldmtp(&msg_key, false);
        assert_ne!(send, recv);
        assert_eq!(send, key.prepare_aes_oldmtp(&msg_key, true));
    }

    #[test]
    fn key_layout_follows_the_four_hashes() {
        let key = key();
        let msg_key = [9u8; 16];
        let (aes_key, aes_iv) = key.prepare_aes_oldmtp(&msg_key, true);
        let a = sha1!(&msg_key, &key.data[..32]);
        let d = sha1!(&msg_key, &key.data[96..128]);
        assert_eq!(aes_key[..8], a[..8]);
        assert_eq!(aes_iv[..12], a[8..20]);
        assert_eq!(aes_iv[24..], d[..8]);
    }

    #[test]
    fn check_time_is_shared() {
        let key = Arc::new(key());
        let other = Arc::clone(&key);
        assert_eq!(key.last_check_time(), 0);
        other.set_last_check_time(1_700_000_000);
        assert_eq!(key.last_check_time(), 1_700_000_000);
    }
}
