//! MTProto binary type layer.
//!
//! Every value travels as a sequence of little-endian 32-bit words
//! ("primes"). This crate provides the word buffer, a bounds-checked
//! [`Cursor`], the core wire types and the boxing rules that tie a value
//! to its 4-byte constructor id.
//!
//! # Overview
//!
//! | Item            | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`serialize`]   | [`Serializable`] and impls for the primitives             |
//! | [`deserialize`] | [`Deserializable`], [`Cursor`] and the codec error        |
//! | [`Boxed`]       | Constructor-prefixed wrapper over any [`Bare`] type       |
//! | [`Bytes`]       | Clone-on-write byte string (`string` / `bytes` on wire)   |
//! | [`Vector`]      | Clone-on-write homogeneous vector                         |
//! | [`gzip`]        | `gzip_packed` wrapping and inflation                      |
//! | [`dump`]        | Human-readable rendering for logs                         |
//! | [`mtproto`]     | The service constructors and functions used by the core   |
//!
//! # Example
//!
//! ```rust
//! use mtp_tl_types::{Boxed, Deserializable, Serializable, mtproto::types::Pong};
//!
//! let pong = Pong { msg_id: 8, ping_id: 42 };
//! let words = Boxed(pong.clone()).to_primes();
//! assert_eq!(Boxed::<Pong>::from_primes(&words).unwrap().0, pong);
//! ```

#![deny(unsafe_code)]

mod values;
pub mod deserialize;
pub mod dump;
pub mod gzip;
pub mod mtproto;
pub mod serialize;

pub use values::{Boxed, Bytes, Int128, Int256, Null, Vector};
pub use deserialize::{Cursor, Deserializable};
pub use serialize::Serializable;

/// One 32-bit word of the wire format.
pub type Prime = i32;

/// A 4-byte constructor id.
pub type TypeId = u32;

/// A flat buffer of wire words.
pub type Buffer = Vec<Prime>;

/// Constructor ids known to the type layer.
pub mod ids {
    use crate::TypeId;

    pub const INT: TypeId = 0xa8509bda;
    pub const LONG: TypeId = 0x22076cba;
    pub const INT128: TypeId = 0x4bb5362b;
    pub const INT256: TypeId = 0x0929c32f;
    pub const DOUBLE: TypeId = 0x2210c154;
    pub const STRING: TypeId = 0xb5286e24;
    pub const BYTES: TypeId = STRING;
    pub const BOOL_TRUE: TypeId = 0x997275b5;
    pub const BOOL_FALSE: TypeId = 0xbc799737;
    pub const VECTOR: TypeId = 0x1cb5c415;
    pub const ERROR: TypeId = 0xc4b9f9bb;
    pub const NULL: TypeId = 0x56730bcc;

    pub const RPC_RESULT: TypeId = 0xf35c6d01;
    pub const RPC_ERROR: TypeId = 0x2144ca19;
    pub const MSG_CONTAINER: TypeId = 0x73f1f8dc;
    pub const GZIP_PACKED: TypeId = 0x3072cfa1;

    pub const MSGS_ACK: TypeId = 0x62d6b459;
    pub const MSGS_STATE_REQ: TypeId = 0xda69fb52;
    pub const MSGS_STATE_INFO: TypeId = 0x04deb57d;
    pub const MSGS_ALL_INFO: TypeId = 0x8cc0d131;
    pub const MSG_DETAILED_INFO: TypeId = 0x276d3ec6;
    pub const MSG_NEW_DETAILED_INFO: TypeId = 0x809db6df;
    pub const BAD_MSG_NOTIFICATION: TypeId = 0xa7eff811;
    pub const HTTP_WAIT: TypeId = 0x9299359f;
    pub const PING: TypeId = 0x7abe77ec;
    pub const PONG: TypeId = 0x347773c5;

    pub const BIND_AUTH_KEY_INNER: TypeId = 0x75a3f765;
    pub const AUTH_BIND_TEMP_AUTH_KEY: TypeId = 0xcdd42a05;

    /// Pseudo constructor for one `msg_id seq_no bytes body` entry of a
    /// container. Never appears on the wire.
    pub const CORE_MESSAGE: TypeId = 0xffffffff;
}

// ─── Core traits ──────────────────────────────────────────────────────────────

/// A value that knows which constructor it is serialized under.
pub trait Identifiable {
    /// The constructor id of this particular value.
    fn constructor_id(&self) -> TypeId;
}

/// A leaf wire type that may be wrapped in [`Boxed`].
///
/// Implemented only for bare types; [`Boxed`] itself does not implement it,
/// which is what keeps `Boxed<Boxed<T>>` from being expressible.
pub trait Bare: Serializable + Deserializable + Identifiable {}

/// Marks a function type that can be sent as an RPC call.
///
/// `Return` is the bare type of the reply; replies arrive boxed.
pub trait RemoteCall: Bare {
    /// The bare type the server answers with.
    type Return: Bare;
}

// ─── Byte / word conversion ──────────────────────────────────────────────────

/// Pack bytes into little-endian words, zero-filling the last partial word.
pub fn bytes_to_primes(bytes: &[u8]) -> Buffer {
    bytes
        .chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            Prime::from_le_bytes(word)
        })
        .collect()
}

/// Unpack words into their little-endian byte representation.
pub fn primes_to_bytes(primes: &[Prime]) -> Vec<u8> {
    primes.iter().flat_map(|p| p.to_le_bytes()).collect()
}
