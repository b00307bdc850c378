//! Wire values that are more than a machine primitive: wide integers,
//! clone-on-write byte strings and vectors, `null`, and the boxed wrapper.

use std::ops::Deref;
use std::sync::Arc;

use crate::deserialize::{Error, Result, read_byte_string, unexpected};
use crate::serialize::{byte_string_len, write_byte_string};
use crate::{Bare, Buffer, Cursor, Deserializable, Identifiable, Serializable, TypeId, gzip, ids};

// ─── int128 / int256 ─────────────────────────────────────────────────────────

/// `int128`: two little-endian 64-bit halves, low half first.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Int128 {
    pub l: u64,
    pub h: u64,
}

impl Int128 {
    /// Interpret 16 raw bytes as an `int128`.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut l = [0u8; 8];
        let mut h = [0u8; 8];
        l.copy_from_slice(&bytes[..8]);
        h.copy_from_slice(&bytes[8..]);
        Self { l: u64::from_le_bytes(l), h: u64::from_le_bytes(h) }
    }

    /// The 16 raw bytes as they appear on the wire.
    pub fn to_bytes(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.l.to_le_bytes());
        out[8..].copy_from_slice(&self.h.to_le_bytes());
        out
    }
}

/// `int256`: two `int128` halves, low half first.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Int256 {
    pub l: Int128,
    pub h: Int128,
}

// ─── Bytes ───────────────────────────────────────────────────────────────────

/// A `string` / `bytes` value.
///
/// Clones share one allocation; [`Bytes::to_mut`] copies the data first if
/// any other handle still refers to it, so mutation through one handle is
/// never visible through another.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Bytes(Arc<Vec<u8>>);

impl Bytes {
    /// An empty byte string.
    pub fn new() -> Self { Self::default() }

    /// Mutable access, splitting off a private copy when shared.
    pub fn to_mut(&mut self) -> &mut Vec<u8> {
        Arc::make_mut(&mut self.0)
    }

    /// Whether `self` and `other` currently share one allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Lossy UTF-8 view for error messages and logs.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl Deref for Bytes {
    type Target = [u8];
    fn deref(&self) -> &[u8] { &self.0 }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self { Self(Arc::new(v)) }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self { Self(Arc::new(v.to_vec())) }
}

impl From<&str> for Bytes {
    fn from(v: &str) -> Self { Self::from(v.as_bytes()) }
}

impl From<String> for Bytes {
    fn from(v: String) -> Self { Self::from(v.into_bytes()) }
}

impl Serializable for Bytes {
    fn serialized_len(&self) -> usize { byte_string_len(self.len()) }
    fn serialize(&self, buf: &mut Buffer) {
        write_byte_string(buf, self);
    }
}

impl Identifiable for Bytes {
    fn constructor_id(&self) -> TypeId { ids::BYTES }
}

impl Deserializable for Bytes {
    const BARE_ID: TypeId = ids::BYTES;

    fn deserialize(buf: &mut Cursor<'_>, cons: TypeId) -> Result<Self> {
        if buf.is_empty() {
            return Err(Error::InsufficientData);
        }
        if cons != ids::BYTES {
            return unexpected(cons, "bytes");
        }
        read_byte_string(buf).map(Self::from)
    }
}

// ─── Vector ──────────────────────────────────────────────────────────────────

/// A count-prefixed homogeneous `vector`, shared clone-on-write like [`Bytes`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Vector<T>(Arc<Vec<T>>);

impl<T> Vector<T> {
    /// An empty vector.
    pub fn new() -> Self { Self(Arc::new(Vec::new())) }

    /// Whether `self` and `other` currently share one allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> Vector<T> {
    /// Mutable access, splitting off a private copy when shared.
    pub fn to_mut(&mut self) -> &mut Vec<T> {
        Arc::make_mut(&mut self.0)
    }
}

impl<T> Default for Vector<T> {
    fn default() -> Self { Self::new() }
}

impl<T> Deref for Vector<T> {
    type Target = [T];
    fn deref(&self) -> &[T] { &self.0 }
}

impl<T> From<Vec<T>> for Vector<T> {
    fn from(v: Vec<T>) -> Self { Self(Arc::new(v)) }
}

impl<T> FromIterator<T> for Vector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T: Serializable> Serializable for Vector<T> {
    fn serialized_len(&self) -> usize {
        4 + self.iter().map(Serializable::serialized_len).sum::<usize>()
    }
    fn serialize(&self, buf: &mut Buffer) {
        buf.push(self.len() as i32);
        for item in self.iter() { item.serialize(buf); }
    }
}

impl<T> Identifiable for Vector<T> {
    fn constructor_id(&self) -> TypeId { ids::VECTOR }
}

/// Elements are read bare under their own [`Deserializable::BARE_ID`]. A
/// short buffer fails the whole vector; no partial vector is returned.
impl<T: Deserializable> Deserializable for Vector<T> {
    const BARE_ID: TypeId = ids::VECTOR;

    fn deserialize(buf: &mut Cursor<'_>, cons: TypeId) -> Result<Self> {
        if buf.is_empty() {
            return Err(Error::InsufficientData);
        }
        if cons != ids::VECTOR {
            return unexpected(cons, "vector");
        }
        let count = buf.read_prime()? as u32 as usize;
        let mut items = Vec::with_capacity(count.min(buf.remaining()));
        for _ in 0..count {
            items.push(T::deserialize(buf, T::BARE_ID)?);
        }
        Ok(Self::from(items))
    }
}

// ─── null ────────────────────────────────────────────────────────────────────

/// `null#56730bcc`: no payload.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Null;

impl Serializable for Null {
    fn serialized_len(&self) -> usize { 0 }
    fn serialize(&self, _buf: &mut Buffer) {}
}

impl Identifiable for Null {
    fn constructor_id(&self) -> TypeId { ids::NULL }
}

impl Deserializable for Null {
    const BARE_ID: TypeId = ids::NULL;

    fn deserialize(_buf: &mut Cursor<'_>, cons: TypeId) -> Result<Self> {
        if cons != ids::NULL {
            return unexpected(cons, "null");
        }
        Ok(Null)
    }
}

impl Bare for i32 {}
impl Bare for i64 {}
impl Bare for u64 {}
impl Bare for f64 {}
impl Bare for bool {}
impl Bare for Int128 {}
impl Bare for Int256 {}
impl Bare for String {}
impl Bare for Bytes {}
impl Bare for Null {}
impl<T: Serializable + Deserializable> Bare for Vector<T> {}

// ─── Boxed ───────────────────────────────────────────────────────────────────

/// A bare value preceded by its 4-byte constructor id.
///
/// Reading checks the constructor against `T`, and transparently inflates a
/// `gzip_packed` wrapper before doing so. Only [`Bare`] types can be boxed:
///
/// ```compile_fail
/// use mtp_tl_types::Boxed;
///
/// let twice = Boxed(Boxed(5i32));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Boxed<T: Bare>(pub T);

impl<T: Bare> Boxed<T> {
    /// Unwrap the bare value.
    pub fn into_inner(self) -> T { self.0 }
}

impl<T: Bare> Deref for Boxed<T> {
    type Target = T;
    fn deref(&self) -> &T { &self.0 }
}

impl<T: Bare> From<T> for Boxed<T> {
    fn from(v: T) -> Self { Self(v) }
}

impl<T: Bare> Serializable for Boxed<T> {
    fn serialized_len(&self) -> usize { 4 + self.0.serialized_len() }
    fn serialize(&self, buf: &mut Buffer) {
        buf.push(self.0.constructor_id() as i32);
        self.0.serialize(buf);
    }
}

impl<T: Bare> Identifiable for Boxed<T> {
    fn constructor_id(&self) -> TypeId { self.0.constructor_id() }
}

/// The `cons` argument is ignored: a boxed value names its own constructor.
impl<T: Bare> Deserializable for Boxed<T> {
    fn deserialize(buf: &mut Cursor<'_>, _cons: TypeId) -> Result<Self> {
        let cons = buf.read_type_id()?;
        if cons == ids::GZIP_PACKED {
            let packed = Bytes::deserialize(buf, ids::BYTES)?;
            let unpacked = gzip::unpack(&packed)?;
            let mut inner = Cursor::from_primes(&unpacked);
            let cons = inner.read_type_id()?;
            // One level only: a packed payload never packs another.
            if cons == ids::GZIP_PACKED {
                return unexpected(cons, "gzip_packed payload");
            }
            return T::deserialize(&mut inner, cons).map(Boxed);
        }
        T::deserialize(buf, cons).map(Boxed)
    }
}
