//! The [`Serializable`] trait and its implementations for primitive types.
//!
//! Encoding follows the [MTProto Binary Serialization] spec: every value is
//! a whole number of little-endian 32-bit words.
//!
//! [MTProto Binary Serialization]: https://core.telegram.org/mtproto/serialize

use crate::{Buffer, Identifiable, Int128, Int256, Prime, TypeId, ids};

/// Serialize `self` into the wire format.
pub trait Serializable {
    /// Size of the bare encoding in bytes. Always a multiple of 4.
    fn serialized_len(&self) -> usize;

    /// Appends the bare encoding of `self` to `buf`.
    fn serialize(&self, buf: &mut Buffer);

    /// Convenience: allocate a fresh buffer and serialize into it.
    fn to_primes(&self) -> Buffer {
        let mut v = Vec::with_capacity(self.serialized_len() / 4);
        self.serialize(&mut v);
        v
    }
}

fn push_u64(buf: &mut Buffer, v: u64) {
    buf.push((v & 0xffff_ffff) as u32 as Prime);
    buf.push((v >> 32) as u32 as Prime);
}

// ─── bool ────────────────────────────────────────────────────────────────────

/// `true`  → `boolTrue#997275b5`
/// `false` → `boolFalse#bc799737`
///
/// The bare encoding is empty; the value lives in the constructor.
impl Serializable for bool {
    fn serialized_len(&self) -> usize { 0 }
    fn serialize(&self, _buf: &mut Buffer) {}
}

impl Identifiable for bool {
    fn constructor_id(&self) -> TypeId {
        if *self { ids::BOOL_TRUE } else { ids::BOOL_FALSE }
    }
}

// ─── integers ────────────────────────────────────────────────────────────────

impl Serializable for i32 {
    fn serialized_len(&self) -> usize { 4 }
    fn serialize(&self, buf: &mut Buffer) {
        buf.push(*self);
    }
}

impl Identifiable for i32 {
    fn constructor_id(&self) -> TypeId { ids::INT }
}

impl Serializable for u64 {
    fn serialized_len(&self) -> usize { 8 }
    fn serialize(&self, buf: &mut Buffer) {
        push_u64(buf, *self);
    }
}

impl Identifiable for u64 {
    fn constructor_id(&self) -> TypeId { ids::LONG }
}

impl Serializable for i64 {
    fn serialized_len(&self) -> usize { 8 }
    fn serialize(&self, buf: &mut Buffer) {
        push_u64(buf, *self as u64);
    }
}

impl Identifiable for i64 {
    fn constructor_id(&self) -> TypeId { ids::LONG }
}

impl Serializable for f64 {
    fn serialized_len(&self) -> usize { 8 }
    fn serialize(&self, buf: &mut Buffer) {
        push_u64(buf, self.to_bits());
    }
}

impl Identifiable for f64 {
    fn constructor_id(&self) -> TypeId { ids::DOUBLE }
}

impl Serializable for Int128 {
    fn serialized_len(&self) -> usize { 16 }
    fn serialize(&self, buf: &mut Buffer) {
        push_u64(buf, self.l);
        push_u64(buf, self.h);
    }
}

impl Identifiable for Int128 {
    fn constructor_id(&self) -> TypeId { ids::INT128 }
}

impl Serializable for Int256 {
    fn serialized_len(&self) -> usize { 32 }
    fn serialize(&self, buf: &mut Buffer) {
        self.l.serialize(buf);
        self.h.serialize(buf);
    }
}

impl Identifiable for Int256 {
    fn constructor_id(&self) -> TypeId { ids::INT256 }
}

// ─── strings / bytes ─────────────────────────────────────────────────────────

/// Encoded size of a byte string of `len` bytes, padding included.
pub fn byte_string_len(len: usize) -> usize {
    let header = if len < 254 { 1 } else { 4 };
    (header + len).div_ceil(4) * 4
}

/// TL string encoding: a length-prefixed, 4-byte aligned byte string.
///
/// * If `len < 254`: `[len as u8][data][0-padding to align to 4 bytes]`
/// * Otherwise:     `[0xfe][len as 3 LE bytes][data][0-padding]`
pub fn write_byte_string(buf: &mut Buffer, data: &[u8]) {
    let len = data.len();
    let mut raw = Vec::with_capacity(byte_string_len(len));
    if len < 254 {
        raw.push(len as u8);
    } else {
        raw.extend([
            254,
            (len & 0xff) as u8,
            ((len >> 8) & 0xff) as u8,
            ((len >> 16) & 0xff) as u8,
        ]);
    }
    raw.extend_from_slice(data);
    buf.extend(crate::bytes_to_primes(&raw));
}

impl Serializable for str {
    fn serialized_len(&self) -> usize { byte_string_len(self.len()) }
    fn serialize(&self, buf: &mut Buffer) {
        write_byte_string(buf, self.as_bytes());
    }
}

impl Serializable for String {
    fn serialized_len(&self) -> usize { self.as_str().serialized_len() }
    fn serialize(&self, buf: &mut Buffer) {
        self.as_str().serialize(buf);
    }
}

impl Identifiable for String {
    fn constructor_id(&self) -> TypeId { ids::STRING }
}
