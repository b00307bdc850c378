//! The [`Deserializable`] trait, [`Cursor`] buffer, and primitive impls.

use std::fmt;

use crate::{Int128, Int256, Prime, TypeId, ids};

// ─── Error ───────────────────────────────────────────────────────────────────

/// Errors that can occur during deserialization.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Fewer words remain than the type needs.
    InsufficientData,
    /// The constructor id does not belong to the type being read.
    UnexpectedConstructor { id: TypeId, type_name: &'static str },
    /// A `string` field held bytes that are not valid UTF-8.
    InvalidUtf8,
    /// A `gzip_packed` payload could not be inflated.
    Inflate(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData => write!(f, "insufficient words in input buffer"),
            Self::UnexpectedConstructor { id, type_name } => {
                write!(f, "unexpected constructor id {id:#010x} read in {type_name}")
            }
            Self::InvalidUtf8 => write!(f, "string is not valid utf-8"),
            Self::Inflate(reason) => write!(f, "gzip_packed inflate failed: {reason}"),
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` for deserialization.
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn unexpected<T>(id: TypeId, type_name: &'static str) -> Result<T> {
    Err(Error::UnexpectedConstructor { id, type_name })
}

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// A zero-copy cursor over a slice of wire words.
///
/// Reads never go past the end of the slice; running out of words is
/// reported as [`Error::InsufficientData`].
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    buf: &'a [Prime],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor positioned at the start of `buf`.
    pub fn from_primes(buf: &'a [Prime]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current word offset.
    pub fn pos(&self) -> usize { self.pos }

    /// Remaining words.
    pub fn remaining(&self) -> usize { self.buf.len() - self.pos }

    /// True once every word has been consumed.
    pub fn is_empty(&self) -> bool { self.remaining() == 0 }

    /// Look at the next word without consuming it.
    pub fn peek(&self) -> Result<Prime> {
        self.buf.get(self.pos).copied().ok_or(Error::InsufficientData)
    }

    /// Read a single word.
    pub fn read_prime(&mut self) -> Result<Prime> {
        let value = self.peek()?;
        self.pos += 1;
        Ok(value)
    }

    /// Read a single word as a constructor id.
    pub fn read_type_id(&mut self) -> Result<TypeId> {
        self.read_prime().map(|p| p as TypeId)
    }

    /// Borrow the next `count` words and advance past them.
    pub fn read_primes(&mut self, count: usize) -> Result<&'a [Prime]> {
        let end = self.pos.checked_add(count).ok_or(Error::InsufficientData)?;
        let slice = self.buf.get(self.pos..end).ok_or(Error::InsufficientData)?;
        self.pos = end;
        Ok(slice)
    }

    /// Words not yet consumed.
    pub fn rest(&self) -> &'a [Prime] { &self.buf[self.pos..] }

    /// Run `read`, rewinding to the current position if it fails.
    pub fn attempt<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start = self.pos;
        let result = read(self);
        if result.is_err() {
            self.pos = start;
        }
        result
    }
}

// ─── Deserializable ──────────────────────────────────────────────────────────

/// Deserialize a value from the wire format.
///
/// The constructor id is supplied by the caller: a boxed reader takes it
/// from the stream, a bare field uses [`Deserializable::BARE_ID`].
pub trait Deserializable: Sized {
    /// Constructor assumed when the value appears bare (struct field,
    /// vector element). `0` for sum types that only ever travel boxed.
    const BARE_ID: TypeId = 0;

    /// Read `Self` under constructor `cons`, advancing `buf`.
    fn deserialize(buf: &mut Cursor<'_>, cons: TypeId) -> Result<Self>;

    /// Like [`Deserializable::deserialize`] but leaves `buf` untouched on failure.
    fn read(buf: &mut Cursor<'_>, cons: TypeId) -> Result<Self> {
        buf.attempt(|b| Self::deserialize(b, cons))
    }

    /// Convenience: read a bare value from the start of `primes`.
    fn from_primes(primes: &[Prime]) -> Result<Self> {
        let mut cursor = Cursor::from_primes(primes);
        Self::deserialize(&mut cursor, Self::BARE_ID)
    }
}

fn read_u64(buf: &mut Cursor<'_>) -> Result<u64> {
    let words = buf.read_primes(2)?;
    Ok((words[0] as u32 as u64) | ((words[1] as u32 as u64) << 32))
}

// ─── Primitives ───────────────────────────────────────────────────────────────

impl Deserializable for i32 {
    const BARE_ID: TypeId = ids::INT;

    fn deserialize(buf: &mut Cursor<'_>, cons: TypeId) -> Result<Self> {
        if buf.is_empty() {
            return Err(Error::InsufficientData);
        }
        if cons != ids::INT {
            return unexpected(cons, "int");
        }
        buf.read_prime()
    }
}

impl Deserializable for u64 {
    const BARE_ID: TypeId = ids::LONG;

    fn deserialize(buf: &mut Cursor<'_>, cons: TypeId) -> Result<Self> {
        if buf.remaining() < 2 {
            return Err(Error::InsufficientData);
        }
        if cons != ids::LONG {
            return unexpected(cons, "long");
        }
        read_u64(buf)
    }
}

impl Deserializable for i64 {
    const BARE_ID: TypeId = ids::LONG;

    fn deserialize(buf: &mut Cursor<'_>, cons: TypeId) -> Result<Self> {
        u64::deserialize(buf, cons).map(|v| v as i64)
    }
}

impl Deserializable for f64 {
    const BARE_ID: TypeId = ids::DOUBLE;

    fn deserialize(buf: &mut Cursor<'_>, cons: TypeId) -> Result<Self> {
        if buf.remaining() < 2 {
            return Err(Error::InsufficientData);
        }
        if cons != ids::DOUBLE {
            return unexpected(cons, "double");
        }
        read_u64(buf).map(f64::from_bits)
    }
}

impl Deserializable for Int128 {
    const BARE_ID: TypeId = ids::INT128;

    fn deserialize(buf: &mut Cursor<'_>, cons: TypeId) -> Result<Self> {
        if buf.remaining() < 4 {
            return Err(Error::InsufficientData);
        }
        if cons != ids::INT128 {
            return unexpected(cons, "int128");
        }
        let l = read_u64(buf)?;
        let h = read_u64(buf)?;
        Ok(Int128 { l, h })
    }
}

impl Deserializable for Int256 {
    const BARE_ID: TypeId = ids::INT256;

    fn deserialize(buf: &mut Cursor<'_>, cons: TypeId) -> Result<Self> {
        if cons != ids::INT256 {
            return unexpected(cons, "int256");
        }
        let l = Int128::deserialize(buf, ids::INT128)?;
        let h = Int128::deserialize(buf, ids::INT128)?;
        Ok(Int256 { l, h })
    }
}

/// `boolTrue` / `boolFalse` carry no payload; the constructor is the value.
impl Deserializable for bool {
    fn deserialize(_buf: &mut Cursor<'_>, cons: TypeId) -> Result<Self> {
        match cons {
            ids::BOOL_TRUE => Ok(true),
            ids::BOOL_FALSE => Ok(false),
            id => unexpected(id, "bool"),
        }
    }
}

// ─── Bytes / String ───────────────────────────────────────────────────────────

/// Read the raw content of a `string`/`bytes` value, skipping its padding.
pub(crate) fn read_byte_string(buf: &mut Cursor<'_>) -> Result<Vec<u8>> {
    let first = buf.peek()?.to_le_bytes();
    let (len, header) = if first[0] == 254 {
        (first[1] as usize | (first[2] as usize) << 8 | (first[3] as usize) << 16, 4)
    } else {
        (first[0] as usize, 1)
    };
    let words = (header + len).div_ceil(4);
    let raw = crate::primes_to_bytes(buf.read_primes(words)?);
    Ok(raw[header..header + len].to_vec())
}

impl Deserializable for String {
    const BARE_ID: TypeId = ids::STRING;

    fn deserialize(buf: &mut Cursor<'_>, cons: TypeId) -> Result<Self> {
        if buf.is_empty() {
            return Err(Error::InsufficientData);
        }
        if cons != ids::STRING {
            return unexpected(cons, "string");
        }
        String::from_utf8(read_byte_string(buf)?).map_err(|_| Error::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_rewinds_on_failure() {
        let words = [1, 2, 3];
        let mut cursor = Cursor::from_primes(&words);
        cursor.read_prime().unwrap();
        let result = cursor.attempt(|c| c.read_primes(5));
        assert_eq!(result, Err(Error::InsufficientData));
        assert_eq!(cursor.pos(), 1);
    }

    #[test]
    fn long_string_header_is_decoded() {
        let mut words = vec![i32::from_le_bytes([254, 0x2c, 0x01, 0])];
        words.extend(std::iter::repeat_n(0x61616161, 75));
        let mut cursor = Cursor::from_primes(&words);
        let s = String::deserialize(&mut cursor, ids::STRING).unwrap();
        assert_eq!(s.len(), 300);
        assert!(cursor.is_empty());
    }
}
