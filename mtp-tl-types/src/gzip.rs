//! `gzip_packed#3072cfa1 packed_data:bytes = Object`.
//!
//! The payload is a gzip stream (deflate with a gzip header, the
//! `16 + MAX_WBITS` window of zlib) whose inflated content is a whole number
//! of wire words holding one boxed value.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::deserialize::{Error, Result};
use crate::serialize::write_byte_string;
use crate::{Buffer, ids};

/// Wrap the boxed value in `words` as a `gzip_packed` value (constructor
/// included).
pub fn pack(words: &[crate::Prime]) -> std::io::Result<Buffer> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&crate::primes_to_bytes(words))?;
    let packed = encoder.finish()?;

    let mut out = vec![ids::GZIP_PACKED as i32];
    write_byte_string(&mut out, &packed);
    Ok(out)
}

/// Inflate the `packed_data` of a `gzip_packed` value back into words.
///
/// A corrupt or truncated stream, an empty result, or a result that is not
/// word-aligned is an error; nothing partial is returned.
pub fn unpack(packed: &[u8]) -> Result<Buffer> {
    let mut raw = Vec::new();
    GzDecoder::new(packed)
        .read_to_end(&mut raw)
        .map_err(|e| Error::Inflate(e.to_string()))?;
    if raw.is_empty() {
        return Err(Error::Inflate("void data".into()));
    }
    if raw.len() % 4 != 0 {
        return Err(Error::Inflate(format!("bad length, size: {}", raw.len())));
    }
    Ok(crate::bytes_to_primes(&raw))
}
