//! Human-readable rendering of wire buffers, for trace logs.
//!
//! Understands the core constructors only; anything else stops the
//! rendering with [`Error::UnexpectedConstructor`].

use std::fmt::Write;

use crate::deserialize::{Error, Result, read_byte_string};
use crate::{Cursor, Deserializable, Int128, Int256, Prime, TypeId, gzip, ids};

/// Render the boxed value at the start of `primes`.
pub fn dump(primes: &[Prime]) -> Result<String> {
    let mut cursor = Cursor::from_primes(primes);
    render(&mut cursor, 0, 0, 0)
}

/// Like [`dump`], but folds a rendering failure into the returned text.
pub fn dump_lossy(primes: &[Prime]) -> String {
    dump(primes).unwrap_or_else(|e| format!("[UNREADABLE: {e}]"))
}

/// `cons == 0` means the constructor is read from the stream. `vcons` is
/// the element constructor used when rendering a vector.
fn render(buf: &mut Cursor<'_>, cons: TypeId, level: usize, vcons: TypeId) -> Result<String> {
    if cons == 0 {
        let cons = buf.read_type_id()?;
        return render(buf, cons, level, vcons);
    }
    let add = " ".repeat(level * 2);
    let field = |buf: &mut Cursor<'_>, name: &str, cons: TypeId, out: &mut String| -> Result<()> {
        let value = render(buf, cons, level + 1, 0)?;
        let _ = write!(out, "  {name}: {value},\n{add}");
        Ok(())
    };

    match cons {
        ids::INT => Ok(format!("{} [INT]", i32::deserialize(buf, cons)?)),
        ids::LONG => Ok(format!("{} [LONG]", u64::deserialize(buf, cons)?)),
        ids::INT128 => {
            let v = Int128::deserialize(buf, cons)?;
            Ok(format!("{} * 2^64 + {} [INT128]", v.h, v.l))
        }
        ids::INT256 => {
            let v = Int256::deserialize(buf, cons)?;
            Ok(format!(
                "{} * 2^192 + {} * 2^128 + {} * 2^64 + {} [INT256]",
                v.h.h, v.h.l, v.l.h, v.l.l
            ))
        }
        ids::DOUBLE => Ok(format!("{} [DOUBLE]", f64::deserialize(buf, cons)?)),
        ids::STRING => {
            let raw = read_byte_string(buf)?;
            Ok(match String::from_utf8(raw) {
                Ok(s) => {
                    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n");
                    format!("\"{escaped}\" [STRING]")
                }
                Err(e) => {
                    let bytes = e.into_bytes();
                    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
                    format!("{hex} [{} BYTES]", bytes.len())
                }
            })
        }
        ids::BOOL_TRUE => Ok("[TRUE]".into()),
        ids::BOOL_FALSE => Ok("[FALSE]".into()),
        ids::VECTOR => {
            let count = buf.read_prime()?;
            let mut out = String::new();
            if count > 0 {
                let _ = write!(out, "\n{add}");
                for _ in 0..count {
                    let item = render(buf, vcons, level + 1, 0)?;
                    let _ = write!(out, "  {item},\n{add}");
                }
            } else {
                out.push(' ');
            }
            Ok(format!("[ vector<{vcons:#x}>{out}]"))
        }
        ids::ERROR | ids::RPC_ERROR => {
            let name = if cons == ids::ERROR { "error" } else { "rpc_error" };
            let mut out = format!("\n{add}");
            field(buf, "code", ids::INT, &mut out)?;
            field(buf, "text", ids::STRING, &mut out)?;
            Ok(format!("{{ {name}{out}}}"))
        }
        ids::NULL => Ok("{ null }".into()),
        ids::RPC_RESULT => {
            let mut out = format!("\n{add}");
            field(buf, "req_msg_id", ids::LONG, &mut out)?;
            field(buf, "result", 0, &mut out)?;
            Ok(format!("{{ rpc_result{out}}}"))
        }
        ids::MSG_CONTAINER => {
            let messages = render(buf, ids::VECTOR, level + 1, ids::CORE_MESSAGE)?;
            Ok(format!("{{ msg_container\n{add}  messages: {messages},\n{add}}}"))
        }
        ids::CORE_MESSAGE => {
            let mut out = format!("\n{add}");
            field(buf, "msg_id", ids::LONG, &mut out)?;
            field(buf, "seq_no", ids::INT, &mut out)?;
            field(buf, "bytes", ids::INT, &mut out)?;
            field(buf, "body", 0, &mut out)?;
            Ok(format!("{{ core_message{out}}}"))
        }
        ids::GZIP_PACKED => {
            let packed = read_byte_string(buf)?;
            let unpacked = gzip::unpack(&packed)?;
            let mut inner = Cursor::from_primes(&unpacked);
            let cons = inner.read_type_id()?;
            if cons == ids::GZIP_PACKED {
                return Err(Error::UnexpectedConstructor { id: cons, type_name: "gzip_packed payload" });
            }
            Ok(format!("[GZIPPED] {}", render(&mut inner, cons, level, vcons)?))
        }
        id => Err(Error::UnexpectedConstructor { id, type_name: "dump" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mtproto::types::RpcError;
    use crate::{Boxed, Serializable, Vector};

    #[test]
    fn renders_rpc_error() {
        let err = Boxed(RpcError { error_code: 420, error_message: "FLOOD_WAIT_3".into() });
        let text = dump(&err.to_primes()).unwrap();
        assert!(text.starts_with("{ rpc_error"));
        assert!(text.contains("420 [INT]"));
        assert!(text.contains("\"FLOOD_WAIT_3\" [STRING]"));
    }

    #[test]
    fn renders_through_gzip() {
        let inner = Boxed(Vector::from(vec![Boxed(true), Boxed(false)])).to_primes();
        let packed = gzip::pack(&inner).unwrap();
        let text = dump(&packed).unwrap();
        assert!(text.starts_with("[GZIPPED] [ vector"));
        assert!(text.contains("[TRUE]"));
        assert!(text.contains("[FALSE]"));
    }

    #[test]
    fn unknown_constructor_is_reported() {
        let words = [0x1234_5678];
        assert_eq!(
            dump(&words),
            Err(Error::UnexpectedConstructor { id: 0x1234_5678, type_name: "dump" })
        );
        assert!(dump_lossy(&words).starts_with("[UNREADABLE"));
    }
}
