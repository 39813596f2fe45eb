use super::error::RespError;
use async_recursion::async_recursion;
use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};

const CRLF: &[u8] = b"\r\n";

/// One RESP wire object. Every variant is self-describing by its leading
/// byte (see `Value::leading`); the parser in `super::parser` is a
/// byte->variant registry keyed on that byte.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    SimpleString(String),
    SimpleError(String),
    Integer(i64),
    BulkString(Option<Bytes>),
    BulkError(Option<Bytes>),
    Null,
    Boolean(bool),
    Double(f64),
    Array(Vec<Value>),
    /// Parsed key/value pairs in insertion order. Keys are restricted to
    /// SimpleString/BulkString at parse time (see `parser::read_map`) and
    /// are kept as raw bytes rather than re-wrapped in a `Value`, since on
    /// the wire every key is rewritten as a BulkString regardless of how it
    /// was read (matching the Go original's `Map.Write`).
    Map(Vec<(Vec<u8>, Value)>),
    Set(Vec<Value>),
}

/// All eleven leading bytes the parser registry dispatches on. Used by
/// `assert_registry_unique` and by command-layer allowlists (e.g. Map keys,
/// the follower handshake's PING reply).
pub const ALL_LEADINGS: [u8; 11] = [
    b'+', b'-', b':', b'$', b'!', b'_', b'#', b',', b'*', b'%', b'~',
];

pub const STRING_CAPABLE_LEADINGS: [u8; 2] = [b'+', b'$'];

impl Value {
    pub fn leading(&self) -> u8 {
        match self {
            Value::SimpleString(_) => b'+',
            Value::SimpleError(_) => b'-',
            Value::Integer(_) => b':',
            Value::BulkString(_) => b'$',
            Value::BulkError(_) => b'!',
            Value::Null => b'_',
            Value::Boolean(_) => b'#',
            Value::Double(_) => b',',
            Value::Array(_) => b'*',
            Value::Map(_) => b'%',
            Value::Set(_) => b'~',
        }
    }

    /// Capability coercion: SimpleString, SimpleError and a non-null
    /// BulkString can all be read as text. A null BulkString is not
    /// string-capable.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::SimpleString(s) => Some(s.clone()),
            Value::SimpleError(s) => Some(s.clone()),
            Value::BulkString(Some(b)) => String::from_utf8(b.to_vec()).ok(),
            _ => None,
        }
    }

    /// Capability coercion: BulkString/BulkError expose their raw payload.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::BulkString(Some(b)) => Some(b.as_ref()),
            Value::BulkError(Some(b)) => Some(b.as_ref()),
            _ => None,
        }
    }

    /// Capability coercion: only Integer carries an int64.
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Stable, variant-tagged content hash used for Set member identity.
    /// MD5 of the canonical byte representation (little-endian for
    /// fixed-width fields), with the leading byte mixed in first so that
    /// distinct variants collide only by accident, never by construction.
    pub fn content_hash(&self) -> [u8; 16] {
        let mut ctx = md5::Context::new();
        self.hash_into(&mut ctx);
        ctx.compute().0
    }

    fn hash_into(&self, ctx: &mut md5::Context) {
        ctx.consume([self.leading()]);
        match self {
            Value::SimpleString(s) => ctx.consume(s.as_bytes()),
            Value::SimpleError(s) => ctx.consume(s.as_bytes()),
            Value::Integer(i) => ctx.consume(i.to_le_bytes()),
            Value::BulkString(Some(b)) => ctx.consume(b.as_ref()),
            Value::BulkString(None) => {}
            Value::BulkError(Some(b)) => ctx.consume(b.as_ref()),
            Value::BulkError(None) => {}
            Value::Null => {}
            Value::Boolean(b) => ctx.consume([*b as u8]),
            Value::Double(d) => ctx.consume(d.to_le_bytes()),
            Value::Array(items) => {
                for item in items {
                    item.hash_into(ctx);
                }
            }
            Value::Map(pairs) => {
                for (key, value) in pairs {
                    ctx.consume(key);
                    value.hash_into(ctx);
                }
            }
            Value::Set(items) => {
                for item in items {
                    ctx.consume(item.content_hash());
                    item.hash_into(ctx);
                }
            }
        }
    }

    /// Serializes this value to `writer`, recursing into aggregate
    /// children. Does not flush; callers own the flush policy (the
    /// connection pipeline flushes once per command, not once per nested
    /// object).
    #[async_recursion]
    pub async fn write_async<W>(&self, writer: &mut W) -> Result<(), RespError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        match self {
            Value::SimpleString(s) => {
                writer.write_u8(b'+').await?;
                writer.write_all(s.as_bytes()).await?;
                writer.write_all(CRLF).await?;
            }
            Value::SimpleError(s) => {
                writer.write_u8(b'-').await?;
                writer.write_all(s.as_bytes()).await?;
                writer.write_all(CRLF).await?;
            }
            Value::Integer(i) => {
                writer.write_u8(b':').await?;
                writer.write_all(i.to_string().as_bytes()).await?;
                writer.write_all(CRLF).await?;
            }
            Value::BulkString(None) => {
                writer.write_all(b"$-1\r\n").await?;
            }
            Value::BulkString(Some(b)) => {
                writer.write_u8(b'$').await?;
                writer.write_all(b.len().to_string().as_bytes()).await?;
                writer.write_all(CRLF).await?;
                writer.write_all(b).await?;
                writer.write_all(CRLF).await?;
            }
            Value::BulkError(None) => {
                writer.write_all(b"!-1\r\n").await?;
            }
            Value::BulkError(Some(b)) => {
                writer.write_u8(b'!').await?;
                writer.write_all(b.len().to_string().as_bytes()).await?;
                writer.write_all(CRLF).await?;
                writer.write_all(b).await?;
                writer.write_all(CRLF).await?;
            }
            Value::Null => {
                writer.write_all(b"_\r\n").await?;
            }
            Value::Boolean(b) => {
                if *b {
                    writer.write_all(b"#t\r\n").await?;
                } else {
                    writer.write_all(b"#f\r\n").await?;
                }
            }
            Value::Double(d) => {
                writer.write_u8(b',').await?;
                writer.write_all(format_double(*d).as_bytes()).await?;
                writer.write_all(CRLF).await?;
            }
            Value::Array(items) => {
                writer.write_u8(b'*').await?;
                writer.write_all(items.len().to_string().as_bytes()).await?;
                writer.write_all(CRLF).await?;
                for item in items {
                    item.write_async(writer).await?;
                }
            }
            Value::Map(pairs) => {
                writer.write_u8(b'%').await?;
                writer.write_all(pairs.len().to_string().as_bytes()).await?;
                writer.write_all(CRLF).await?;
                for (key, value) in pairs {
                    Value::BulkString(Some(Bytes::copy_from_slice(key)))
                        .write_async(writer)
                        .await?;
                    value.write_async(writer).await?;
                }
            }
            Value::Set(items) => {
                writer.write_u8(b'~').await?;
                writer.write_all(items.len().to_string().as_bytes()).await?;
                writer.write_all(CRLF).await?;
                for item in items {
                    item.write_async(writer).await?;
                }
            }
        }
        Ok(())
    }
}

fn format_double(d: f64) -> String {
    if d.is_nan() {
        "nan".to_string()
    } else if d.is_infinite() {
        if d > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        }
    } else {
        format!("{}", d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_bytes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for b in ALL_LEADINGS {
            assert!(seen.insert(b), "duplicate leading byte {}", b as char);
        }
    }

    #[test]
    fn set_hash_is_variant_tagged() {
        let a = Value::Integer(1);
        let b = Value::SimpleString("\u{1}".to_string());
        // different variants should not be forced to collide by construction
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn set_hash_is_stable() {
        let v = Value::BulkString(Some(Bytes::from_static(b"hello")));
        assert_eq!(v.content_hash(), v.clone().content_hash());
    }

    async fn round_trip(value: &Value) -> Value {
        use crate::resp::{read_value, ReadOutcome};

        let mut buf = Vec::new();
        value.write_async(&mut buf).await.unwrap();
        match read_value(&buf).expect("encoded value should parse") {
            ReadOutcome::Complete(parsed, consumed) => {
                assert_eq!(consumed, buf.len(), "should consume the whole encoding");
                parsed
            }
            ReadOutcome::Incomplete => panic!("expected a complete parse of our own encoding"),
        }
    }

    #[tokio::test]
    async fn simple_string_round_trips() {
        let value = Value::SimpleString("OK".to_string());
        assert_eq!(round_trip(&value).await, value);
    }

    #[tokio::test]
    async fn simple_error_round_trips() {
        let value = Value::SimpleError("ERR oops".to_string());
        assert_eq!(round_trip(&value).await, value);
    }

    #[tokio::test]
    async fn null_round_trips() {
        assert_eq!(round_trip(&Value::Null).await, Value::Null);
    }

    #[tokio::test]
    async fn boolean_round_trips() {
        assert_eq!(round_trip(&Value::Boolean(true)).await, Value::Boolean(true));
        assert_eq!(round_trip(&Value::Boolean(false)).await, Value::Boolean(false));
    }

    #[tokio::test]
    async fn double_round_trips() {
        let value = Value::Double(3.5);
        assert_eq!(round_trip(&value).await, value);

        let negative = Value::Double(-0.25);
        assert_eq!(round_trip(&negative).await, negative);
    }

    #[tokio::test]
    async fn double_special_values_round_trip() {
        assert_eq!(round_trip(&Value::Double(f64::INFINITY)).await, Value::Double(f64::INFINITY));
        assert_eq!(
            round_trip(&Value::Double(f64::NEG_INFINITY)).await,
            Value::Double(f64::NEG_INFINITY)
        );
        match round_trip(&Value::Double(f64::NAN)).await {
            Value::Double(d) => assert!(d.is_nan()),
            other => panic!("expected Value::Double(NaN), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn bulk_error_round_trips() {
        let value = Value::BulkError(Some(Bytes::from_static(b"oops")));
        assert_eq!(round_trip(&value).await, value);
        assert_eq!(round_trip(&Value::BulkError(None)).await, Value::BulkError(None));
    }

    #[tokio::test]
    async fn map_round_trips() {
        let value = Value::Map(vec![
            (b"a".to_vec(), Value::Integer(1)),
            (b"b".to_vec(), Value::SimpleString("x".to_string())),
        ]);
        assert_eq!(round_trip(&value).await, value);
    }

    #[tokio::test]
    async fn set_round_trips() {
        let value = Value::Set(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(round_trip(&value).await, value);
    }
}
