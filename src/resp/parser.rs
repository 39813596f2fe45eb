use super::error::RespError;
use super::value::Value;
use bytes::Bytes;
use nom::bytes::streaming::{tag, take, take_till};
use nom::character::complete::{char, digit1};
use nom::combinator::{all_consuming, opt};
use nom::multi::count;
use nom::sequence::{pair, tuple};
use nom::{Err as NomErr, IResult};

/// Result of attempting to read one `Value` from the front of a buffer.
pub enum ReadOutcome {
    /// A complete value was read; `usize` is how many bytes it consumed.
    Complete(Value, usize),
    /// Not enough bytes are buffered yet to know; the caller should read
    /// more from the socket and retry with a larger buffer.
    Incomplete,
}

/// Strips `buf`'s leading byte if it matches `expected`. `None` means "not
/// enough bytes buffered yet to know" (an empty buffer); a present byte
/// that disagrees with `expected` is `UnexpectedLeading`, mirroring the
/// original Go implementation's `readExpected`/`UnexpectedLeadingError`
/// (`examples/original_source/src/model/redis/utils.go:10-19`), which
/// every concrete type's `Read` calls with its own hardcoded leading byte
/// before parsing its body (`basic.go`'s `SimpleString.Read` etc.). Under
/// the top-level `read_value` dispatch below this check always succeeds,
/// since dispatch already matched on the same byte — it is load-bearing
/// only when a variant's reader is invoked directly, exactly as the Go
/// original's per-type unit tests do.
fn consume_leading(buf: &[u8], expected: u8) -> Result<Option<&[u8]>, RespError> {
    match buf.first() {
        None => Ok(None),
        Some(&actual) if actual == expected => Ok(Some(&buf[1..])),
        Some(&actual) => Err(RespError::UnexpectedLeading { expected, actual }),
    }
}

/// Scans for the first CRLF at the front of `buf` via nom's streaming
/// `take_till`/`tag` combinators, distinguishing "not here yet" (more
/// bytes could still complete it) from "never going to be here" (a bare
/// `\n`, or a `\r` not followed by `\n`, appearing before any CRLF).
fn crlf_line(buf: &[u8]) -> Result<Option<(&[u8], usize)>, RespError> {
    let scan: IResult<&[u8], &[u8]> = take_till(|b: u8| b == b'\r' || b == b'\n')(buf);
    let (after_line, line) = match scan {
        Ok(pair) => pair,
        Err(NomErr::Incomplete(_)) => return Ok(None),
        Err(_) => unreachable!("take_till only ever reports Incomplete"),
    };
    if after_line.first() == Some(&b'\n') {
        return Err(RespError::UnexpectedTailing);
    }
    let terminated: IResult<&[u8], &[u8]> = tag(&b"\r\n"[..])(after_line);
    match terminated {
        Ok((rest, _)) => Ok(Some((line, buf.len() - rest.len()))),
        Err(NomErr::Incomplete(_)) => Ok(None),
        Err(_) => Err(RespError::UnexpectedTailing),
    }
}

fn parse_i64(input: &str) -> IResult<&str, i64> {
    let (rest, (sign, digits)) = tuple((opt(char('-')), digit1))(input)?;
    let mut combined = String::with_capacity(digits.len() + 1);
    if sign.is_some() {
        combined.push('-');
    }
    combined.push_str(digits);
    let value: i64 = combined
        .parse()
        .map_err(|_| nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Digit)))?;
    Ok((rest, value))
}

fn parse_i64_line(line: &str) -> Result<i64, RespError> {
    all_consuming(parse_i64)(line)
        .map(|(_, v)| v)
        .map_err(|_| RespError::Syntax(format!("not an integer: {:?}", line)))
}

fn parse_f64_line(line: &str) -> Result<f64, RespError> {
    match line {
        "inf" => Ok(f64::INFINITY),
        "-inf" => Ok(f64::NEG_INFINITY),
        "nan" => Ok(f64::NAN),
        _ => line
            .parse::<f64>()
            .map_err(|_| RespError::Syntax(format!("not a double: {:?}", line))),
    }
}

/// Reads one line terminated by CRLF (not including the CRLF), returning
/// the line as a UTF-8 `&str` plus the total bytes consumed (line + CRLF),
/// or `None` if the line isn't fully buffered yet.
fn read_line(buf: &[u8]) -> Result<Option<(&str, usize)>, RespError> {
    match crlf_line(buf)? {
        None => Ok(None),
        Some((line, consumed)) => {
            let line = std::str::from_utf8(line)
                .map_err(|_| RespError::Syntax("line is not valid UTF-8".to_string()))?;
            Ok(Some((line, consumed)))
        }
    }
}

/// Reads one `Value` from the front of `buf`. `buf[0]` selects which
/// variant reader runs; each reader re-validates that same byte against
/// its own expected leading via `consume_leading` (see its docs).
pub fn read_value(buf: &[u8]) -> Result<ReadOutcome, RespError> {
    if buf.is_empty() {
        return Ok(ReadOutcome::Incomplete);
    }
    match buf[0] {
        b'+' => read_simple_string(buf),
        b'-' => read_simple_error(buf),
        b':' => read_integer(buf),
        b'$' => read_bulk_string(buf),
        b'!' => read_bulk_error(buf),
        b'_' => read_null(buf),
        b'#' => read_boolean(buf),
        b',' => read_double(buf),
        b'*' => read_array(buf),
        b'%' => read_map(buf),
        b'~' => read_set(buf),
        other => Err(RespError::Syntax(format!(
            "unrecognized leading byte {} ('{}')",
            other, other as char
        ))),
    }
}

fn finish(value: Value, body_consumed: usize) -> ReadOutcome {
    ReadOutcome::Complete(value, body_consumed + 1)
}

fn read_simple_string(buf: &[u8]) -> Result<ReadOutcome, RespError> {
    let body = match consume_leading(buf, b'+')? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(body) => body,
    };
    match read_line(body)? {
        None => Ok(ReadOutcome::Incomplete),
        Some((line, consumed)) => Ok(finish(Value::SimpleString(line.to_string()), consumed)),
    }
}

fn read_simple_error(buf: &[u8]) -> Result<ReadOutcome, RespError> {
    let body = match consume_leading(buf, b'-')? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(body) => body,
    };
    match read_line(body)? {
        None => Ok(ReadOutcome::Incomplete),
        Some((line, consumed)) => Ok(finish(Value::SimpleError(line.to_string()), consumed)),
    }
}

fn read_integer(buf: &[u8]) -> Result<ReadOutcome, RespError> {
    let body = match consume_leading(buf, b':')? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(body) => body,
    };
    match read_line(body)? {
        None => Ok(ReadOutcome::Incomplete),
        Some((line, consumed)) => {
            let value = parse_i64_line(line)?;
            Ok(finish(Value::Integer(value), consumed))
        }
    }
}

fn read_bulk_string(buf: &[u8]) -> Result<ReadOutcome, RespError> {
    let body = match consume_leading(buf, b'$')? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(body) => body,
    };
    read_bulk_payload(body).map(|outcome| match outcome {
        BulkOutcome::Incomplete => ReadOutcome::Incomplete,
        BulkOutcome::Complete(payload, consumed) => {
            finish(Value::BulkString(payload), consumed)
        }
    })
}

fn read_bulk_error(buf: &[u8]) -> Result<ReadOutcome, RespError> {
    let body = match consume_leading(buf, b'!')? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(body) => body,
    };
    read_bulk_payload(body).map(|outcome| match outcome {
        BulkOutcome::Incomplete => ReadOutcome::Incomplete,
        BulkOutcome::Complete(payload, consumed) => {
            finish(Value::BulkError(payload), consumed)
        }
    })
}

enum BulkOutcome {
    Incomplete,
    Complete(Option<Bytes>, usize),
}

/// Shared body of BulkString/BulkError (leading byte already consumed by
/// the caller): a length line, then that many raw bytes via nom's
/// streaming `take`, then a trailing CRLF via streaming `tag`. Length
/// `-1` is the null form and has no payload or trailing CRLF to read.
fn read_bulk_payload(body: &[u8]) -> Result<BulkOutcome, RespError> {
    let (len_line, after_len) = match read_line(body)? {
        None => return Ok(BulkOutcome::Incomplete),
        Some(found) => found,
    };
    let len = parse_i64_line(len_line)?;
    if len == -1 {
        return Ok(BulkOutcome::Complete(None, after_len));
    }
    if len < 0 {
        return Err(RespError::Syntax(format!("negative bulk length {}", len)));
    }
    let rest = &body[after_len..];
    let payload_read: IResult<&[u8], &[u8]> = take(len as usize)(rest);
    let (after_payload, payload_bytes) = match payload_read {
        Ok(pair) => pair,
        Err(NomErr::Incomplete(_)) => return Ok(BulkOutcome::Incomplete),
        Err(_) => unreachable!("take only ever reports Incomplete"),
    };
    let crlf_read: IResult<&[u8], &[u8]> = tag(&b"\r\n"[..])(after_payload);
    match crlf_read {
        Ok((after_crlf, _)) => {
            let consumed = body.len() - after_crlf.len();
            Ok(BulkOutcome::Complete(
                Some(Bytes::copy_from_slice(payload_bytes)),
                consumed,
            ))
        }
        Err(NomErr::Incomplete(_)) => Ok(BulkOutcome::Incomplete),
        Err(_) => Err(RespError::UnexpectedTailing),
    }
}

fn read_null(buf: &[u8]) -> Result<ReadOutcome, RespError> {
    let body = match consume_leading(buf, b'_')? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(body) => body,
    };
    match read_line(body)? {
        None => Ok(ReadOutcome::Incomplete),
        Some((line, consumed)) => {
            if !line.is_empty() {
                return Err(RespError::Syntax(format!(
                    "null must have an empty body, got {:?}",
                    line
                )));
            }
            Ok(finish(Value::Null, consumed))
        }
    }
}

fn read_boolean(buf: &[u8]) -> Result<ReadOutcome, RespError> {
    let body = match consume_leading(buf, b'#')? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(body) => body,
    };
    match read_line(body)? {
        None => Ok(ReadOutcome::Incomplete),
        Some((line, consumed)) => {
            let value = match line {
                "t" => true,
                "f" => false,
                other => {
                    return Err(RespError::Syntax(format!(
                        "boolean body must be 't' or 'f', got {:?}",
                        other
                    )))
                }
            };
            Ok(finish(Value::Boolean(value), consumed))
        }
    }
}

fn read_double(buf: &[u8]) -> Result<ReadOutcome, RespError> {
    let body = match consume_leading(buf, b',')? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(body) => body,
    };
    match read_line(body)? {
        None => Ok(ReadOutcome::Incomplete),
        Some((line, consumed)) => {
            let value = parse_f64_line(line)?;
            Ok(finish(Value::Double(value), consumed))
        }
    }
}

/// Adapts `read_value` into a nom streaming parser so aggregate readers
/// can drive it with `nom::multi::count` instead of a hand-rolled offset
/// loop. Our own `RespError` rides through `nom::Err::Failure` untouched;
/// `nom::Err::Error` never occurs since `read_value` has no "backtrack and
/// try another alternative" case for callers of this adapter to react to.
struct ValueParseError(RespError);

impl<'a> nom::error::ParseError<&'a [u8]> for ValueParseError {
    fn from_error_kind(_input: &'a [u8], kind: nom::error::ErrorKind) -> Self {
        ValueParseError(RespError::Syntax(format!("nom error: {:?}", kind)))
    }
    fn append(_input: &'a [u8], _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

fn value_parser(buf: &[u8]) -> IResult<&[u8], Value, ValueParseError> {
    match read_value(buf) {
        Ok(ReadOutcome::Complete(value, consumed)) => Ok((&buf[consumed..], value)),
        Ok(ReadOutcome::Incomplete) => Err(NomErr::Incomplete(nom::Needed::Unknown)),
        Err(err) => Err(NomErr::Failure(ValueParseError(err))),
    }
}

fn unwrap_value_parse_error(err: NomErr<ValueParseError>) -> RespError {
    match err {
        NomErr::Failure(ValueParseError(err)) | NomErr::Error(ValueParseError(err)) => err,
        NomErr::Incomplete(_) => unreachable!("caller already matched Incomplete separately"),
    }
}

fn read_array(buf: &[u8]) -> Result<ReadOutcome, RespError> {
    let body = match consume_leading(buf, b'*')? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(body) => body,
    };
    let (len_line, after_len) = match read_line(body)? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(found) => found,
    };
    let element_count = parse_count(len_line)?;
    let rest = &body[after_len..];
    match count(value_parser, element_count)(rest) {
        Ok((after_items, items)) => {
            let body_consumed = after_len + (rest.len() - after_items.len());
            Ok(finish(Value::Array(items), body_consumed))
        }
        Err(NomErr::Incomplete(_)) => Ok(ReadOutcome::Incomplete),
        Err(err) => Err(unwrap_value_parse_error(err)),
    }
}

fn read_map(buf: &[u8]) -> Result<ReadOutcome, RespError> {
    let body = match consume_leading(buf, b'%')? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(body) => body,
    };
    let (len_line, after_len) = match read_line(body)? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(found) => found,
    };
    let pair_count = parse_count(len_line)?;
    let rest = &body[after_len..];
    match count(pair(value_parser, value_parser), pair_count)(rest) {
        Ok((after_items, raw_pairs)) => {
            let mut pairs = Vec::with_capacity(raw_pairs.len());
            let mut seen: std::collections::HashSet<Vec<u8>> = std::collections::HashSet::new();
            for (key_value, value) in raw_pairs {
                let key_bytes = match &key_value {
                    Value::SimpleString(s) => s.clone().into_bytes(),
                    Value::BulkString(Some(b)) => b.to_vec(),
                    other => {
                        return Err(RespError::Syntax(format!(
                            "map key must be SimpleString or BulkString, got leading '{}'",
                            other.leading() as char
                        )))
                    }
                };
                if !seen.insert(key_bytes.clone()) {
                    return Err(RespError::Syntax("duplicate key in map".to_string()));
                }
                pairs.push((key_bytes, value));
            }
            let body_consumed = after_len + (rest.len() - after_items.len());
            Ok(finish(Value::Map(pairs), body_consumed))
        }
        Err(NomErr::Incomplete(_)) => Ok(ReadOutcome::Incomplete),
        Err(err) => Err(unwrap_value_parse_error(err)),
    }
}

fn read_set(buf: &[u8]) -> Result<ReadOutcome, RespError> {
    let body = match consume_leading(buf, b'~')? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(body) => body,
    };
    let (len_line, after_len) = match read_line(body)? {
        None => return Ok(ReadOutcome::Incomplete),
        Some(found) => found,
    };
    let element_count = parse_count(len_line)?;
    let rest = &body[after_len..];
    match count(value_parser, element_count)(rest) {
        Ok((after_items, raw_items)) => {
            let mut items = Vec::with_capacity(raw_items.len());
            let mut seen: std::collections::HashSet<[u8; 16]> = std::collections::HashSet::new();
            for value in raw_items {
                if !seen.insert(value.content_hash()) {
                    return Err(RespError::Syntax("duplicate member in set".to_string()));
                }
                items.push(value);
            }
            let body_consumed = after_len + (rest.len() - after_items.len());
            Ok(finish(Value::Set(items), body_consumed))
        }
        Err(NomErr::Incomplete(_)) => Ok(ReadOutcome::Incomplete),
        Err(err) => Err(unwrap_value_parse_error(err)),
    }
}

fn parse_count(line: &str) -> Result<usize, RespError> {
    let value = parse_i64_line(line)?;
    if value < 0 {
        return Err(RespError::Syntax(format!("negative count {}", value)));
    }
    Ok(value as usize)
}
