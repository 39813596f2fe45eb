use super::Command;
use crate::config::Config;
use crate::resp::{RespError, Value, STRING_CAPABLE_LEADINGS};
use crate::store::Store;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Default)]
pub struct Ping;

impl Command for Ping {
    fn read(&mut self, args: &[Value]) -> Result<(), RespError> {
        if args.len() != 1 {
            return Err(RespError::Syntax(
                "PING accepts exactly one element".to_string(),
            ));
        }
        Ok(())
    }

    fn execute(&self, _store: &mut Store, _config: &Config, _now_ms: i64) -> Value {
        Value::SimpleString("PONG".to_string())
    }
}

/// The follower handshake's liveness probe. Writes the literal bytes
/// `*1\r\n+PING\r\n` (a one-element array carrying a SimpleString rather
/// than the BulkString a normal client command would use — this is a
/// distinct wire exchange from ordinary command dispatch, not a client
/// request) and waits for a string-capable reply equal to `PONG`.
pub async fn send_ping_and_verify<S>(stream: &mut S) -> Result<(), RespError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(b"*1\r\n+PING\r\n").await?;
    stream.flush().await?;

    let mut buf: Vec<u8> = Vec::with_capacity(64);
    loop {
        if !buf.is_empty() {
            let leading = buf[0];
            if !STRING_CAPABLE_LEADINGS.contains(&leading) {
                return Err(RespError::Syntax(format!(
                    "PING reply leading byte '{}' is not string-capable",
                    leading as char
                )));
            }
            match crate::resp::read_value(&buf)? {
                crate::resp::ReadOutcome::Complete(value, _) => {
                    let text = value.as_string().ok_or_else(|| {
                        RespError::Syntax("PING reply is not string-capable".to_string())
                    })?;
                    if text != "PONG" {
                        return Err(RespError::Syntax(format!(
                            "expected PONG, got {:?}",
                            text
                        )));
                    }
                    return Ok(());
                }
                crate::resp::ReadOutcome::Incomplete => {}
            }
        }
        let mut chunk = [0u8; 256];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(RespError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "upstream closed before replying to PING",
            )));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}
