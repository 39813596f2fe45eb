use crate::command::parse_command;
use crate::engine::EngineHandle;
use crate::resp::{read_value, ReadOutcome, RespError, Value};
use bytes::BytesMut;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{span, Level};

const READ_CHUNK: usize = 4096;

/// Runs one connection's request/response loop to completion: read a
/// command, execute it through the engine, write the response, repeat.
/// Returns only when the connection ends, whether by peer disconnect,
/// protocol/execution error, or server shutdown (grounded on the
/// teacher's `ClientConnection` loop in `rdis::types`/`main.rs`, adapted
/// to one command per iteration rather than the teacher's pipelined
/// batch read).
pub async fn handle_connection(
    mut stream: TcpStream,
    engine: EngineHandle,
    shutdown: CancellationToken,
) {
    let peer = stream.peer_addr().ok();
    let mut buf = BytesMut::new();
    loop {
        if shutdown.is_cancelled() {
            log::debug!("connection {:?} closing: server is stopping", peer);
            return;
        }

        let before_read = Instant::now();
        let command_value = match read_one_command(&mut stream, &mut buf).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                log::debug!("connection {:?} closed by peer", peer);
                return;
            }
            Err(err) => {
                log::warn!("connection {:?} parse error: {}", peer, err);
                write_error_frame(&mut stream, &err).await;
                return;
            }
        };
        let span = span!(Level::INFO, "command received");
        let _guard = span.enter();
        log::debug!(
            "connection {:?} read in {}us",
            peer,
            before_read.elapsed().as_micros()
        );

        match run_command(&command_value, &engine).await {
            Ok(response) => {
                if let Err(err) = respond(&mut stream, &response).await {
                    log::warn!("connection {:?} write failed: {}", peer, err);
                    return;
                }
            }
            Err(err) => {
                log::warn!("connection {:?} execution error: {}", peer, err);
                write_error_frame(&mut stream, &err).await;
                return;
            }
        }
    }
}

async fn run_command(value: &Value, engine: &EngineHandle) -> Result<Value, RespError> {
    let command = parse_command(value)?;
    engine.dispatch(command).await
}

async fn respond(stream: &mut TcpStream, value: &Value) -> Result<(), RespError> {
    value.write_async(stream).await?;
    stream.flush().await?;
    Ok(())
}

/// Reads from the socket until a complete RESP value is buffered,
/// growing `buf` as needed. Returns `Ok(None)` only on a clean
/// end-of-stream with nothing partially buffered; a peer that vanishes
/// mid-command is an I/O error, not a clean close.
async fn read_one_command(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
) -> Result<Option<Value>, RespError> {
    loop {
        if !buf.is_empty() {
            match read_value(buf)? {
                ReadOutcome::Complete(value, consumed) => {
                    let _ = buf.split_to(consumed);
                    return Ok(Some(value));
                }
                ReadOutcome::Incomplete => {}
            }
        }
        let mut chunk = [0u8; READ_CHUNK];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(RespError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed mid-command",
            )));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

async fn write_error_frame(stream: &mut TcpStream, err: &RespError) {
    let frame = Value::SimpleError(format!("ERR {}", err));
    if let Err(write_err) = frame.write_async(stream).await {
        log::warn!("failed to write error frame: {}", write_err);
        return;
    }
    let _ = stream.flush().await;
}
