use crate::command::send_ping_and_verify;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

const RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Background task run by a follower (`role = slave`): dial the master,
/// send PING, verify `+PONG`, and retry forever on any failure. Nothing
/// beyond the PING liveness check is attempted — no `REPLCONF`/`PSYNC` —
/// matching this crate's deliberately narrow replication scope (grounded
/// on `rdis`'s absence of any replica logic, generalized from the
/// handshake shape in the `frextrite-codecrafters-redis-rust` and
/// `pykulytsky-redis-challenge` examples).
pub async fn run(host: String, port: i64, shutdown: CancellationToken) {
    let target = format_target(&host, port);
    loop {
        if shutdown.is_cancelled() {
            log::info!("follower handshake stopping: server is shutting down");
            return;
        }

        match attempt_handshake(&target).await {
            Ok(()) => {
                log::info!("follower handshake to {} succeeded", target);
                return;
            }
            Err(err) => {
                log::info!(
                    "follower handshake to {} failed ({}), retrying in {:?}",
                    target,
                    err,
                    RETRY_INTERVAL
                );
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(RETRY_INTERVAL) => {}
            _ = shutdown.cancelled() => {
                log::info!("follower handshake stopping mid-retry: server is shutting down");
                return;
            }
        }
    }
}

async fn attempt_handshake(target: &str) -> std::io::Result<()> {
    let mut stream = TcpStream::connect(target).await?;
    send_ping_and_verify(&mut stream)
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err.to_string()))
}

/// Bracketed per RFC 3986 for literal IPv6 hosts (anything containing
/// `:`), so `host:port` stays unambiguous for `TcpStream::connect`'s
/// socket-address parser.
fn format_target(host: &str, port: i64) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_host_is_not_bracketed() {
        assert_eq!(format_target("127.0.0.1", 6380), "127.0.0.1:6380");
    }

    #[test]
    fn ipv6_host_is_bracketed() {
        assert_eq!(format_target("::1", 6380), "[::1]:6380");
    }

    #[tokio::test]
    async fn handshake_succeeds_against_a_fake_master() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            use tokio::io::{AsyncReadExt, AsyncWriteExt};
            let mut buf = [0u8; 32];
            let n = stream.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"*1\r\n+PING\r\n");
            stream.write_all(b"+PONG\r\n").await.unwrap();
        });

        let result = attempt_handshake(&addr.to_string()).await;
        assert!(result.is_ok());
        server.await.unwrap();
    }
}
