use crate::connection::handle_connection;
use crate::engine::EngineHandle;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Binds `(address, port)` and accepts connections until either the
/// listener errors or shutdown is requested, spawning one task per
/// connection (grounded on the teacher's `main.rs` accept loop and
/// `RedisServer`/`ClientConnection` pairing; a per-connection panic stays
/// isolated to its own `tokio::spawn`'d task, matching the Go original's
/// panic-recovering `HandleConnection`).
pub async fn run(
    address: &str,
    port: u16,
    engine: EngineHandle,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind((address, port)).await?;
    log::info!("listening on {}:{}", address, port);

    loop {
        if shutdown.is_cancelled() {
            log::info!("accept loop stopping: server is shutting down");
            return Ok(());
        }

        let (stream, peer) = listener.accept().await?;
        log::debug!("accepted connection from {}", peer);

        let engine = engine.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            handle_connection(stream, engine, shutdown).await;
        });
    }
}
