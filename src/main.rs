use clap::Parser;
use log::{info, LevelFilter};
use respd::config::Config;
use respd::engine::Engine;
use respd::{replica, server, ErrorT, ResultT};
use simple_logger::SimpleLogger;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A RESP-speaking key/value server: PING, ECHO, GET, SET [PX], and
/// INFO replication, with an optional PING-only follower handshake.
#[derive(Parser, Debug)]
#[command(name = "respd")]
struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    address: String,

    #[arg(long, default_value_t = 6379)]
    port: u16,

    /// Two values consumed by one flag: `--replicaof <host> <port>`.
    #[arg(long, num_args = 2)]
    replicaof: Option<Vec<String>>,
}

impl Cli {
    fn replicaof_host_port(&self) -> Option<(String, i64)> {
        let values = self.replicaof.as_ref()?;
        let host = values.first()?.clone();
        let port: i64 = values.get(1)?.parse().unwrap_or(0);
        Some((host, port))
    }
}

#[tokio::main]
async fn main() -> ResultT<()> {
    let logger = SimpleLogger::new().with_level(LevelFilter::Info);
    logger
        .init()
        .map_err(|err| ErrorT::Syntax(format!("failed to initialize logger: {}", err)))?;

    let cli = Cli::parse();
    let config = Arc::new(Config::new(cli.replicaof_host_port()));
    info!(
        "starting respd as {:?} on {}:{}",
        config.role, cli.address, cli.port
    );

    let shutdown = CancellationToken::new();

    let (engine, engine_handle) = Engine::new(config.clone());
    tokio::spawn(engine.run());

    if config.is_follower() {
        let host = config.replicaof_address.clone();
        let port = config.replicaof_port;
        let replica_shutdown = shutdown.clone();
        tokio::spawn(async move {
            replica::run(host, port, replica_shutdown).await;
        });
    }

    let shutdown_on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received shutdown signal");
            shutdown_on_signal.cancel();
        }
    });

    server::run(&cli.address, cli.port, engine_handle, shutdown)
        .await
        .map_err(ErrorT::from)?;

    Ok(())
}
