use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;
use std::path::PathBuf;
use std::time::Duration;

/// Main-method of the application.
/// Parses command-line arguments, then serves the room until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "9999")]
        port: u16,
        /// Entry page served at `/`
        #[clap(short, long, default_value = "static/index.html")]
        index: PathBuf,
        /// Seconds between liveness sweeps
        #[clap(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
        liveness_interval: u64,
        /// Seconds of silence before an agent is expired
        #[clap(long, default_value = "10")]
        liveness_timeout: u64,
        /// Largest inbound WebSocket message in bytes
        #[clap(long, default_value = "65536", value_parser = clap::value_parser!(u64).range(1..))]
        max_message_size: u64,
    }

    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        index: args.index,
        liveness_interval: Duration::from_secs(args.liveness_interval),
        liveness_timeout: Duration::from_secs(args.liveness_timeout),
        max_message_size: usize::try_from(args.max_message_size)?,
        ..ServerConfig::default()
    };

    info!("Starting presence server on {}", config.address());
    info!("Entry page: {}", config.index.display());

    let server = Server::new(config).await?;
    server
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down gracefully...");
        })
        .await?;

    Ok(())
}
