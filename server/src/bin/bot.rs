//! Headless bots that log in, keep themselves alive and wander around the
//! room. Handy for watching the entry page fill up or for load testing.

use clap::Parser;
use futures::{Sink, SinkExt, StreamExt};
use log::{debug, error, info, warn};
use rand::Rng;
use shared::{ClientMessage, Direction, ServerMessage};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

type BotError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Room endpoint to connect to
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:9999/room")]
    server: String,

    /// Number of bots to run
    #[arg(short = 'n', long, default_value = "4")]
    bots: usize,

    /// Display name prefix, bots are numbered from 1
    #[arg(long, default_value = "bot")]
    prefix: String,

    /// Milliseconds between moves
    #[arg(short = 'm', long, default_value = "200", value_parser = clap::value_parser!(u64).range(1..))]
    move_every: u64,

    /// Seconds between pings, keep below the server's liveness timeout
    #[arg(short = 'p', long, default_value = "3", value_parser = clap::value_parser!(u64).range(1..))]
    ping_every: u64,
}

async fn send(
    sink: &mut (impl Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin),
    message: &ClientMessage,
) -> Result<(), BotError> {
    sink.send(Message::text(message.encode()?)).await?;
    Ok(())
}

async fn run_bot(
    url: String,
    name: String,
    move_every: Duration,
    ping_every: Duration,
) -> Result<(), BotError> {
    let (socket, _) = connect_async(url.as_str()).await?;
    let (mut outbound, mut inbound) = socket.split();
    info!("{} connected to {}", name, url);

    send(&mut outbound, &ClientMessage::Login { name: name.clone() }).await?;

    let mut moves = interval(move_every);
    moves.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut pings = interval(ping_every);
    pings.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = moves.tick() => {
                let code: i64 = rand::thread_rng().gen_range(1..=4);
                let message = ClientMessage::Move { direction: Direction::from(code) };
                send(&mut outbound, &message).await?;
            }
            _ = pings.tick() => {
                send(&mut outbound, &ClientMessage::Ping).await?;
            }
            frame = inbound.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match ServerMessage::decode(text.as_str()) {
                        Ok(ServerMessage::LoginSuccess { name: confirmed }) => {
                            info!("{} logged in as {}", name, confirmed);
                        }
                        Ok(message) => debug!("{} received {:?}", name, message),
                        Err(e) => warn!("{} received undecodable frame: {}", name, e),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        info!("{} disconnected by server", name);
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    info!("Starting {} bots against {}", args.bots, args.server);

    let mut handles = Vec::with_capacity(args.bots);
    for n in 1..=args.bots {
        let name = format!("{}{}", args.prefix, n);
        let url = args.server.clone();
        let move_every = Duration::from_millis(args.move_every);
        let ping_every = Duration::from_secs(args.ping_every);

        handles.push(tokio::spawn(async move {
            if let Err(e) = run_bot(url, name.clone(), move_every, ping_every).await {
                error!("{} stopped: {}", name, e);
            }
        }));
    }

    tokio::select! {
        _ = futures::future::join_all(handles) => {
            info!("All bots finished");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping bots...");
        }
    }

    Ok(())
}
