//! HTTP front door: the static entry page and the WebSocket upgrade
//! endpoint that turns each connection into a room agent.

use crate::agent::Agent;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::liveness::spawn_liveness_monitor;
use crate::room::{Room, RoomHandle};
use crate::session::{read_duty, write_duty, Frame};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
struct AppState {
    room: RoomHandle,
    index: Arc<PathBuf>,
    max_message_size: usize,
}

/// Builds the router: `/` serves the entry page, `/room` upgrades.
pub fn build_router(room: RoomHandle, config: &ServerConfig) -> Router {
    let state = AppState {
        room,
        index: Arc::new(config.index.clone()),
        max_message_size: config.max_message_size,
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/room", get(room_handler))
        .with_state(state)
}

async fn index_handler(State(state): State<AppState>) -> Response {
    // Read per request so the page can be edited without a restart.
    match tokio::fs::read_to_string(state.index.as_ref()).await {
        Ok(content) => Html(content).into_response(),
        Err(e) => {
            warn!("Could not open {}: {}", state.index.display(), e);
            (StatusCode::NOT_FOUND, "entry page not found").into_response()
        }
    }
}

async fn room_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state.room))
}

/// Drives one connection: admission, then the read duty on this task and the
/// write duty on its own.
async fn handle_socket(socket: WebSocket, room: RoomHandle) {
    let agent = Arc::new(Agent::spawn());
    let Some(outbox) = room.join(Arc::clone(&agent)).await else {
        warn!("Rejecting connection: room coordinator is not running");
        return;
    };

    let (sender, receiver) = socket.split();
    let outbound = sender.with(|text: String| async move {
        Ok::<_, axum::Error>(Message::Text(text.into()))
    });

    let writer = {
        let agent = Arc::clone(&agent);
        tokio::spawn(async move { write_duty(&agent, outbox, outbound).await })
    };

    read_duty(&agent, &room, receiver.map(to_frame)).await;

    // The leave request closes the outbox, which ends the writer.
    let _ = writer.await;
    debug!("Agent {}: connection closed", agent.id());
}

fn to_frame(message: Result<Message, axum::Error>) -> Frame {
    match message {
        Ok(Message::Text(text)) => Frame::Text(text.as_str().to_owned()),
        Ok(Message::Binary(bytes)) => Frame::Text(String::from_utf8_lossy(&bytes).into_owned()),
        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => Frame::Heartbeat,
        Ok(Message::Close(_)) => Frame::Closed,
        Err(e) => {
            debug!("WebSocket read failed: {}", e);
            Frame::Closed
        }
    }
}

/// The presence server: a bound listener plus its configuration
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until `shutdown` resolves.
    ///
    /// Starts the room coordinator and the liveness monitor; both stop with
    /// the server.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (room, coordinator) = Room::new().spawn();
        let monitor = spawn_liveness_monitor(
            room.clone(),
            self.config.liveness_interval,
            self.config.liveness_timeout,
        );

        let router = build_router(room, &self.config);
        info!("Server started successfully");

        let result = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        monitor.abort();
        coordinator.abort();
        info!("Server shutting down");

        result?;
        Ok(())
    }
}
