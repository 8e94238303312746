//! # Presence Server Library
//!
//! This library provides a real-time presence server for a single shared
//! space. Clients connect over a WebSocket, log in with a display name and
//! move around a 450×450 grid; every position change is broadcast to every
//! other connected client.
//!
//! ## Core Responsibilities
//!
//! ### Room Coordination
//! The room coordinator is the only component that mutates membership. Joins,
//! leaves, name bindings, broadcasts and directed messages all arrive as
//! events on one channel and are applied strictly in arrival order, which
//! gives every client a consistent view of who is present.
//!
//! ### Agent Lifecycle
//! Each connection becomes an agent with two duties:
//! - A read duty that decodes inbound frames and turns them into room calls
//! - A write duty that drains the agent's outbox into the socket
//!
//! When the read duty ends (socket closed or failed) it requests the agent's
//! removal; the coordinator then closes the outbox, which ends the write duty.
//!
//! ### Liveness
//! A monitor task periodically expires agents that have sent nothing for
//! longer than the configured timeout. Expiry goes through the same event
//! channel as everything else, so it cannot race a concurrent login or logout.
//!
//! ## Architecture Design
//!
//! ### Message-Passing Actor
//! The coordinator owns the member table, the name index and the color
//! counter outright. Nothing else holds a reference to them, so no lock is
//! needed. Per-agent fields that other tasks read (position, name, color,
//! last-seen) are atomics or write-once cells with exactly one writer each.
//!
//! ### Non-Blocking Fan-Out
//! Outboxes are unbounded channels. Delivering a broadcast is a plain enqueue
//! per member, so one slow client can never stall the coordinator.
//!
//! ## Module Organization
//!
//! ### Agent Module (`agent`)
//! Per-connection state: identity, position, color and last-seen time.
//!
//! ### Room Module (`room`)
//! The coordinator event loop and the cloneable [`room::RoomHandle`] used to
//! reach it.
//!
//! ### Session Module (`session`)
//! The read and write duties and the protocol actions (ping, login, move).
//!
//! ### Liveness Module (`liveness`)
//! Periodic expiry of silent agents.
//!
//! ### Network Module (`network`)
//! The axum router serving the entry page and the WebSocket upgrade, and the
//! [`network::Server`] that wires everything together.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::new(ServerConfig::default()).await?;
//!
//!     // Serves `/` and `/room` until ctrl-c:
//!     // - starts the room coordinator
//!     // - starts the liveness monitor
//!     // - spawns a read and a write task per connection
//!     server
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod liveness;
pub mod network;
pub mod room;
pub mod session;
