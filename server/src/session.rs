//! The two duties every connected agent runs.
//!
//! The read duty turns inbound frames into room calls and requests the
//! agent's removal when the transport goes away. The write duty drains the
//! agent's outbox into the transport until the coordinator closes it.
//!
//! Both are generic over `futures` streams and sinks so they can be driven
//! without a real socket.

use crate::agent::Agent;
use crate::room::{OutboxReceiver, RoomHandle};
use futures::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, info, warn};
use shared::{ClientMessage, ServerMessage};
use std::fmt::Display;
use std::pin::pin;

/// One inbound transport event, already stripped of framing details
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Transport-level keepalive (WebSocket ping/pong).
    Heartbeat,
    Closed,
}

/// Runs until the transport closes, then asks the room to remove the agent.
pub async fn read_duty<S>(agent: &Agent, room: &RoomHandle, inbound: S)
where
    S: Stream<Item = Frame>,
{
    let mut inbound = pin!(inbound);

    while let Some(frame) = inbound.next().await {
        match frame {
            Frame::Text(text) => {
                agent.refresh_last_seen();
                match ClientMessage::decode(&text) {
                    Ok(message) => apply(agent, room, message),
                    Err(e) => debug!("Agent {}: discarding malformed frame: {}", agent.id(), e),
                }
            }
            Frame::Heartbeat => agent.refresh_last_seen(),
            Frame::Closed => break,
        }
    }

    debug!("Agent {}: read duty finished", agent.id());
    room.leave(agent.id());
}

/// Forwards outbox payloads in order until the outbox closes or a send fails.
pub async fn write_duty<K>(agent: &Agent, mut outbox: OutboxReceiver, outbound: K)
where
    K: Sink<String>,
    K::Error: Display,
{
    let mut outbound = pin!(outbound);

    while let Some(payload) = outbox.recv().await {
        if let Err(e) = outbound.send(payload).await {
            debug!("Agent {}: write failed: {}", agent.id(), e);
            break;
        }
    }

    let _ = outbound.close().await;
    debug!("Agent {}: write duty finished", agent.id());
}

/// Applies one decoded client action.
pub fn apply(agent: &Agent, room: &RoomHandle, message: ClientMessage) {
    match message {
        // Last-seen was already refreshed on receipt.
        ClientMessage::Ping => {}
        ClientMessage::Login { name } => login(agent, room, name),
        ClientMessage::Move { direction } => {
            if let Some(next) = agent.position().step(direction) {
                agent.set_position(next);
                room.broadcast(&ServerMessage::Move {
                    name: agent.name().to_string(),
                    x: next.x,
                    y: next.y,
                });
            }
        }
        ClientMessage::Unknown => debug!("Agent {}: ignoring unknown action", agent.id()),
    }
}

/// Login sequence: bind the name, confirm it to the agent, send it the
/// roster, then announce it to everyone.
///
/// Every step goes through the single room intake, so the confirmation always
/// reaches the agent before anything describing other arrivals.
fn login(agent: &Agent, room: &RoomHandle, name: String) {
    if !agent.set_name(name) {
        warn!(
            "Agent {}: ignoring second login, already named {:?}",
            agent.id(),
            agent.name()
        );
        return;
    }

    let name = agent.name();
    info!("Agent {} logged in as {:?}", agent.id(), name);

    room.bind_name(agent.id());
    room.send_to(
        name,
        &ServerMessage::LoginSuccess {
            name: name.to_string(),
        },
    );
    room.send_roster(name);

    let position = agent.position();
    room.broadcast(&ServerMessage::Login {
        name: name.to_string(),
        x: position.x,
        y: position.y,
        color: agent.color().to_string(),
    });
}
