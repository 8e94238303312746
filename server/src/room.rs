//! The room coordinator: sole owner of membership and the name index
//!
//! All mutations arrive as [`RoomEvent`]s on one unbounded channel and are
//! applied one at a time by [`Room::run`]. Producers (agent duties, the
//! liveness monitor) only ever hold a [`RoomHandle`], so there is no shared
//! mutable state to lock.
//!
//! Each member's outbox sender lives only here. Dropping it on removal closes
//! the outbox, which is how the agent's write duty learns it must stop.

use crate::agent::{Agent, AgentId};
use log::{debug, error, info, warn};
use shared::{palette_color, ServerMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Producing end of an agent's outbox.
pub type Outbox = mpsc::UnboundedSender<String>;
/// Consuming end of an agent's outbox, drained by the write duty.
pub type OutboxReceiver = mpsc::UnboundedReceiver<String>;

/// A payload destined for exactly one named agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectedMessage {
    pub target: String,
    pub payload: String,
}

/// Requests processed by the coordinator, in arrival order
#[derive(Debug)]
pub enum RoomEvent {
    /// Admits the agent and replies with its outbox once its color is set.
    Join {
        agent: Arc<Agent>,
        admitted: oneshot::Sender<OutboxReceiver>,
    },
    Leave {
        id: AgentId,
    },
    Broadcast {
        payload: String,
    },
    Direct(DirectedMessage),
    /// Indexes the agent under the name it has already recorded.
    BindName {
        id: AgentId,
    },
    /// Sends `target` one login entry per named member.
    Roster {
        target: String,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<Arc<Agent>>>,
    },
}

struct Member {
    agent: Arc<Agent>,
    outbox: Outbox,
}

impl Member {
    fn deliver(&self, payload: String) {
        // A closed receiver means the write duty already quit on a transport
        // fault; its read duty will request removal on its own.
        if self.outbox.send(payload).is_err() {
            debug!("Dropped message for agent {}: outbox closed", self.agent.id());
        }
    }
}

/// Membership set, name index and palette counter
pub struct Room {
    members: HashMap<AgentId, Member>,
    by_name: HashMap<String, AgentId>,
    next_color_index: usize,
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}

impl Room {
    pub fn new() -> Self {
        Self {
            members: HashMap::new(),
            by_name: HashMap::new(),
            next_color_index: 0,
        }
    }

    /// Starts the coordinator loop on its own task.
    pub fn spawn(self) -> (RoomHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(rx));
        (RoomHandle { tx }, task)
    }

    /// Applies events until every [`RoomHandle`] has been dropped.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<RoomEvent>) {
        info!("Room coordinator started");
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        info!("Room coordinator stopped with {} members", self.members.len());
    }

    pub fn handle(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::Join { agent, admitted } => self.admit(agent, admitted),
            RoomEvent::Leave { id } => {
                self.remove(id);
            }
            RoomEvent::Broadcast { payload } => self.broadcast(&payload),
            RoomEvent::Direct(message) => self.send_to(message),
            RoomEvent::BindName { id } => self.bind_name(id),
            RoomEvent::Roster { target } => self.send_roster(&target),
            RoomEvent::Snapshot { reply } => {
                let _ = reply.send(self.agents());
            }
        }
    }

    fn admit(&mut self, agent: Arc<Agent>, admitted: oneshot::Sender<OutboxReceiver>) {
        agent.assign_color(palette_color(self.next_color_index));
        self.next_color_index += 1;

        let id = agent.id();
        let (outbox, receiver) = mpsc::unbounded_channel();
        info!(
            "Agent {} joined with color {} ({} members)",
            id,
            agent.color(),
            self.members.len() + 1
        );
        self.members.insert(id, Member { agent, outbox });

        // Nobody is left to run the agent's duties, so nobody would ever
        // request its removal either.
        if admitted.send(receiver).is_err() {
            warn!("Agent {} disconnected before admission completed", id);
            self.remove(id);
        }
    }

    /// Removes a member, notifying everyone else. Returns false if the agent
    /// was not a member, in which case nothing happens.
    fn remove(&mut self, id: AgentId) -> bool {
        let Some(member) = self.members.remove(&id) else {
            debug!("Ignoring removal of agent {}: not a member", id);
            return false;
        };

        let name = member.agent.name();
        let logout = ServerMessage::Logout {
            name: name.to_string(),
        };
        if let Some(payload) = encode(&logout) {
            for other in self.members.values() {
                other.deliver(payload.clone());
            }
        }

        // A later login under the same name may own the entry by now.
        if self.by_name.get(name) == Some(&id) {
            self.by_name.remove(name);
        }

        info!(
            "Agent {} ({}) left ({} members)",
            id,
            if name.is_empty() { "anonymous" } else { name },
            self.members.len()
        );
        // Dropping `member` drops the only outbox sender.
        true
    }

    fn broadcast(&self, payload: &str) {
        for member in self.members.values() {
            member.deliver(payload.to_string());
        }
    }

    fn send_to(&self, message: DirectedMessage) {
        match self.member_named(&message.target) {
            Some(member) => member.deliver(message.payload),
            None => debug!("Dropped message for unknown name {:?}", message.target),
        }
    }

    fn bind_name(&mut self, id: AgentId) {
        let Some(member) = self.members.get(&id) else {
            return;
        };
        if !member.agent.is_named() {
            return;
        }

        let name = member.agent.name().to_string();
        if let Some(previous) = self.by_name.insert(name.clone(), id) {
            if previous != id {
                info!("Name {:?} moved from agent {} to agent {}", name, previous, id);
            }
        }
    }

    fn send_roster(&self, target: &str) {
        let Some(recipient) = self.member_named(target) else {
            debug!("Dropped roster for unknown name {:?}", target);
            return;
        };

        for id in self.by_name.values() {
            let Some(member) = self.members.get(id) else {
                continue;
            };
            let agent = &member.agent;
            let position = agent.position();
            let entry = ServerMessage::Login {
                name: agent.name().to_string(),
                x: position.x,
                y: position.y,
                color: agent.color().to_string(),
            };
            if let Some(payload) = encode(&entry) {
                recipient.deliver(payload);
            }
        }
    }

    fn member_named(&self, name: &str) -> Option<&Member> {
        self.by_name.get(name).and_then(|id| self.members.get(id))
    }

    /// Handles to every current member.
    pub fn agents(&self) -> Vec<Arc<Agent>> {
        self.members
            .values()
            .map(|member| Arc::clone(&member.agent))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Id currently bound to `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<AgentId> {
        self.by_name.get(name).copied()
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    match message.encode() {
        Ok(payload) => Some(payload),
        Err(e) => {
            error!("Failed to encode {:?}: {}", message, e);
            None
        }
    }
}

/// Cloneable sending side of the coordinator's intake
#[derive(Clone, Debug)]
pub struct RoomHandle {
    tx: mpsc::UnboundedSender<RoomEvent>,
}

impl RoomHandle {
    fn submit(&self, event: RoomEvent) -> bool {
        if let Err(e) = self.tx.send(event) {
            error!("Room coordinator is gone, dropped {:?}", e.0);
            false
        } else {
            true
        }
    }

    /// Submits the agent for admission and waits for its outbox. `None`
    /// means the coordinator has stopped.
    pub async fn join(&self, agent: Arc<Agent>) -> Option<OutboxReceiver> {
        let (admitted, admission) = oneshot::channel();
        if !self.submit(RoomEvent::Join { agent, admitted }) {
            return None;
        }
        admission.await.ok()
    }

    pub fn leave(&self, id: AgentId) {
        self.submit(RoomEvent::Leave { id });
    }

    pub fn broadcast(&self, message: &ServerMessage) {
        if let Some(payload) = encode(message) {
            self.submit(RoomEvent::Broadcast { payload });
        }
    }

    pub fn send_to(&self, target: &str, message: &ServerMessage) {
        if let Some(payload) = encode(message) {
            self.submit(RoomEvent::Direct(DirectedMessage {
                target: target.to_string(),
                payload,
            }));
        }
    }

    pub fn bind_name(&self, id: AgentId) {
        self.submit(RoomEvent::BindName { id });
    }

    pub fn send_roster(&self, target: &str) {
        self.submit(RoomEvent::Roster {
            target: target.to_string(),
        });
    }

    /// Current members, as seen by the coordinator once it reaches this
    /// request. Empty if the coordinator has stopped.
    pub async fn snapshot(&self) -> Vec<Arc<Agent>> {
        let (reply, response) = oneshot::channel();
        if !self.submit(RoomEvent::Snapshot { reply }) {
            return Vec::new();
        }
        response.await.unwrap_or_default()
    }
}
