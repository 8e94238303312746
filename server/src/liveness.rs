//! Periodic expiry of agents that have gone quiet.
//!
//! The monitor never touches membership itself: it reads a snapshot from the
//! coordinator and submits ordinary leave requests, so expiry is ordered with
//! every other join, login and leave.

use crate::agent::{epoch_secs, Agent, AgentId};
use crate::room::RoomHandle;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Ids of agents last seen before `cutoff` (Unix seconds).
pub fn stale_agents(agents: &[Arc<Agent>], cutoff: i64) -> Vec<AgentId> {
    agents
        .iter()
        .filter(|agent| agent.is_stale(cutoff))
        .map(|agent| agent.id())
        .collect()
}

/// Runs one scan and requests removal of every stale member. Returns how
/// many removals were requested.
pub async fn sweep(room: &RoomHandle, timeout: Duration) -> usize {
    let cutoff = epoch_secs() - timeout.as_secs() as i64;
    let members = room.snapshot().await;
    let expired = stale_agents(&members, cutoff);

    for id in &expired {
        info!("Agent {} timed out", id);
        room.leave(*id);
    }

    debug!(
        "Liveness sweep: {} members, {} expired",
        members.len(),
        expired.len()
    );
    expired.len()
}

/// Spawns a task that expires silent agents every `every`.
pub fn spawn_liveness_monitor(
    room: RoomHandle,
    every: Duration,
    timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first tick since it fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep(&room, timeout).await;
        }
    })
}
