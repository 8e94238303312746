//! Per-connection agent state.
//!
//! An [`Agent`] is shared between its own read duty, the room coordinator and
//! the liveness monitor. Each field has exactly one writer:
//! - name, position and last-seen are written by the agent's read duty
//! - color is written once by the coordinator at admission
//!
//! Fields read by other tasks are atomics or write-once cells, so no lock is
//! needed anywhere.

use rand::Rng;
use shared::{Position, SPAWN_MAX, SPAWN_MIN};
use std::sync::atomic::{AtomicI32, AtomicI64, AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Opaque handle identifying an agent for its whole lifetime.
pub type AgentId = u64;

static NEXT_AGENT_ID: AtomicU64 = AtomicU64::new(1);

/// Current Unix time in whole seconds.
pub fn epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs() as i64
}

/// Server-side state for one connected client
#[derive(Debug)]
pub struct Agent {
    id: AgentId,
    name: OnceLock<String>,
    color: OnceLock<&'static str>,
    x: AtomicI32,
    y: AtomicI32,
    last_seen: AtomicI64,
}

impl Agent {
    /// Creates an agent at a random spawn position, marked as seen now.
    pub fn spawn() -> Self {
        let mut rng = rand::thread_rng();
        let position = Position::new(
            rng.gen_range(SPAWN_MIN..SPAWN_MAX),
            rng.gen_range(SPAWN_MIN..SPAWN_MAX),
        );
        Self::at(position)
    }

    /// Creates an agent at a fixed position.
    pub fn at(position: Position) -> Self {
        Self {
            id: NEXT_AGENT_ID.fetch_add(1, Ordering::Relaxed),
            name: OnceLock::new(),
            color: OnceLock::new(),
            x: AtomicI32::new(position.x),
            y: AtomicI32::new(position.y),
            last_seen: AtomicI64::new(epoch_secs()),
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Display name, empty until login.
    pub fn name(&self) -> &str {
        self.name.get().map(String::as_str).unwrap_or("")
    }

    pub fn is_named(&self) -> bool {
        self.name.get().is_some()
    }

    /// Records the display name. Returns false if the agent already has one.
    pub fn set_name(&self, name: String) -> bool {
        self.name.set(name).is_ok()
    }

    /// Palette color, empty until admitted.
    pub fn color(&self) -> &'static str {
        self.color.get().copied().unwrap_or("")
    }

    /// Assigns the color. Only the first assignment sticks.
    pub(crate) fn assign_color(&self, color: &'static str) {
        let _ = self.color.set(color);
    }

    pub fn position(&self) -> Position {
        Position {
            x: self.x.load(Ordering::Relaxed),
            y: self.y.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn set_position(&self, position: Position) {
        self.x.store(position.x, Ordering::Relaxed);
        self.y.store(position.y, Ordering::Relaxed);
    }

    /// Last time (Unix seconds) anything was received from this agent.
    pub fn last_seen(&self) -> i64 {
        self.last_seen.load(Ordering::Relaxed)
    }

    /// Marks the agent as seen now.
    pub fn refresh_last_seen(&self) {
        self.touch_at(epoch_secs());
    }

    pub fn touch_at(&self, epoch: i64) {
        self.last_seen.store(epoch, Ordering::Relaxed);
    }

    /// True if nothing has been received since before `cutoff`.
    pub fn is_stale(&self, cutoff: i64) -> bool {
        self.last_seen() < cutoff
    }
}
