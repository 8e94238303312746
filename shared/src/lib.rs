//! Wire protocol and movement rules shared by the presence server and its clients.
//!
//! Every frame is a JSON object whose `action` field selects the variant.
//! Inbound frames decode into [`ClientMessage`], outbound frames are built from
//! [`ServerMessage`].

use serde::{Deserialize, Serialize};

/// Smallest coordinate on either axis.
pub const WORLD_MIN: i32 = 0;
/// Largest coordinate on either axis.
pub const WORLD_MAX: i32 = 450;
/// Distance covered by a single move action.
pub const MOVE_STEP: i32 = 5;
/// Spawn positions are drawn from `SPAWN_MIN..SPAWN_MAX` on both axes.
pub const SPAWN_MIN: i32 = 50;
pub const SPAWN_MAX: i32 = 400;

/// Colors handed out round-robin as agents are admitted.
pub const PALETTE: [&str; 5] = ["#801B14", "#F2E4A4", "#A19D77", "#2A2B24", "#E0493F"];

/// Returns the palette color for the `index`-th admission (0-based).
pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Direction carried by a move action in its `t` field.
///
/// Codes outside 1..=4 decode to [`Direction::Unknown`] rather than failing,
/// so a client sending a bogus code gets a no-op instead of a dropped frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "i64", into = "i64")]
pub enum Direction {
    Right,
    Left,
    Down,
    Up,
    Unknown(i64),
}

impl From<i64> for Direction {
    fn from(code: i64) -> Self {
        match code {
            1 => Direction::Right,
            2 => Direction::Left,
            3 => Direction::Down,
            4 => Direction::Up,
            other => Direction::Unknown(other),
        }
    }
}

impl From<Direction> for i64 {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Right => 1,
            Direction::Left => 2,
            Direction::Down => 3,
            Direction::Up => 4,
            Direction::Unknown(code) => code,
        }
    }
}

/// A point in the shared space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x: x.clamp(WORLD_MIN, WORLD_MAX),
            y: y.clamp(WORLD_MIN, WORLD_MAX),
        }
    }

    /// Applies one step in `direction`, clamped to the world bounds.
    ///
    /// Returns `None` when nothing moved: the agent was already against the
    /// boundary, or the direction is unknown.
    pub fn step(self, direction: Direction) -> Option<Position> {
        let (dx, dy) = match direction {
            Direction::Right => (MOVE_STEP, 0),
            Direction::Left => (-MOVE_STEP, 0),
            Direction::Down => (0, MOVE_STEP),
            Direction::Up => (0, -MOVE_STEP),
            Direction::Unknown(_) => return None,
        };

        let next = Position::new(self.x + dx, self.y + dy);
        (next != self).then_some(next)
    }
}

/// Frames sent by clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ClientMessage {
    Ping,
    Login {
        name: String,
    },
    Move {
        #[serde(rename = "t")]
        direction: Direction,
    },
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Decodes a text frame. Frames without an `action`, or with a known
    /// action but missing fields, are errors; unknown actions are not.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Directed to a freshly logged-in agent, naming itself.
    LoginSuccess {
        #[serde(rename = "p")]
        name: String,
    },
    /// A roster entry (directed) or a new arrival (broadcast).
    Login {
        #[serde(rename = "p")]
        name: String,
        x: i32,
        y: i32,
        #[serde(rename = "c")]
        color: String,
    },
    Move {
        #[serde(rename = "p")]
        name: String,
        x: i32,
        y: i32,
    },
    Logout {
        #[serde(rename = "p")]
        name: String,
    },
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_wraps() {
        assert_eq!(palette_color(0), "#801B14");
        assert_eq!(palette_color(4), "#E0493F");
        assert_eq!(palette_color(5), "#801B14");
        assert_eq!(palette_color(12), PALETTE[2]);
    }

    #[test]
    fn test_direction_codes() {
        assert_eq!(Direction::from(1), Direction::Right);
        assert_eq!(Direction::from(2), Direction::Left);
        assert_eq!(Direction::from(3), Direction::Down);
        assert_eq!(Direction::from(4), Direction::Up);
        assert_eq!(Direction::from(0), Direction::Unknown(0));
        assert_eq!(Direction::from(9), Direction::Unknown(9));
    }

    #[test]
    fn test_step_moves_each_axis() {
        let start = Position::new(100, 200);

        assert_eq!(start.step(Direction::Right), Some(Position::new(105, 200)));
        assert_eq!(start.step(Direction::Left), Some(Position::new(95, 200)));
        assert_eq!(start.step(Direction::Down), Some(Position::new(100, 205)));
        assert_eq!(start.step(Direction::Up), Some(Position::new(100, 195)));
    }

    #[test]
    fn test_step_against_boundary_is_noop() {
        let corner = Position::new(WORLD_MAX, WORLD_MIN);

        assert_eq!(corner.step(Direction::Right), None);
        assert_eq!(corner.step(Direction::Up), None);
        assert!(corner.step(Direction::Left).is_some());
        assert!(corner.step(Direction::Down).is_some());
    }

    #[test]
    fn test_step_clamps_partial_move() {
        let near_edge = Position::new(448, 2);

        assert_eq!(near_edge.step(Direction::Right), Some(Position::new(450, 2)));
        assert_eq!(near_edge.step(Direction::Up), Some(Position::new(448, 0)));
    }

    #[test]
    fn test_unknown_direction_does_not_move() {
        assert_eq!(Position::new(10, 10).step(Direction::Unknown(7)), None);
    }

    #[test]
    fn test_random_walk_stays_in_bounds() {
        let mut position = Position::new(WORLD_MIN, WORLD_MAX);
        let pattern = [1, 1, 4, 2, 3, 3, 3, 1, 4, 4, 2, 2, 2];

        for round in 0..500 {
            let direction = Direction::from(pattern[round % pattern.len()]);
            if let Some(next) = position.step(direction) {
                position = next;
            }
            assert!((WORLD_MIN..=WORLD_MAX).contains(&position.x));
            assert!((WORLD_MIN..=WORLD_MAX).contains(&position.y));
        }
    }

    #[test]
    fn test_decode_client_actions() {
        assert_eq!(
            ClientMessage::decode(r#"{"action":"ping"}"#).unwrap(),
            ClientMessage::Ping
        );
        assert_eq!(
            ClientMessage::decode(r#"{"action":"login","name":"ada"}"#).unwrap(),
            ClientMessage::Login {
                name: "ada".to_string()
            }
        );
        assert_eq!(
            ClientMessage::decode(r#"{"action":"move","t":3}"#).unwrap(),
            ClientMessage::Move {
                direction: Direction::Down
            }
        );
    }

    #[test]
    fn test_decode_unknown_action_is_explicit() {
        assert_eq!(
            ClientMessage::decode(r#"{"action":"dance","style":"tango"}"#).unwrap(),
            ClientMessage::Unknown
        );
    }

    #[test]
    fn test_decode_unknown_direction_is_explicit() {
        assert_eq!(
            ClientMessage::decode(r#"{"action":"move","t":42}"#).unwrap(),
            ClientMessage::Move {
                direction: Direction::Unknown(42)
            }
        );
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        assert!(ClientMessage::decode("").is_err());
        assert!(ClientMessage::decode("not json").is_err());
        assert!(ClientMessage::decode(r#"{"name":"ada"}"#).is_err());
        assert!(ClientMessage::decode(r#"{"action":"move"}"#).is_err());
        assert!(ClientMessage::decode(r#"{"action":"move","t":"up"}"#).is_err());
        assert!(ClientMessage::decode(r#"{"action":"login"}"#).is_err());
    }

    #[test]
    fn test_encode_server_frames() {
        let login = ServerMessage::Login {
            name: "ada".to_string(),
            x: 10,
            y: 20,
            color: PALETTE[0].to_string(),
        };
        let value: serde_json::Value = serde_json::from_str(&login.encode().unwrap()).unwrap();
        assert_eq!(value["action"], "login");
        assert_eq!(value["p"], "ada");
        assert_eq!(value["x"], 10);
        assert_eq!(value["y"], 20);
        assert_eq!(value["c"], "#801B14");

        let success = ServerMessage::LoginSuccess {
            name: "ada".to_string(),
        };
        let value: serde_json::Value =
            serde_json::from_str(&success.encode().unwrap()).unwrap();
        assert_eq!(value["action"], "login-success");
        assert_eq!(value["p"], "ada");

        let logout = ServerMessage::Logout {
            name: "ada".to_string(),
        };
        let value: serde_json::Value = serde_json::from_str(&logout.encode().unwrap()).unwrap();
        assert_eq!(value["action"], "logout");
        assert_eq!(value["p"], "ada");
    }
}
