use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings for the presence server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,
    /// Port to listen on, 0 picks a free one
    pub port: u16,
    /// Static page served at `/`
    pub index: PathBuf,
    /// How often the liveness monitor scans the room
    pub liveness_interval: Duration,
    /// Silence after which an agent is expired
    pub liveness_timeout: Duration,
    /// Largest inbound WebSocket message accepted, in bytes. The transport
    /// cannot skip a message over this limit, so it ends the connection.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9999,
            index: PathBuf::from("static/index.html"),
            liveness_interval: Duration::from_secs(10),
            liveness_timeout: Duration::from_secs(10),
            max_message_size: 64 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
