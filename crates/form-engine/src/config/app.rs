//! Application configuration for the Cardbase Form Engine server.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// Environment variables are prefixed with `CARDBASE_`:
/// - `CARDBASE_HOST`: Server bind address (default: "0.0.0.0")
/// - `CARDBASE_PORT`: Server port (default: 8086)
/// - `CARDBASE_WORKERS`: Number of worker threads (optional)
/// - `CARDBASE_DEBUG`: Enable debug mode (default: false)
/// - `CARDBASE_SERVER_NAME`: Server name for identification
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads (optional, defaults to CPU count)
    pub workers: Option<usize>,

    /// Enable debug mode
    #[serde(default)]
    pub debug: bool,

    /// Server name for identification
    #[serde(default = "default_server_name")]
    pub server_name: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8086
}

fn default_server_name() -> String {
    "cardbase-form-engine".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are prefixed with `CARDBASE_`.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("CARDBASE_").from_env::<AppConfig>()
    }

    /// Get the server bind address as a string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            debug: false,
            server_name: default_server_name(),
        }
    }
}
