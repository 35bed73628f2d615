//! Configuration for the agent.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use std::path::PathBuf;

/// Default socket path for the agent.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/hostsim-agent.sock";

/// Default request line limit (4 MiB, room for two full-size backups).
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 4 * 1024 * 1024;

/// Configuration for the hostsim agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Unix socket to listen on.
    pub socket_path: PathBuf,

    /// Longest accepted request line in bytes.
    pub max_request_bytes: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl AgentConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `HOSTSIM_SOCKET` | `/tmp/hostsim-agent.sock` |
    /// | `HOSTSIM_MAX_REQUEST_BYTES` | `4194304` |
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            socket_path: std::env::var("HOSTSIM_SOCKET")
                .map(PathBuf::from)
                .unwrap_or(default.socket_path),
            max_request_bytes: std::env::var("HOSTSIM_MAX_REQUEST_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|limit| *limit > 0)
                .unwrap_or(default.max_request_bytes),
        }
    }
}
