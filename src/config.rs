use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::http::parser::{DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_HEADER_BYTES, ParseLimits};

/// Server settings.
///
/// Read once when the server starts listening and shared read-only with
/// every connection afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address to bind the listening socket to
    pub host: String,

    /// Port used by the binary (the library takes the port in `listen`)
    pub port: u16,

    /// Timeout in milliseconds for blocking reads (writes are never timed out)
    pub so_timeout_ms: u64,

    /// Size of the chunk used to read from the socket
    pub socket_buffer_size: usize,

    /// Content of the "Server" response header
    pub origin_server: String,

    /// Disable Nagle's algorithm on accepted sockets
    pub tcp_nodelay: bool,

    /// Serve more than one request per connection when the client allows it
    pub keep_alive: bool,

    /// Upper bound on the request line plus header block
    pub max_header_bytes: usize,

    /// Largest Content-Length accepted; bigger requests get 413
    pub max_body_bytes: usize,

    /// How long in-flight connections may run once the server is dropped
    pub shutdown_grace_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            so_timeout_ms: 1000,
            socket_buffer_size: 8 * 1024,
            origin_server: "ToyHttpd".to_string(),
            tcp_nodelay: true,
            keep_alive: false,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            shutdown_grace_ms: 5000,
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the YAML file named by
    /// `TOYHTTPD_CONFIG` (if set), then `TOYHTTPD_*` overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("TOYHTTPD_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Some(v) = env_var("TOYHTTPD_HOST") {
            self.host = v;
        }
        if let Some(v) = env_var("TOYHTTPD_PORT") {
            self.port = v.parse().context("TOYHTTPD_PORT must be a port number")?;
        }
        if let Some(v) = env_var("TOYHTTPD_SO_TIMEOUT") {
            self.so_timeout_ms = v
                .parse()
                .context("TOYHTTPD_SO_TIMEOUT must be milliseconds")?;
        }
        if let Some(v) = env_var("TOYHTTPD_SOCKET_BUFFER_SIZE") {
            self.socket_buffer_size = v
                .parse()
                .context("TOYHTTPD_SOCKET_BUFFER_SIZE must be a byte count")?;
        }
        if let Some(v) = env_var("TOYHTTPD_ORIGIN_SERVER") {
            self.origin_server = v;
        }
        if let Some(v) = env_var("TOYHTTPD_MAX_BODY_BYTES") {
            self.max_body_bytes = v
                .parse()
                .context("TOYHTTPD_MAX_BODY_BYTES must be a byte count")?;
        }
        if let Some(v) = env_var("TOYHTTPD_KEEP_ALIVE") {
            self.keep_alive = v
                .parse()
                .context("TOYHTTPD_KEEP_ALIVE must be true or false")?;
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.so_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn parse_limits(&self) -> ParseLimits {
        ParseLimits {
            max_header_bytes: self.max_header_bytes,
            max_body_bytes: self.max_body_bytes,
        }
    }

    /// Read chunk size, never zero.
    pub fn read_chunk(&self) -> usize {
        self.socket_buffer_size.max(1)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
