//! Service configuration.
//!
//! Loaded from JSON; every field is optional and falls back to the same
//! defaults the [`ServerBuilder`](crate::ServerBuilder) uses.
//!
//! ```
//! use hwc_service::ServiceConfig;
//!
//! let config = ServiceConfig::from_json(r#"{ "max_concurrent_requests": 8 }"#).unwrap();
//! assert_eq!(config.max_concurrent_requests, 8);
//! assert_eq!(config.descriptor, hwc_service::protocol::SERVICE_DESCRIPTOR);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::{DEFAULT_MAX_PAYLOAD_SIZE, SERVICE_DESCRIPTOR};
use crate::writer::{
    WriterConfig, DEFAULT_BACKPRESSURE_TIMEOUT, DEFAULT_CHANNEL_CAPACITY,
    DEFAULT_MAX_PENDING_FRAMES,
};

/// Default maximum requests dispatched at once.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 16;

/// Settings for a socket-bound service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Unix socket the server listens on.
    pub socket_path: PathBuf,
    /// Identity token requests must carry.
    pub descriptor: String,
    /// Requests running at once; further requests get `WOULD_BLOCK`.
    pub max_concurrent_requests: usize,
    /// Largest frame payload accepted, in bytes.
    pub max_payload_size: u32,
    /// Reply queue depth per connection.
    pub channel_capacity: usize,
    /// Unwritten replies per connection before senders wait.
    pub max_pending_frames: usize,
    /// How long a reply may wait for the queue to drain, in milliseconds.
    pub backpressure_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            socket_path: default_path(),
            descriptor: SERVICE_DESCRIPTOR.to_string(),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_pending_frames: DEFAULT_MAX_PENDING_FRAMES,
            backpressure_timeout_ms: DEFAULT_BACKPRESSURE_TIMEOUT.as_millis() as u64,
        }
    }
}

#[cfg(unix)]
fn default_path() -> PathBuf {
    crate::transport::default_socket_path()
}

#[cfg(not(unix))]
fn default_path() -> PathBuf {
    PathBuf::from("hwc-service.sock")
}

impl ServiceConfig {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[inline]
    pub fn backpressure_timeout(&self) -> Duration {
        Duration::from_millis(self.backpressure_timeout_ms)
    }

    /// Writer settings for each connection.
    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            max_pending_frames: self.max_pending_frames,
            channel_capacity: self.channel_capacity,
            backpressure_timeout: self.backpressure_timeout(),
        }
    }
}
