// Bridge configuration.
//
// Every knob is a construction-time parameter. Values can come from a JSON
// file (missing fields take their defaults) and are then overridden by
// command-line flags in `main.rs`. Durations are stored as milliseconds so
// the file format stays plain numbers.

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Port the game connects to unless told otherwise.
pub const DEFAULT_PORT: u16 = 60000;

/// Configuration for starting a bridge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Address the listener binds to. The game normally runs on the same
    /// machine, so this defaults to loopback.
    pub bind_address: IpAddr,
    /// Listening port; 0 lets the OS pick one.
    pub port: u16,
    /// Tick cadence, and also the read wait and idle sleep while connected.
    pub tick_interval_ms: u64,
    /// How long one accept wait lasts while no game is connected.
    pub accept_poll_ms: u64,
    /// Size of the socket read buffer.
    pub read_buffer_size: usize,
    /// How long `stop` waits for the bridge thread before giving up.
    pub shutdown_grace_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            tick_interval_ms: 15,
            accept_poll_ms: 200,
            read_buffer_size: 32 * 1024,
            shutdown_grace_ms: 4000,
        }
    }
}

impl BridgeConfig {
    /// Load a config from a JSON file. Fields absent from the file keep their
    /// defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be at least 1".into(),
            ));
        }
        if self.accept_poll_ms == 0 {
            return Err(ConfigError::Invalid(
                "accept_poll_ms must be at least 1".into(),
            ));
        }
        if self.read_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "read_buffer_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn accept_poll(&self) -> Duration {
        Duration::from_millis(self.accept_poll_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
