// Error types for the bridge.
//
// `BridgeError` is what the public API returns: startup failures (bind,
// thread spawn, bad configuration) and shutdown failures (timeout, panic).
// `TransportError` never leaves the engine thread; it describes why an active
// connection was dropped and is only logged alongside the `disconnected`
// notification.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by starting or stopping the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to bind game listener at {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn bridge thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("bridge thread did not exit within {grace:?}")]
    ShutdownTimeout { grace: Duration },
    #[error("bridge thread panicked")]
    ThreadPanic,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors loading or validating a `BridgeConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Why an active game connection was torn down.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer closed the connection")]
    PeerClosed,
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    #[error("failed to configure stream: {0}")]
    Configure(#[source] io::Error),
}
