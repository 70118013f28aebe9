// gamecon_bridge — single-connection TCP bridge between a game and a
// consumer.
//
// A game connects over TCP and streams event lines (see the
// `gamecon_protocol` crate for the format). The bridge accepts one game at a
// time, reassembles lines across reads, decodes them, and calls a
// consumer-supplied `BridgeHandler` on one background thread, with a
// fixed-cadence tick in between. Built for driving interactive audio from
// game state, but the handler can do anything.
//
// Module overview:
// - `server.rs`:    `BridgeHandler`, `start_bridge`, `BridgeHandle`, and the
//                   listener/connection loop.
// - `config.rs`:    `BridgeConfig` with defaults and JSON loading.
// - `error.rs`:     `thiserror` error enums for startup, shutdown, config and
//                   transport failures.
// - `scene.rs`:     `SceneState`/`SceneTracker`, a ready-made consumer that
//                   tracks object instances and their motion.
// - `client.rs`:    `GameClient`, the game's side of the connection.
// - `telemetry.rs`: Tracing subscriber setup used by the binary.
//
// The bridge can run as the standalone `gamecon` binary (`main.rs`) or be
// embedded in a host application through `start_bridge`.

pub mod client;
pub mod config;
pub mod error;
pub mod scene;
pub mod server;
pub mod telemetry;

pub use client::GameClient;
pub use config::BridgeConfig;
pub use error::{BridgeError, ConfigError};
pub use scene::{SceneState, SceneTracker};
pub use server::{BridgeHandle, BridgeHandler, start_bridge};
