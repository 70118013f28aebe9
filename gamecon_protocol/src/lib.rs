// gamecon_protocol — text line protocol between a game and the Gamecon bridge.
//
// The game sends one message per line, `<name> <type> <content>`, where
// `type` is a single letter selecting the payload kind and an upper-case
// letter means `content` begins with an object instance id. This crate turns
// such lines into typed events and delivers them to a consumer-supplied
// handler. It does no I/O of its own beyond the `Read`/`Write` framing
// helpers and has no dependency on the bridge crate.
//
// Module overview:
// - `types.rs`:    Value types (`InstanceId`, `Vector3`, `Collision`,
//                  `Identity`) and the name/instance-key helpers.
// - `numeric.rs`:  Lenient number parsing; bad input reads as zero.
// - `tokens.rs`:   Quote-aware line splitting and the content cursor.
// - `message.rs`:  `RawMessage`, `PayloadKind`, the decoded `GameEvent`, and
//                  its rendering back to a wire line.
// - `dispatch.rs`: `GameEventHandler` trait and `dispatch_line`.
// - `framing.rs`:  `LineBuffer` reassembly across reads, and `write_line`.
//
// Design decisions:
// - **Never reject input.** Malformed numbers degrade to zero and unknown
//   type letters pass through to `on_other`; a noisy game cannot stop the
//   stream.
// - **Pure decoding.** `decode` depends only on its input line, so it can be
//   tested without sockets and replayed deterministically.
// - **Owned events.** `GameEvent` owns its strings so consumers can queue,
//   log, or serialize it without tying lifetimes to the read buffer.

pub mod dispatch;
pub mod framing;
pub mod message;
pub mod numeric;
pub mod tokens;
pub mod types;

pub use dispatch::{GameEventHandler, LoggingHandler, decode_line, deliver, dispatch_line};
pub use framing::{LineBuffer, MAX_LINE_LENGTH, write_line};
pub use message::{ACTION_CREATE, ACTION_DESTROY, GameEvent, PayloadKind, RawMessage, decode};
pub use types::{Collision, Identity, InstanceId, Vector3, instance_key, split_name};
