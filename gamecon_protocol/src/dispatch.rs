// Typed dispatch of decoded game events.
//
// `GameEventHandler` is the consumer-facing capability interface: one method
// per payload kind plus `create`/`destroy` and a pass-through for unknown
// types. Every method has a default body that logs the event at debug level
// and otherwise ignores it, so a consumer implements only the events it cares
// about.
//
// `on_event` is the single entry point the dispatcher calls. Its default
// fans the event out to the typed methods; consumers that would rather work
// on the whole `GameEvent` (to record or serialize it) override `on_event`
// instead.
//
// The dispatcher holds no state between lines: `dispatch_line` is split +
// decode + deliver, and the same line always produces the same call.

use tracing::debug;

use crate::message::{GameEvent, decode};
use crate::tokens::split_fields;
use crate::types::{Collision, InstanceId, Vector3};

/// Receiver for decoded game events.
pub trait GameEventHandler {
    /// Entry point for every decoded event. Defaults to calling the typed
    /// method matching the event.
    fn on_event(&mut self, event: &GameEvent) {
        deliver(event, self);
    }

    /// An object instance was added to the game world.
    fn on_create(&mut self, object: &str, id: InstanceId) {
        debug!(object, %id, "unhandled create");
    }

    /// An object instance was removed from the game world.
    fn on_destroy(&mut self, object: &str, id: InstanceId) {
        debug!(object, %id, "unhandled destroy");
    }

    fn on_bool(&mut self, object: &str, id: InstanceId, param: &str, flag: bool) {
        debug!(object, %id, param, flag, "unhandled bool");
    }

    fn on_int(&mut self, object: &str, id: InstanceId, param: &str, value: i32) {
        debug!(object, %id, param, value, "unhandled int");
    }

    fn on_real(&mut self, object: &str, id: InstanceId, param: &str, value: f64) {
        debug!(object, %id, param, value, "unhandled real");
    }

    fn on_string(&mut self, object: &str, id: InstanceId, param: &str, value: &str) {
        debug!(object, %id, param, value, "unhandled string");
    }

    /// Position, velocity, direction or orientation of an object, named by
    /// `param` (`pos`, `vel`, `dir`, `up`).
    fn on_vector(&mut self, object: &str, id: InstanceId, param: &str, vector: Vector3) {
        debug!(
            object,
            %id,
            param,
            x = vector.x,
            y = vector.y,
            z = vector.z,
            "unhandled vector"
        );
    }

    /// A collision between `object` and `collision.other_name()`.
    fn on_hit(&mut self, object: &str, id: InstanceId, collision: &Collision) {
        debug!(
            object,
            %id,
            other = collision.other_name(),
            velocity = collision.velocity(),
            "unhandled hit"
        );
    }

    /// A message whose type letter is not part of the protocol.
    fn on_other(&mut self, _name: &str, _kind: &str, _content: &str) {}
}

/// Call the typed handler method that matches `event`.
pub fn deliver<H: GameEventHandler + ?Sized>(event: &GameEvent, handler: &mut H) {
    match event {
        GameEvent::Create { object, id } => handler.on_create(object, *id),
        GameEvent::Destroy { object, id } => handler.on_destroy(object, *id),
        GameEvent::Bool { identity, flag } => {
            handler.on_bool(&identity.object, identity.instance_id, &identity.param, *flag);
        }
        GameEvent::Int { identity, value } => {
            handler.on_int(&identity.object, identity.instance_id, &identity.param, *value);
        }
        GameEvent::Real { identity, value } => {
            handler.on_real(&identity.object, identity.instance_id, &identity.param, *value);
        }
        GameEvent::Str { identity, value } => {
            handler.on_string(&identity.object, identity.instance_id, &identity.param, value);
        }
        GameEvent::Vector { identity, vector } => {
            handler.on_vector(&identity.object, identity.instance_id, &identity.param, *vector);
        }
        GameEvent::Hit {
            identity,
            collision,
        } => handler.on_hit(&identity.object, identity.instance_id, collision),
        GameEvent::Other {
            name,
            kind,
            content,
        } => handler.on_other(name, kind, content),
    }
}

/// Decode one protocol line and hand the result to `handler`. Returns
/// `false` (and calls nothing) for a blank line.
pub fn dispatch_line<H: GameEventHandler + ?Sized>(line: &str, handler: &mut H) -> bool {
    let Some(raw) = split_fields(line) else {
        return false;
    };
    let event = decode(&raw);
    handler.on_event(&event);
    true
}

/// Decode a line into an event without delivering it.
pub fn decode_line(line: &str) -> Option<GameEvent> {
    split_fields(line).map(|raw| decode(&raw))
}

/// Handler that ignores everything apart from the default debug logging.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingHandler;

impl GameEventHandler for LoggingHandler {}
