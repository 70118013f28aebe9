// Scene tracking consumer.
//
// `SceneState` is a plain model of what the game has told us: which object
// instances exist, where they are and how they move, plus a few counters.
// It is fed `GameEvent`s through `apply` and never touches the network, so
// tests can drive it directly.
//
// `SceneTracker` wraps a `SceneState` as a `BridgeHandler` for the `gamecon
// listen` command. It optionally mirrors each event to a JSON-lines sink and
// optionally raises a quit flag when the game disconnects.
//
// Objects are keyed by `instance_key` (`barrel` for id 0, `barrel12` for id
// 12). Games do not always announce short-lived objects with `create`, so a
// motion vector for an unknown instance starts tracking it.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gamecon_protocol::{GameEvent, GameEventHandler, Identity, InstanceId, Vector3, instance_key};
use serde::Serialize;
use tracing::{debug, warn};

use crate::server::BridgeHandler;

/// Vector params with a dedicated slot on `TrackedObject`.
pub const PARAM_POSITION: &str = "pos";
pub const PARAM_VELOCITY: &str = "vel";
pub const PARAM_DIRECTION: &str = "dir";
pub const PARAM_UP: &str = "up";

/// One object instance in the game world.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TrackedObject {
    pub object: String,
    pub instance_id: InstanceId,
    pub position: Vector3,
    pub velocity: Vector3,
    pub direction: Vector3,
    pub up: Vector3,
}

impl TrackedObject {
    fn new(object: &str, instance_id: InstanceId) -> Self {
        Self {
            object: object.to_owned(),
            instance_id,
            ..Self::default()
        }
    }
}

/// Everything known about the current game session.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SceneState {
    objects: BTreeMap<String, TrackedObject>,
    connected: bool,
    ticks: u64,
    hits: u64,
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the scene.
    pub fn apply(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Create { object, id } => {
                self.objects
                    .insert(instance_key(object, *id), TrackedObject::new(object, *id));
            }
            GameEvent::Destroy { object, id } => {
                if self.objects.remove(&instance_key(object, *id)).is_none() {
                    debug!(object = %object, %id, "destroy for untracked object");
                }
            }
            GameEvent::Vector { identity, vector } => self.record_vector(identity, *vector),
            GameEvent::Hit { .. } => self.hits += 1,
            _ => {}
        }
    }

    fn record_vector(&mut self, identity: &Identity, vector: Vector3) {
        let slot = match identity.param.as_str() {
            PARAM_POSITION | PARAM_VELOCITY | PARAM_DIRECTION | PARAM_UP => {
                identity.param.as_str()
            }
            _ => return,
        };
        let tracked = self
            .objects
            .entry(identity.instance_key())
            .or_insert_with(|| TrackedObject::new(&identity.object, identity.instance_id));
        match slot {
            PARAM_POSITION => tracked.position = vector,
            PARAM_VELOCITY => tracked.velocity = vector,
            PARAM_DIRECTION => tracked.direction = vector,
            _ => tracked.up = vector,
        }
    }

    pub fn mark_connected(&mut self) {
        self.connected = true;
    }

    /// The game went away; nothing it told us is current any more.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.connected = false;
        self.hits = 0;
    }

    pub fn record_tick(&mut self) {
        self.ticks += 1;
    }

    pub fn object(&self, key: &str) -> Option<&TrackedObject> {
        self.objects.get(key)
    }

    pub fn objects(&self) -> impl Iterator<Item = (&str, &TrackedObject)> {
        self.objects.iter().map(|(key, tracked)| (key.as_str(), tracked))
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }
}

/// `BridgeHandler` that maintains a `SceneState`.
pub struct SceneTracker {
    state: SceneState,
    sink: Option<Box<dyn Write + Send>>,
    quit_on_disconnect: Option<Arc<AtomicBool>>,
}

impl SceneTracker {
    pub fn new() -> Self {
        Self {
            state: SceneState::new(),
            sink: None,
            quit_on_disconnect: None,
        }
    }

    /// Write every event to `sink` as one JSON object per line.
    pub fn with_json_sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Raise `flag` when the game disconnects.
    pub fn with_quit_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.quit_on_disconnect = Some(flag);
        self
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    fn mirror(&mut self, event: &GameEvent) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let written = serde_json::to_writer(&mut *sink, event)
            .map_err(std::io::Error::from)
            .and_then(|()| sink.write_all(b"\n"))
            .and_then(|()| sink.flush());
        if let Err(e) = written {
            warn!(error = %e, "event sink failed; disabling it");
            self.sink = None;
        }
    }
}

impl Default for SceneTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventHandler for SceneTracker {
    fn on_event(&mut self, event: &GameEvent) {
        self.mirror(event);
        self.state.apply(event);
    }
}

impl BridgeHandler for SceneTracker {
    fn on_connect(&mut self) {
        self.state.mark_connected();
    }

    fn on_disconnect(&mut self) {
        debug!(objects = self.state.object_count(), "clearing scene");
        self.state.clear();
        if let Some(flag) = &self.quit_on_disconnect {
            flag.store(true, Ordering::SeqCst);
        }
    }

    fn on_tick(&mut self) {
        self.state.record_tick();
    }
}
