// Core value types for the game event protocol.
//
// These are the small value objects carried by decoded events: the numeric
// `InstanceId` that distinguishes several objects of the same kind (doors,
// barrels, trees), the `Vector3` used for positions and velocities, the
// immutable `Collision` record, and the `Identity` triple derived from a
// message name. All derive serde traits so decoded events can be written out
// as JSON by consumers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Game-assigned object instance id. Zero means "no id was sent".
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct InstanceId(pub i32);

impl InstanceId {
    pub const NONE: InstanceId = InstanceId(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Three-component vector, laid out the same way as the audio engine's.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A collision reported by the game: what was hit and how hard.
///
/// Immutable once built; fields are only reachable through accessors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    other_name: String,
    velocity: f32,
}

impl Collision {
    pub fn new(other_name: impl Into<String>, velocity: f32) -> Self {
        Self {
            other_name: other_name.into(),
            velocity,
        }
    }

    /// Name of the other object involved in the collision.
    pub fn other_name(&self) -> &str {
        &self.other_name
    }

    /// Relative velocity of the two objects.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }
}

/// The (object, instance id, param) triple a message is addressed to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub object: String,
    pub instance_id: InstanceId,
    pub param: String,
}

impl Identity {
    /// Build an identity from a raw message name. Everything before the last
    /// `.` is the object and the rest is the param; a name without a dot is
    /// used for both.
    pub fn from_name(name: &str, instance_id: InstanceId) -> Self {
        let (object, param) = split_name(name);
        Self {
            object: object.to_owned(),
            instance_id,
            param: param.to_owned(),
        }
    }

    /// Key identifying this object instance, see [`instance_key`].
    pub fn instance_key(&self) -> String {
        instance_key(&self.object, self.instance_id)
    }

    /// Reassemble the wire name (`object.param`, or just `object` when both
    /// halves are equal).
    pub fn wire_name(&self) -> String {
        if self.object == self.param {
            self.object.clone()
        } else {
            format!("{}.{}", self.object, self.param)
        }
    }
}

/// Split a message name at its last `.` into `(object, param)`.
pub fn split_name(name: &str) -> (&str, &str) {
    name.rsplit_once('.').unwrap_or((name, name))
}

/// Unique string for one object instance: the bare name when the id is zero,
/// otherwise the name with the id appended (`barrel` + 12 → `barrel12`).
pub fn instance_key(object: &str, id: InstanceId) -> String {
    if id.is_none() {
        object.to_owned()
    } else {
        format!("{object}{id}")
    }
}
