// Protocol messages: raw three-field lines and their decoded form.
//
// A line on the wire is `<name> <type> <content>`. `RawMessage` borrows those
// three fields straight out of the line; `decode` turns it into an owned
// `GameEvent`, which is the single vocabulary the rest of the system speaks:
// the dispatcher delivers it to handlers, consumers can log or serialize it,
// and the game-side client renders it back into a line via `Display`.
//
// Type letters map to payload kinds (`b i r s v c`). An upper-case letter
// means the content starts with an instance id. `create` and `destroy` are
// not wire types of their own; they are integer messages whose param is the
// literal action name, and the integer is the id of the affected instance.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::numeric::{parse_float, parse_int, parse_real};
use crate::tokens::ContentCursor;
use crate::types::{Collision, Identity, InstanceId, Vector3};

/// Param name that turns an integer message into a creation notice.
pub const ACTION_CREATE: &str = "create";

/// Param name that turns an integer message into a removal notice.
pub const ACTION_DESTROY: &str = "destroy";

/// The three fields of a protocol line, borrowed from the line itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawMessage<'a> {
    pub name: &'a str,
    pub kind: &'a str,
    pub content: &'a str,
}

impl<'a> RawMessage<'a> {
    pub fn new(name: &'a str, kind: &'a str, content: &'a str) -> Self {
        Self {
            name,
            kind,
            content,
        }
    }
}

/// Value shape selected by a message's type letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Bool,
    Int,
    Real,
    Str,
    Vector,
    Collision,
}

impl PayloadKind {
    /// Map a lower-case type letter to its payload kind.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'b' => Some(Self::Bool),
            'i' => Some(Self::Int),
            'r' => Some(Self::Real),
            's' => Some(Self::Str),
            'v' => Some(Self::Vector),
            'c' => Some(Self::Collision),
            _ => None,
        }
    }

    /// The lower-case type letter for this kind.
    pub fn code(self) -> char {
        match self {
            Self::Bool => 'b',
            Self::Int => 'i',
            Self::Real => 'r',
            Self::Str => 's',
            Self::Vector => 'v',
            Self::Collision => 'c',
        }
    }
}

/// A fully decoded game message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An object instance entered the game world.
    Create { object: String, id: InstanceId },
    /// An object instance left the game world.
    Destroy { object: String, id: InstanceId },
    Bool { identity: Identity, flag: bool },
    Int { identity: Identity, value: i32 },
    Real { identity: Identity, value: f64 },
    Str { identity: Identity, value: String },
    /// Position, velocity, direction or similar, named by the param.
    Vector { identity: Identity, vector: Vector3 },
    Hit {
        identity: Identity,
        collision: Collision,
    },
    /// A line whose type letter is not part of the protocol, passed through
    /// with its original fields.
    Other {
        name: String,
        kind: String,
        content: String,
    },
}

/// Decode one message. Never fails: unknown types become `Other` and
/// malformed numbers become zero.
pub fn decode(raw: &RawMessage<'_>) -> GameEvent {
    let Some(mut code) = raw.kind.chars().next() else {
        return other(raw);
    };

    let mut cursor = ContentCursor::new(raw.content);
    let mut instance_id = InstanceId::NONE;
    if code.is_uppercase() {
        instance_id = InstanceId(parse_int(cursor.next_token()));
        code = code.to_lowercase().next().unwrap_or(code);
    }

    let Some(kind) = PayloadKind::from_code(code) else {
        return other(raw);
    };

    let identity = Identity::from_name(raw.name, instance_id);
    match kind {
        PayloadKind::Bool => GameEvent::Bool {
            identity,
            flag: parse_int(cursor.next_token()) != 0,
        },
        PayloadKind::Int => {
            let value = parse_int(cursor.next_token());
            if identity.param == ACTION_CREATE {
                GameEvent::Create {
                    object: identity.object,
                    id: InstanceId(value),
                }
            } else if identity.param == ACTION_DESTROY {
                GameEvent::Destroy {
                    object: identity.object,
                    id: InstanceId(value),
                }
            } else {
                GameEvent::Int { identity, value }
            }
        }
        PayloadKind::Real => GameEvent::Real {
            identity,
            value: parse_real(cursor.next_token()),
        },
        PayloadKind::Str => GameEvent::Str {
            identity,
            value: cursor.next_token().to_owned(),
        },
        PayloadKind::Vector => {
            let x = parse_float(cursor.next_token());
            let y = parse_float(cursor.next_token());
            let z = parse_float(cursor.next_token());
            GameEvent::Vector {
                identity,
                vector: Vector3::new(x, y, z),
            }
        }
        PayloadKind::Collision => {
            let other_name = cursor.next_token();
            let velocity = parse_float(cursor.next_token());
            GameEvent::Hit {
                identity,
                collision: Collision::new(other_name, velocity),
            }
        }
    }
}

fn other(raw: &RawMessage<'_>) -> GameEvent {
    GameEvent::Other {
        name: raw.name.to_owned(),
        kind: raw.kind.to_owned(),
        content: raw.content.to_owned(),
    }
}

/// Renders the event as a protocol line (without the terminator). Events
/// with a non-zero instance id use the upper-case type letter, and content
/// with more than one token is quoted.
impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { object, id } => write!(f, "{object}.{ACTION_CREATE} i {id}"),
            Self::Destroy { object, id } => write!(f, "{object}.{ACTION_DESTROY} i {id}"),
            Self::Bool { identity, flag } => {
                write_line(f, identity, PayloadKind::Bool, &u8::from(*flag).to_string())
            }
            Self::Int { identity, value } => {
                write_line(f, identity, PayloadKind::Int, &value.to_string())
            }
            Self::Real { identity, value } => {
                write_line(f, identity, PayloadKind::Real, &value.to_string())
            }
            Self::Str { identity, value } => write_line(f, identity, PayloadKind::Str, value),
            Self::Vector { identity, vector } => write_line(
                f,
                identity,
                PayloadKind::Vector,
                &format!("{} {} {}", vector.x, vector.y, vector.z),
            ),
            Self::Hit {
                identity,
                collision,
            } => write_line(
                f,
                identity,
                PayloadKind::Collision,
                &format!("{} {}", collision.other_name(), collision.velocity()),
            ),
            Self::Other {
                name,
                kind,
                content,
            } => write!(f, "{name} {kind} {content}"),
        }
    }
}

fn write_line(
    f: &mut fmt::Formatter<'_>,
    identity: &Identity,
    kind: PayloadKind,
    value: &str,
) -> fmt::Result {
    let name = identity.wire_name();
    let code = kind.code();
    if identity.instance_id.is_none() {
        if value.is_empty() || value.contains(char::is_whitespace) {
            write!(f, "{name} {code} \"{value}\"")
        } else {
            write!(f, "{name} {code} {value}")
        }
    } else {
        let code = code.to_ascii_uppercase();
        write!(f, "{name} {code} \"{} {value}\"", identity.instance_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::split_fields;

    fn decode_line(line: &str) -> GameEvent {
        decode(&split_fields(line).unwrap())
    }

    fn identity(object: &str, id: i32, param: &str) -> Identity {
        Identity {
            object: object.into(),
            instance_id: InstanceId(id),
            param: param.into(),
        }
    }

    #[test]
    fn bool_lower_case() {
        assert_eq!(
            decode_line("char.grounded b 1"),
            GameEvent::Bool {
                identity: identity("char", 0, "grounded"),
                flag: true,
            }
        );
    }

    #[test]
    fn bool_upper_case_consumes_id() {
        assert_eq!(
            decode_line("light.on B \"-9294 0\""),
            GameEvent::Bool {
                identity: identity("light", -9294, "on"),
                flag: false,
            }
        );
    }

    #[test]
    fn bool_any_non_zero_is_true() {
        let event = decode_line("door.open b -3");
        assert!(matches!(event, GameEvent::Bool { flag: true, .. }));
    }

    #[test]
    fn int_with_id() {
        assert_eq!(
            decode_line("team.score I \"4535 5\""),
            GameEvent::Int {
                identity: identity("team", 4535, "score"),
                value: 5,
            }
        );
    }

    #[test]
    fn create_takes_priority_over_int() {
        assert_eq!(
            decode_line("obj.create i 7"),
            GameEvent::Create {
                object: "obj".into(),
                id: InstanceId(7),
            }
        );
    }

    #[test]
    fn destroy_uses_value_as_id_even_with_upper_case() {
        // The leading id is consumed, then replaced by the integer value.
        assert_eq!(
            decode_line("barrel.destroy I \"1 12\""),
            GameEvent::Destroy {
                object: "barrel".into(),
                id: InstanceId(12),
            }
        );
    }

    #[test]
    fn create_param_on_other_kinds_is_not_special() {
        let event = decode_line("obj.create r 7");
        assert!(matches!(event, GameEvent::Real { value, .. } if value == 7.0));
    }

    #[test]
    fn real_values() {
        assert_eq!(
            decode_line("enemy.health R \"-31494 85.5\""),
            GameEvent::Real {
                identity: identity("enemy", -31494, "health"),
                value: 85.5,
            }
        );
        assert_eq!(
            decode_line("car.rpm r 0.76688"),
            GameEvent::Real {
                identity: identity("car", 0, "rpm"),
                value: 0.76688,
            }
        );
    }

    #[test]
    fn string_values() {
        assert_eq!(
            decode_line("char.surface s water"),
            GameEvent::Str {
                identity: identity("char", 0, "surface"),
                value: "water".into(),
            }
        );
        assert_eq!(
            decode_line("enemy.surface S \"98483 gravel\""),
            GameEvent::Str {
                identity: identity("enemy", 98483, "surface"),
                value: "gravel".into(),
            }
        );
    }

    #[test]
    fn string_takes_a_single_token() {
        let event = decode_line("radio.say S \"3 hello there\"");
        assert_eq!(
            event,
            GameEvent::Str {
                identity: identity("radio", 3, "say"),
                value: "hello".into(),
            }
        );
    }

    #[test]
    fn vector_values() {
        assert_eq!(
            decode_line("char.pos v \"0.002 45.5235 -55.352\""),
            GameEvent::Vector {
                identity: identity("char", 0, "pos"),
                vector: Vector3::new(0.002, 45.5235, -55.352),
            }
        );
        assert_eq!(
            decode_line("char.vel V \"-4882 0.003 -0.342 1.125\""),
            GameEvent::Vector {
                identity: identity("char", -4882, "vel"),
                vector: Vector3::new(0.003, -0.342, 1.125),
            }
        );
    }

    #[test]
    fn short_vector_pads_with_zero() {
        assert_eq!(
            decode_line("char.pos v \"1.5\""),
            GameEvent::Vector {
                identity: identity("char", 0, "pos"),
                vector: Vector3::new(1.5, 0.0, 0.0),
            }
        );
    }

    #[test]
    fn collision_values() {
        assert_eq!(
            decode_line("char.hit c \"wood 0.8\""),
            GameEvent::Hit {
                identity: identity("char", 0, "hit"),
                collision: Collision::new("wood", 0.8),
            }
        );
    }

    #[test]
    fn unknown_type_passes_original_fields() {
        assert_eq!(
            decode_line("game.state x \"a b\""),
            GameEvent::Other {
                name: "game.state".into(),
                kind: "x".into(),
                content: "\"a b\"".into(),
            }
        );
    }

    #[test]
    fn upper_case_unknown_type_is_other() {
        let event = decode_line("game.state X \"5 a\"");
        assert!(matches!(event, GameEvent::Other { ref kind, .. } if kind == "X"));
    }

    #[test]
    fn missing_type_is_other() {
        assert!(matches!(
            decode_line("lonely"),
            GameEvent::Other { ref kind, .. } if kind.is_empty()
        ));
    }

    #[test]
    fn non_numeric_id_is_zero() {
        assert_eq!(
            decode_line("team.score I \"abc 5\""),
            GameEvent::Int {
                identity: identity("team", 0, "score"),
                value: 5,
            }
        );
    }

    #[test]
    fn decoding_is_repeatable() {
        let line = "char.vel V \"-4882 0.003 -0.342 1.125\"";
        assert_eq!(decode_line(line), decode_line(line));
    }

    #[test]
    fn display_renders_wire_lines() {
        let vector = GameEvent::Vector {
            identity: identity("char", -4882, "vel"),
            vector: Vector3::new(0.5, -1.0, 2.25),
        };
        assert_eq!(vector.to_string(), "char.vel V \"-4882 0.5 -1 2.25\"");

        let flag = GameEvent::Bool {
            identity: identity("char", 0, "grounded"),
            flag: true,
        };
        assert_eq!(flag.to_string(), "char.grounded b 1");

        let create = GameEvent::Create {
            object: "barrel".into(),
            id: InstanceId(12),
        };
        assert_eq!(create.to_string(), "barrel.create i 12");
    }

    #[test]
    fn display_quotes_multi_word_strings() {
        let event = GameEvent::Str {
            identity: identity("radio", 0, "say"),
            value: "hello there".into(),
        };
        let line = event.to_string();
        assert_eq!(line, "radio.say s \"hello there\"");
        // Only the first word survives the trip back.
        match decode_line(&line) {
            GameEvent::Str { value, .. } => assert_eq!(value, "hello"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn payload_kind_codes_match() {
        for code in ['b', 'i', 'r', 's', 'v', 'c'] {
            assert_eq!(PayloadKind::from_code(code).map(PayloadKind::code), Some(code));
        }
    }
}
