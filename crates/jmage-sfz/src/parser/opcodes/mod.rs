/// Opcode tables and value conversion
///
/// Opcodes in SFZ are `name=value` pairs. The type and legal range of a value
/// is decided by the opcode's name alone, never by the section it appears in,
/// so validation is a single lookup in a static table followed by a
/// conversion of the raw text.
///
/// # Tables
///
/// - [`SFZ_OPCODES`]: the base format (key/velocity ranges, tuning, loop
///   points, amplitude envelope, sample path)
/// - [`JMZ_OPCODES`]: the JMZ extension (channel, volume scalar, display
///   name, mute/solo flags)
///
/// A format consults its tables in order and stops at the first hit, so an
/// extension table can only add names and never changes the meaning of a
/// base opcode. Names found in no table are unknown opcodes and pass through
/// unconverted as text.
///
/// # Example
///
/// ```text
/// <group>
/// ampeg_release=0.2  // Float
/// <region>
/// lokey=36           // IntRange(0, 127)
/// tune=-5            // IntRange(-100, 100)
/// loop_mode=one_shot // Enum
/// sample=kick.wav    // Text
/// ```
mod values;

pub use self::values::*;

use std::result::Result as StdResult;

use crate::parser::error::Error;
type Result<T> = StdResult<T, Error>;

/// How the raw text of an opcode is converted and validated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpcodeKind {
    /// Integer within `[min, max]`, both bounds inclusive
    IntRange { min: i64, max: i64 },
    /// Unbounded integer
    Int,
    /// Floating point number
    Float,
    /// One of a fixed set of names
    Enum(&'static [&'static str]),
    /// Free-form text, kept as written
    Text,
}

impl OpcodeKind {
    /// Convert the raw text of `opcode` into a typed value
    ///
    /// # Errors
    ///
    /// - `MalformedValue` if the text is not a number of the required type
    /// - `Range` if an integer falls outside `IntRange` bounds
    /// - `InvalidEnum` if the text is not a member of the enumerated set
    pub fn convert(&self, opcode: &str, raw: &str) -> Result<Value> {
        match *self {
            OpcodeKind::IntRange { min, max } => {
                let value = parse_int(opcode, raw)?;
                if value < min || value > max {
                    return Err(Error::Range {
                        opcode: opcode.to_string(),
                        value,
                        min,
                        max,
                        line: None,
                    });
                }
                Ok(Value::Int(value))
            }
            OpcodeKind::Int => parse_int(opcode, raw).map(Value::Int),
            OpcodeKind::Float => parse_float(opcode, raw).map(Value::Float),
            OpcodeKind::Enum(allowed) => allowed
                .iter()
                .copied()
                .find(|name| *name == raw)
                .map(Value::Enum)
                .ok_or_else(|| Error::InvalidEnum {
                    opcode: opcode.to_string(),
                    value: raw.to_string(),
                    allowed,
                    line: None,
                }),
            OpcodeKind::Text => Ok(Value::Text(raw.to_string())),
        }
    }

    /// Check an already typed value against this rule
    ///
    /// Text is converted as if it had been read from a file. Integers are
    /// accepted for float opcodes and widened.
    ///
    /// # Errors
    ///
    /// The same errors as [`OpcodeKind::convert`], plus `WrongType` when the
    /// value's type cannot hold this opcode.
    pub fn check(&self, opcode: &str, value: &Value) -> Result<Value> {
        match (*self, value) {
            (_, Value::Text(raw)) => self.convert(opcode, raw),
            (OpcodeKind::IntRange { min, max }, Value::Int(v)) => {
                if *v < min || *v > max {
                    return Err(Error::Range {
                        opcode: opcode.to_string(),
                        value: *v,
                        min,
                        max,
                        line: None,
                    });
                }
                Ok(Value::Int(*v))
            }
            (OpcodeKind::Int, Value::Int(v)) => Ok(Value::Int(*v)),
            (OpcodeKind::Float, Value::Int(v)) => Ok(Value::Float(*v as f64)),
            (OpcodeKind::Float, Value::Float(v)) if v.is_finite() => Ok(Value::Float(*v)),
            (OpcodeKind::Float, Value::Float(v)) => Err(Error::MalformedValue {
                opcode: opcode.to_string(),
                value: v.to_string(),
                expected: "float",
                line: None,
            }),
            (OpcodeKind::Enum(_), Value::Enum(name)) => self.convert(opcode, name),
            (kind, other) => Err(Error::WrongType {
                opcode: opcode.to_string(),
                expected: kind.type_name(),
                found: other.type_name(),
            }),
        }
    }

    /// Name of the value type this rule produces
    pub fn type_name(&self) -> &'static str {
        match self {
            OpcodeKind::IntRange { .. } | OpcodeKind::Int => "integer",
            OpcodeKind::Float => "float",
            OpcodeKind::Enum(_) => "enum",
            OpcodeKind::Text => "text",
        }
    }
}

fn parse_int(opcode: &str, raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| Error::MalformedValue {
        opcode: opcode.to_string(),
        value: raw.to_string(),
        expected: "integer",
        line: None,
    })
}

fn parse_float(opcode: &str, raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::MalformedValue {
            opcode: opcode.to_string(),
            value: raw.to_string(),
            expected: "float",
            line: None,
        }),
    }
}

/// An opcode name together with its conversion rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpcodeSpec {
    pub name: &'static str,
    pub kind: OpcodeKind,
}

const fn spec(name: &'static str, kind: OpcodeKind) -> OpcodeSpec {
    OpcodeSpec { name, kind }
}

const MIDI: OpcodeKind = OpcodeKind::IntRange { min: 0, max: 127 };

/// Opcodes of the base SFZ format
pub static SFZ_OPCODES: &[OpcodeSpec] = &[
    spec("lokey", MIDI),
    spec("hikey", MIDI),
    spec("lovel", MIDI),
    spec("hivel", MIDI),
    spec("pitch_keycenter", MIDI),
    spec("tune", OpcodeKind::IntRange { min: -100, max: 100 }),
    spec("offset", OpcodeKind::Int),
    spec("loop_start", OpcodeKind::Int),
    spec("loop_end", OpcodeKind::Int),
    spec("group", OpcodeKind::Int),
    spec("off_group", OpcodeKind::Int),
    spec("volume", OpcodeKind::Float),
    spec("loop_crossfade", OpcodeKind::Float),
    spec("ampeg_attack", OpcodeKind::Float),
    spec("ampeg_hold", OpcodeKind::Float),
    spec("ampeg_decay", OpcodeKind::Float),
    // a percentage by convention; no bound is enforced
    spec("ampeg_sustain", OpcodeKind::Float),
    spec("ampeg_release", OpcodeKind::Float),
    spec("loop_mode", OpcodeKind::Enum(LOOP_MODES)),
    spec("sample", OpcodeKind::Text),
];

/// Opcodes added by the JMZ extension
pub static JMZ_OPCODES: &[OpcodeSpec] = &[
    spec("jm_vol", OpcodeKind::Int),
    spec("jm_chan", OpcodeKind::IntRange { min: 1, max: 16 }),
    spec("jm_name", OpcodeKind::Text),
    spec("jm_mute", OpcodeKind::Int),
    spec("jm_solo", OpcodeKind::Int),
];

/// Find the conversion rule for `name` in a single table
pub fn lookup(table: &[OpcodeSpec], name: &str) -> Option<OpcodeKind> {
    table.iter().find(|s| s.name == name).map(|s| s.kind)
}
