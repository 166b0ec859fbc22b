use std::fmt;
use std::str::FromStr;

use crate::parser::error::Error;
use super::Result;

/// A converted opcode value
///
/// Every value in an SFZ/JMZ file is text on disk. Once an opcode has been
/// looked up in the format's opcode table its raw text is converted into one
/// of these variants, so the rest of the crate never has to re-parse strings.
///
/// # Value Types
///
/// - **Int**: key numbers, velocities, frame offsets (e.g. `lokey=36`)
/// - **Float**: volumes and envelope times (e.g. `ampeg_release=0.5`)
/// - **Enum**: one member of a fixed set (e.g. `loop_mode=one_shot`)
/// - **Text**: sample paths, display names and any unknown opcode
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Member of an enumerated set, always the canonical table spelling
    Enum(&'static str),
    /// Free-form text
    Text(String),
}

impl Value {
    /// Name of the variant, used in type mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Enum(_) => "enum",
            Value::Text(_) => "text",
        }
    }

    /// Returns the value as an integer if it is one
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float if it is one
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the textual content of enum and text values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Enum(s) => Some(s),
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Values are written with the default formatting of their type. Floats use
/// the shortest representation that reads back to the same number, so `0.0`
/// is written as `0` and `0.25` as `0.25`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Enum(s) => f.write_str(s),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<LoopMode> for Value {
    fn from(mode: LoopMode) -> Self {
        Value::Enum(mode.as_str())
    }
}

/// Trait for reading a typed value back out of a converted opcode
///
/// This is the typed accessor used by [`Region::get`](crate::parser::Region::get):
/// the opcode table already fixed the value's variant during parsing, so
/// extraction only has to check that the caller asked for the matching type.
pub trait FromValue: Sized {
    /// Extract `Self` from a value stored under `opcode`
    ///
    /// # Errors
    ///
    /// Returns `Error::WrongType` if the stored variant does not match.
    fn from_value(opcode: &str, value: &Value) -> Result<Self>;
}

fn wrong_type(opcode: &str, expected: &'static str, value: &Value) -> Error {
    Error::WrongType {
        opcode: opcode.to_string(),
        expected,
        found: value.type_name(),
    }
}

impl FromValue for i64 {
    fn from_value(opcode: &str, value: &Value) -> Result<Self> {
        value.as_int().ok_or_else(|| wrong_type(opcode, "integer", value))
    }
}

impl FromValue for u8 {
    fn from_value(opcode: &str, value: &Value) -> Result<Self> {
        let v = i64::from_value(opcode, value)?;
        u8::try_from(v).map_err(|_| Error::Range {
            opcode: opcode.to_string(),
            value: v,
            min: 0,
            max: i64::from(u8::MAX),
            line: None,
        })
    }
}

impl FromValue for f64 {
    fn from_value(opcode: &str, value: &Value) -> Result<Self> {
        value.as_float().ok_or_else(|| wrong_type(opcode, "float", value))
    }
}

impl FromValue for String {
    fn from_value(opcode: &str, value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| wrong_type(opcode, "text", value))
    }
}

impl FromValue for LoopMode {
    fn from_value(opcode: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Enum(s) => s.parse(),
            other => Err(wrong_type(opcode, "enum", other)),
        }
    }
}

/// Legal values of `loop_mode`
///
/// The set has grown across revisions of the format (`one_shot` was added
/// after the first two), so it lives in one place and is referenced by the
/// opcode table rather than being spelled out at each use.
pub const LOOP_MODES: &[&str] = &["no_loop", "loop_continuous", "one_shot"];

/// Loop modes for sample playback
///
/// # Examples in SFZ
///
/// ```text
/// loop_mode=no_loop
/// loop_mode=loop_continuous
/// loop_mode=one_shot
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// No looping, sample plays once
    NoLoop,
    /// Sample loops between loop_start and loop_end until released
    LoopContinuous,
    /// Sample plays to the end, ignoring note-off
    OneShot,
}

impl LoopMode {
    /// The opcode spelling of this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopMode::NoLoop => "no_loop",
            LoopMode::LoopContinuous => "loop_continuous",
            LoopMode::OneShot => "one_shot",
        }
    }
}

impl FromStr for LoopMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "no_loop" => Ok(LoopMode::NoLoop),
            "loop_continuous" => Ok(LoopMode::LoopContinuous),
            "one_shot" => Ok(LoopMode::OneShot),
            _ => Err(Error::InvalidEnum {
                opcode: "loop_mode".to_string(),
                value: s.to_string(),
                allowed: LOOP_MODES,
                line: None,
            }),
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_default_formatting() {
        assert_eq!(Value::Int(-5).to_string(), "-5");
        assert_eq!(Value::Float(0.0).to_string(), "0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::Float(100.0).to_string(), "100");
        assert_eq!(Value::Enum("one_shot").to_string(), "one_shot");
        assert_eq!(Value::Text("My Sample.wav".into()).to_string(), "My Sample.wav");
    }

    #[test]
    fn test_loop_mode_names() {
        for name in LOOP_MODES {
            let mode: LoopMode = name.parse().unwrap();
            assert_eq!(mode.as_str(), *name);
        }
        assert!(matches!(
            "loop_sustain".parse::<LoopMode>(),
            Err(Error::InvalidEnum { .. })
        ));
    }

    #[test]
    fn test_from_value_type_checks() {
        assert_eq!(i64::from_value("lokey", &Value::Int(3)).unwrap(), 3);
        assert_eq!(u8::from_value("lokey", &Value::Int(127)).unwrap(), 127);
        assert!(matches!(
            u8::from_value("offset", &Value::Int(300)),
            Err(Error::Range { .. })
        ));
        assert!(matches!(
            f64::from_value("volume", &Value::Int(1)),
            Err(Error::WrongType { expected: "float", found: "integer", .. })
        ));
        assert_eq!(
            LoopMode::from_value("loop_mode", &Value::Enum("one_shot")).unwrap(),
            LoopMode::OneShot
        );
    }
}
