use thiserror::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::parser::types::Region;

/// Optional 1-based source line attached to an error
///
/// Value errors raised while editing a document programmatically have no
/// line; the parser fills it in before returning the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Line(pub Option<usize>);

impl Line {
    pub fn of(line: &Option<usize>) -> Self {
        Line(*line)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(line) => write!(f, " (line {})", line),
            None => Ok(()),
        }
    }
}

/// Errors that can occur while parsing, editing or writing a patch
///
/// All of the value errors abort a parse immediately: a malformed file never
/// yields a partial document. Problems that do not invalidate the document
/// are reported as [`Warning`]s instead.
///
/// # Common Errors
///
/// - `lokey=128`: out of the MIDI range, reported as `Range`
/// - `loop_mode=forever`: not a known loop mode, reported as `InvalidEnum`
/// - `offset=12k`: not an integer, reported as `MalformedValue`
/// - a `<region>` with no `sample=`: reported as `MissingRequiredKey`
#[derive(Error, Debug)]
pub enum Error {
    /// Input/Output error when reading or writing a patch
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// Integer value outside the opcode's legal interval
    #[error("{opcode} must be between {min} and {max}: {value}{}", Line::of(.line))]
    Range {
        opcode: String,
        value: i64,
        min: i64,
        max: i64,
        line: Option<usize>,
    },

    /// Value not in the opcode's set of legal names
    #[error("{opcode} must be one of {}: {value}{}", .allowed.join(", "), Line::of(.line))]
    InvalidEnum {
        opcode: String,
        value: String,
        allowed: &'static [&'static str],
        line: Option<usize>,
    },

    /// Text that could not be converted to the opcode's numeric type
    #[error("{opcode} expects {expected}, got '{value}'{}", Line::of(.line))]
    MalformedValue {
        opcode: String,
        value: String,
        expected: &'static str,
        line: Option<usize>,
    },

    /// A region was closed without a mandatory opcode
    ///
    /// The partially built region is kept so a caller can show what was
    /// parsed before the problem.
    #[error("region missing required key \"{key}\"{}", Line::of(.line))]
    MissingRequiredKey {
        key: String,
        region: Box<Region>,
        line: Option<usize>,
    },

    /// An assignment with nothing before the `=`
    #[error("opcode name missing before '=' in '{text}'{}", Line::of(.line))]
    Syntax { text: String, line: Option<usize> },

    /// A typed accessor asked for an opcode the region does not have
    #[error("Opcode '{0}' not found")]
    MissingOpcode(String),

    /// A typed accessor asked for a different type than the stored one
    #[error("{opcode} holds a {found} value, not {expected}")]
    WrongType {
        opcode: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A region's sample does not name a readable regular file
    #[error("Sample not found: {0}")]
    SampleNotFound(PathBuf),

    /// Region index outside the document
    #[error("No region at index {0}")]
    NoSuchRegion(usize),

    /// Parse options could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Attach a source line to value errors that do not have one yet
    pub(crate) fn at_line(mut self, at: usize) -> Self {
        match &mut self {
            Error::Range { line, .. }
            | Error::InvalidEnum { line, .. }
            | Error::MalformedValue { line, .. }
            | Error::MissingRequiredKey { line, .. }
            | Error::Syntax { line, .. } => {
                line.get_or_insert(at);
            }
            _ => {}
        }
        self
    }

    /// The source line the error refers to, when known
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Range { line, .. }
            | Error::InvalidEnum { line, .. }
            | Error::MalformedValue { line, .. }
            | Error::MissingRequiredKey { line, .. }
            | Error::Syntax { line, .. } => *line,
            _ => None,
        }
    }
}

/// Non-fatal diagnostics collected during a parse
///
/// These never abort parsing. They are logged as they occur and kept on the
/// resulting [`Document`](crate::parser::Document) so an editor can show them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Warning {
    /// A section tag other than `<control>`, `<group>` or `<region>`
    #[error("unhandled section <{name}> at line {line}")]
    UnrecognizedSection { name: String, line: usize },

    /// An assignment before the first section tag
    #[error("opcode {opcode} outside of any section at line {line}, ignored")]
    OutsideSection { opcode: String, line: usize },

    /// Text with no opcode to continue, e.g. right after a tag
    #[error("stray text '{text}' at line {line}, ignored")]
    StrayText { text: String, line: usize },

    /// A region without a required key was dropped instead of aborting
    #[error("region ending at line {line} skipped: missing required key \"{key}\"")]
    RegionSkipped { key: String, line: usize },
}
