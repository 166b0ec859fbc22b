//! Format variants: the base SFZ descriptor and the JMZ extension.
//!
//! A [`Format`] is composed from a base [`Descriptor`] and an optional
//! extension descriptor. Composition concatenates the opcode tables (base
//! first), merges the default tables and prepends the extension's write
//! order to the base order.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::parser::error::Error;
use crate::parser::opcodes::{lookup, OpcodeKind, OpcodeSpec, Value, JMZ_OPCODES, SFZ_OPCODES};

type Result<T> = std::result::Result<T, Error>;

/// Opcode name to converted value, ordered by name
pub type OpcodeMap = BTreeMap<String, Value>;

/// Keys every region must hold when its scope closes
pub const REQUIRED_KEYS: &[&str] = &["sample"];

/// Seed for a default table entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Seed {
    Int(i64),
    Float(f64),
    Text(&'static str),
}

impl From<Seed> for Value {
    fn from(seed: Seed) -> Self {
        match seed {
            Seed::Int(i) => Value::Int(i),
            Seed::Float(f) => Value::Float(f),
            Seed::Text(s) => Value::Text(s.to_string()),
        }
    }
}

/// Static description of one layer of a format
#[derive(Debug)]
pub struct Descriptor {
    pub opcodes: &'static [OpcodeSpec],
    pub region_defaults: &'static [(&'static str, Seed)],
    pub control_defaults: &'static [(&'static str, Seed)],
    pub region_order: &'static [&'static str],
    pub control_order: &'static [&'static str],
}

// loop_mode, loop_start and loop_end are deliberately absent: when a patch
// does not set them the engine takes them from the sample file
pub static SFZ: Descriptor = Descriptor {
    opcodes: SFZ_OPCODES,
    region_defaults: &[
        ("volume", Seed::Float(0.0)),
        ("pitch_keycenter", Seed::Int(32)),
        ("lokey", Seed::Int(0)),
        ("hikey", Seed::Int(127)),
        ("lovel", Seed::Int(0)),
        ("hivel", Seed::Int(127)),
        ("tune", Seed::Int(0)),
        ("offset", Seed::Int(0)),
        ("loop_crossfade", Seed::Float(0.0)),
        ("group", Seed::Int(0)),
        ("off_group", Seed::Int(0)),
        ("ampeg_attack", Seed::Float(0.0)),
        ("ampeg_hold", Seed::Float(0.0)),
        ("ampeg_decay", Seed::Float(0.0)),
        ("ampeg_sustain", Seed::Float(100.0)),
        ("ampeg_release", Seed::Float(0.0)),
    ],
    control_defaults: &[],
    region_order: &[
        "volume",
        "pitch_keycenter",
        "lokey",
        "hikey",
        "lovel",
        "hivel",
        "tune",
        "offset",
        "loop_start",
        "loop_end",
        "loop_mode",
        "loop_crossfade",
        "group",
        "off_group",
        "ampeg_attack",
        "ampeg_hold",
        "ampeg_decay",
        "ampeg_sustain",
        "ampeg_release",
        "sample",
    ],
    control_order: &[],
};

pub static JMZ_EXTENSION: Descriptor = Descriptor {
    opcodes: JMZ_OPCODES,
    region_defaults: &[
        ("jm_name", Seed::Text("")),
        ("jm_mute", Seed::Int(0)),
        ("jm_solo", Seed::Int(0)),
    ],
    control_defaults: &[("jm_vol", Seed::Int(0)), ("jm_chan", Seed::Int(1))],
    region_order: &["jm_name", "jm_mute", "jm_solo"],
    control_order: &["jm_vol", "jm_chan"],
};

/// Which flavour of the format a document is read and written as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Plain SFZ
    Sfz,
    /// SFZ plus the `jm_*` extension opcodes and a `<control>` scope
    Jmz,
}

impl Variant {
    /// Pick a variant from a file name: `.jmz` is JMZ, anything else SFZ
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let is_jmz = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("jmz"))
            .unwrap_or(false);
        if is_jmz {
            Variant::Jmz
        } else {
            Variant::Sfz
        }
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Variant::Sfz => "sfz",
            Variant::Jmz => "jmz",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sfz" => Ok(Variant::Sfz),
            "jmz" => Ok(Variant::Jmz),
            other => Err(Error::Config(format!("unknown format '{}'", other))),
        }
    }
}

/// A fully composed format: validator chain, defaults and write orders
///
/// The default tables are shared behind `Arc` and never mutated after
/// construction. Every scope that starts from them takes its own copy.
#[derive(Debug, Clone)]
pub struct Format {
    variant: Variant,
    tables: Vec<&'static [OpcodeSpec]>,
    region_defaults: Arc<OpcodeMap>,
    control_defaults: Arc<OpcodeMap>,
    region_order: Vec<&'static str>,
    control_order: Vec<&'static str>,
}

impl Format {
    /// Compose a format from a base descriptor and an optional extension
    pub fn compose(variant: Variant, base: &Descriptor, extension: Option<&Descriptor>) -> Self {
        let mut tables = vec![base.opcodes];
        let mut region_defaults = seed_map(base.region_defaults);
        let mut control_defaults = seed_map(base.control_defaults);
        let mut region_order = Vec::new();
        let mut control_order = Vec::new();

        if let Some(ext) = extension {
            tables.push(ext.opcodes);
            for (name, value) in seed_map(ext.region_defaults) {
                region_defaults.entry(name).or_insert(value);
            }
            for (name, value) in seed_map(ext.control_defaults) {
                control_defaults.entry(name).or_insert(value);
            }
            region_order.extend_from_slice(ext.region_order);
            control_order.extend_from_slice(ext.control_order);
        }
        region_order.extend_from_slice(base.region_order);
        control_order.extend_from_slice(base.control_order);

        Self {
            variant,
            tables,
            region_defaults: Arc::new(region_defaults),
            control_defaults: Arc::new(control_defaults),
            region_order,
            control_order,
        }
    }

    /// The base SFZ format
    pub fn sfz() -> Self {
        Self::compose(Variant::Sfz, &SFZ, None)
    }

    /// SFZ extended with the JMZ opcodes
    pub fn jmz() -> Self {
        Self::compose(Variant::Jmz, &SFZ, Some(&JMZ_EXTENSION))
    }

    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Sfz => Self::sfz(),
            Variant::Jmz => Self::jmz(),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Conversion rule for `name`, consulting the tables in order
    pub fn kind_of(&self, name: &str) -> Option<OpcodeKind> {
        self.tables.iter().find_map(|table| lookup(table, name))
    }

    /// Convert and validate the raw text of an opcode
    ///
    /// Unknown opcodes are not an error; their text is kept unconverted.
    pub fn convert(&self, name: &str, raw: &str) -> Result<Value> {
        match self.kind_of(name) {
            Some(kind) => kind.convert(name, raw),
            None => {
                log::trace!("unknown opcode {} passed through", name);
                Ok(Value::Text(raw.to_string()))
            }
        }
    }

    /// Validate an already typed value for `name`
    ///
    /// Unknown opcodes accept any value.
    pub fn check(&self, name: &str, value: &Value) -> Result<Value> {
        match self.kind_of(name) {
            Some(kind) => kind.check(name, value),
            None => Ok(value.clone()),
        }
    }

    pub fn region_defaults(&self) -> &OpcodeMap {
        &self.region_defaults
    }

    pub fn control_defaults(&self) -> &OpcodeMap {
        &self.control_defaults
    }

    pub fn region_order(&self) -> &[&'static str] {
        &self.region_order
    }

    pub fn control_order(&self) -> &[&'static str] {
        &self.control_order
    }

    /// Whether documents of this format carry a `<control>` line when written
    pub fn has_control(&self) -> bool {
        !self.control_order.is_empty()
    }
}

fn seed_map(seeds: &[(&'static str, Seed)]) -> OpcodeMap {
    seeds
        .iter()
        .map(|(name, seed)| (name.to_string(), Value::from(*seed)))
        .collect()
}
