//! SFZ and JMZ patch support for the jmage sampler.
//!
//! This crate provides:
//! - A single-pass parser for SFZ patches and the JMZ superset
//! - Typed opcode validation with line-numbered errors
//! - A document model that can be edited and written back to text
//! - Conversion of regions into engine zones and note matching
//!
//! # Example
//!
//! ```
//! use jmage_sfz::{find_matching_zones, parse_sfz_str, DEFAULT_SAMPLE_RATE};
//!
//! let doc = parse_sfz_str("<group> lovel=1 <region> sample=kick.wav lokey=36 hikey=36").unwrap();
//! let zones = doc.zones(DEFAULT_SAMPLE_RATE).unwrap();
//! assert_eq!(find_matching_zones(&zones, 36, 100).len(), 1);
//! ```

pub mod config;
pub mod loader;
pub mod parser;
pub mod region_matcher;
pub mod types;

pub use config::{MissingKeyPolicy, ParseOptions};
pub use loader::*;
pub use region_matcher::*;
pub use types::*;

// Re-export parser types for convenience
pub use parser::{
    check_samples, parse_file, parse_jmz, parse_jmz_str, parse_patch, parse_patch_with, parse_sfz,
    parse_sfz_str, Document, Error, Format, LoopMode, Region, Value, Variant, Warning,
};
