//! SFZ/JMZ parser
//!
//! Type-safe, single-pass parser and writer for the SFZ instrument format and
//! its JMZ superset.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

mod parse;
mod types;
mod error;
mod format;
mod write;
pub mod opcodes;
pub mod path_utils;

// Export main types
pub use types::{Document, Region};
pub use error::{Error, Line, Warning};
pub use format::{Descriptor, Format, OpcodeMap, Seed, Variant, JMZ_EXTENSION, REQUIRED_KEYS, SFZ};
pub use parse::Parser;
pub use opcodes::{FromValue, LoopMode, OpcodeKind, Value, LOOP_MODES};

// Export path utilities
pub use path_utils::{normalize_path, resolve_sample_path};

use crate::config::ParseOptions;

pub type Result<T> = std::result::Result<T, Error>;

/// Parse SFZ text held in memory
pub fn parse_sfz_str(content: &str) -> Result<Document> {
    Parser::new(content.as_bytes(), Format::sfz()).parse()
}

/// Parse JMZ text held in memory
pub fn parse_jmz_str(content: &str) -> Result<Document> {
    Parser::new(content.as_bytes(), Format::jmz()).parse()
}

/// Parse an SFZ file
pub fn parse_sfz<P: AsRef<Path>>(path: P) -> Result<Document> {
    parse_file(path, Format::sfz(), &ParseOptions::default())
}

/// Parse a JMZ file, accepting the SFZ grammar plus the extension opcodes
pub fn parse_jmz<P: AsRef<Path>>(path: P) -> Result<Document> {
    parse_file(path, Format::jmz(), &ParseOptions::default())
}

/// Parse a patch file, choosing the format from its extension
///
/// `.jmz` files are read as JMZ, everything else as SFZ.
pub fn parse_patch<P: AsRef<Path>>(path: P) -> Result<Document> {
    parse_patch_with(path, &ParseOptions::default())
}

/// Parse a patch file with explicit options, choosing the format from its extension
pub fn parse_patch_with<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<Document> {
    let variant = Variant::from_path(path.as_ref());
    parse_file(path, Format::for_variant(variant), options)
}

/// Parse a file as `format`
///
/// The file is open only for the duration of the parse and is closed on
/// every exit path, including validation failures. The document remembers
/// the file's absolute path for resolving relative sample paths.
pub fn parse_file<P: AsRef<Path>>(
    path: P,
    format: Format,
    options: &ParseOptions,
) -> Result<Document> {
    let path = path.as_ref();
    log::info!("Parsing {} patch {}", format.variant(), path.display());

    let file = File::open(path)?;
    let mut doc = Parser::new(BufReader::new(file), format)
        .with_options(options.clone())
        .parse()?;

    let absolute_path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    doc.set_source_file(Some(absolute_path));

    if options.check_samples {
        check_samples(&doc)?;
    }

    log::info!(
        "Found {} regions ({} warnings)",
        doc.regions().len(),
        doc.warnings().len()
    );
    Ok(doc)
}

/// Make sure every region's sample resolves to an existing regular file
pub fn check_samples(doc: &Document) -> Result<()> {
    for region in doc.regions() {
        if let Some(sample) = doc.resolve_sample_path(region) {
            if !sample.is_file() {
                return Err(Error::SampleNotFound(sample));
            }
        }
    }
    Ok(())
}
