//! Patch loading and sample management.

use crate::config::ParseOptions;
use crate::parser::{parse_patch_with, Document};
use crate::types::Zone;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Callback type for loading a sample file into the engine.
///
/// Called once per distinct resolved sample path.
pub type SampleLoadCallback<'a> = &'a mut dyn FnMut(&Path) -> Result<()>;

/// A parsed patch together with the zones built from it.
#[derive(Debug, Clone)]
pub struct Patch {
    pub document: Document,
    pub zones: Vec<Zone>,
}

impl Patch {
    /// Distinct sample files used by the zones, in first-use order.
    pub fn samples(&self) -> Vec<&Path> {
        let mut seen = HashSet::new();
        self.zones
            .iter()
            .map(|zone| zone.path.as_path())
            .filter(|path| seen.insert(*path))
            .collect()
    }
}

/// Load a patch file and build its zones.
///
/// The format is chosen from the file extension. Samples are loaded through
/// `load_sample`; a sample shared by several zones is loaded only once.
///
/// # Example
///
/// ```ignore
/// let patch = load_patch(
///     "drums.jmz",
///     &ParseOptions::default(),
///     DEFAULT_SAMPLE_RATE,
///     &mut |path| engine.load_wave(path),
/// )?;
/// ```
pub fn load_patch<P: AsRef<Path>>(
    path: P,
    options: &ParseOptions,
    sample_rate: u32,
    load_sample: SampleLoadCallback,
) -> Result<Patch> {
    let path = path.as_ref();

    let document = parse_patch_with(path, options)
        .with_context(|| format!("Failed to parse patch file: {}", path.display()))?;
    let zones = document
        .zones(sample_rate)
        .with_context(|| format!("Failed to build zones for {}", path.display()))?;

    let mut loaded: HashSet<PathBuf> = HashSet::new();
    for zone in &zones {
        if loaded.contains(&zone.path) {
            log::debug!("Reusing sample: {}", zone.path.display());
            continue;
        }
        log::debug!("Loading sample: {}", zone.path.display());
        load_sample(zone.path.as_path())
            .with_context(|| format!("Failed to load sample: {}", zone.path.display()))?;
        loaded.insert(zone.path.clone());
    }

    log::info!(
        "Loaded {} zones from {} ({} samples)",
        zones.len(),
        path.display(),
        loaded.len()
    );

    Ok(Patch { document, zones })
}
