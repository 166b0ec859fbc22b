//! Subcommand implementations.

use anyhow::{Context, Result};
use jmage_sfz::{parse_file, Document, Format, ParseOptions, Variant};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn load(path: &Path, format: Option<Variant>, options: &ParseOptions) -> Result<Document> {
    let variant = format.unwrap_or_else(|| Variant::from_path(path));
    parse_file(path, Format::for_variant(variant), options)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn check<W: Write>(
    out: &mut W,
    path: &Path,
    format: Option<Variant>,
    options: &ParseOptions,
) -> Result<()> {
    let doc = load(path, format, options)?;
    for warning in doc.warnings() {
        writeln!(out, "warning: {}", warning)?;
    }
    writeln!(
        out,
        "{}: {} {} regions, {} warnings",
        path.display(),
        doc.variant(),
        doc.regions().len(),
        doc.warnings().len()
    )?;
    Ok(())
}

pub fn dump<W: Write>(
    out: &mut W,
    path: &Path,
    format: Option<Variant>,
    options: &ParseOptions,
) -> Result<()> {
    let doc = load(path, format, options)?;
    for (index, region) in doc.regions().iter().enumerate() {
        writeln!(
            out,
            "{:>3}  key {:>3}-{:<3}  vel {:>3}-{:<3}  center {:>3}  {}",
            index,
            region.get::<i64>("lokey")?,
            region.get::<i64>("hikey")?,
            region.get::<i64>("lovel")?,
            region.get::<i64>("hivel")?,
            region.get::<i64>("pitch_keycenter")?,
            region.sample().unwrap_or_default()
        )?;
    }
    Ok(())
}

pub fn convert<W: Write>(
    out: &mut W,
    input: &Path,
    output: &Path,
    format: Option<Variant>,
    options: &ParseOptions,
) -> Result<()> {
    let doc = load(input, format, options)?;
    let target = Variant::from_path(output);
    let converted = doc
        .convert(Format::for_variant(target))
        .with_context(|| format!("Failed to convert {} to {}", input.display(), target))?;

    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    converted
        .write(&mut writer)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    log::info!("Wrote {} regions to {}", converted.regions().len(), output.display());
    writeln!(out, "{} -> {} ({})", input.display(), output.display(), target)?;
    Ok(())
}
