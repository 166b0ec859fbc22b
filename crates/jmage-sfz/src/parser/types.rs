use std::collections::btree_map;
use std::path::{Path, PathBuf};

use crate::parser::error::{Error, Warning};
use crate::parser::format::{Format, OpcodeMap, Variant, REQUIRED_KEYS};
use crate::parser::opcodes::{FromValue, Value};
use crate::parser::path_utils::resolve_sample_path;

type Result<T> = std::result::Result<T, Error>;

/// A parsed instrument definition
///
/// A document holds the regions of a patch in the order they appeared, the
/// file-level `<control>` scope and the [`Format`] it was read as. The
/// format supplies the default tables and write order; the document never
/// changes them.
///
/// # Inheritance
///
/// Every region's value for a defaulted opcode is resolved by a strict
/// override chain:
///
/// 1. the format's built-in default
/// 2. the enclosing `<group>`'s value
/// 3. the region's own assignment
///
/// ```text
/// <group> ampeg_release=0.2
/// <region> sample=a.wav              // ampeg_release=0.2 from the group
/// <region> sample=b.wav ampeg_release=1  // overrides the group
/// <group>
/// <region> sample=c.wav              // back to the default of 0
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    format: Format,
    control: OpcodeMap,
    regions: Vec<Region>,
    warnings: Vec<Warning>,
    source_file: Option<PathBuf>,
}

impl Document {
    /// Creates an empty document of the given format
    ///
    /// The control scope starts out holding the format's control defaults.
    pub fn new(format: Format) -> Self {
        let control = format.control_defaults().clone();
        Self {
            format,
            control,
            regions: Vec::new(),
            warnings: Vec::new(),
            source_file: None,
        }
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn variant(&self) -> Variant {
        self.format.variant()
    }

    /// The file-level `<control>` scope
    pub fn control(&self) -> &OpcodeMap {
        &self.control
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    /// Diagnostics collected while parsing this document
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Path of the file this document was parsed from, if any
    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    pub fn set_source_file(&mut self, path: Option<PathBuf>) {
        self.source_file = path;
    }

    /// Append a region built from the format defaults overlaid with `partial`
    ///
    /// This applies the same default overlay the parser applies, so a region
    /// added here has the same shape as one read from a file. Each value is
    /// checked against the format's opcode table; text values are converted
    /// as if read from a file. Required keys are not checked here;
    /// [`Document::write`] checks them before writing.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid value and leaves the document unchanged.
    pub fn add_region<I, K, V>(&mut self, partial: I) -> Result<&Region>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut region = Region::from_map(self.format.region_defaults().clone());
        for (name, value) in partial {
            let name = name.into();
            let value = self.format.check(&name, &value.into())?;
            region.set(name, value);
        }
        let index = self.regions.len();
        self.regions.push(region);
        Ok(&self.regions[index])
    }

    /// Remove and return the region at `index`
    pub fn remove_region(&mut self, index: usize) -> Result<Region> {
        if index >= self.regions.len() {
            return Err(Error::NoSuchRegion(index));
        }
        Ok(self.regions.remove(index))
    }

    /// Validate `raw` for `name` and store it in the region at `index`
    pub fn set_opcode(&mut self, index: usize, name: &str, raw: &str) -> Result<()> {
        let value = self.format.convert(name, raw)?;
        let region = self
            .regions
            .get_mut(index)
            .ok_or(Error::NoSuchRegion(index))?;
        region.set(name, value);
        Ok(())
    }

    /// Validate `raw` for `name` and store it in the control scope
    pub fn set_control(&mut self, name: &str, raw: &str) -> Result<()> {
        let value = self.format.convert(name, raw)?;
        self.control.insert(name.to_string(), value);
        Ok(())
    }

    /// Check every region for the required keys and every value against
    /// the format's opcode table
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredKey` for the first incomplete region, or the
    /// value error for the first value the format rejects.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in &self.control {
            self.format.check(name, value)?;
        }
        for region in &self.regions {
            region.check_required()?;
            for (name, value) in region {
                self.format.check(name, value)?;
            }
        }
        Ok(())
    }

    /// Re-base this document onto another format
    ///
    /// Each region and the control scope are overlaid on the target format's
    /// defaults, so e.g. an SFZ patch converted to JMZ gains `jm_name`.
    /// Every value is checked again by the target format, so opcodes the
    /// source kept as plain text become typed.
    ///
    /// # Errors
    ///
    /// Fails if a value is not valid in the target format.
    pub fn convert(&self, format: Format) -> Result<Document> {
        let mut doc = Document::new(format);
        for (name, value) in &self.control {
            let value = doc.format.check(name, value)?;
            doc.control.insert(name.clone(), value);
        }
        for region in &self.regions {
            let mut converted = Region::from_map(doc.format.region_defaults().clone());
            for (name, value) in region {
                converted.set(name.clone(), doc.format.check(name, value)?);
            }
            doc.regions.push(converted);
        }
        doc.source_file = self.source_file.clone();
        Ok(doc)
    }

    /// Resolve a region's sample against this document's directory
    ///
    /// Relative samples are taken relative to the directory of the file the
    /// document was parsed from. Returns `None` if the region has no sample.
    pub fn resolve_sample_path(&self, region: &Region) -> Option<PathBuf> {
        let sample = region.sample()?;
        Some(resolve_sample_path(sample, self.source_file.as_deref()))
    }

    pub(crate) fn control_mut(&mut self) -> &mut OpcodeMap {
        &mut self.control
    }

    pub(crate) fn push_region(&mut self, region: Region) {
        self.regions.push(region);
    }

    pub(crate) fn push_warning(&mut self, warning: Warning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// One keyboard/velocity range mapped to a sample
///
/// A region owns its opcode map outright: it is a copy of the group it was
/// opened in, so editing it never reaches back into the group or the
/// format defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Region {
    opcodes: OpcodeMap,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_map(opcodes: OpcodeMap) -> Self {
        Self { opcodes }
    }

    /// Store a value, replacing any earlier value for the same opcode
    pub fn set<K: Into<String>, V: Into<Value>>(&mut self, name: K, value: V) {
        self.opcodes.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.opcodes.remove(name)
    }

    /// Raw converted value of an opcode
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.opcodes.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.opcodes.contains_key(name)
    }

    /// Typed value of an opcode
    ///
    /// # Errors
    ///
    /// `MissingOpcode` if absent, `WrongType` if stored as another type.
    ///
    /// # Example
    ///
    /// ```
    /// use jmage_sfz::parser::{Region, Value};
    ///
    /// let mut region = Region::new();
    /// region.set("lokey", Value::Int(36));
    /// let lokey: u8 = region.get("lokey").unwrap();
    /// assert_eq!(lokey, 36);
    /// ```
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T> {
        match self.opcodes.get(name) {
            Some(value) => T::from_value(name, value),
            None => Err(Error::MissingOpcode(name.to_string())),
        }
    }

    /// Typed value of an opcode, `None` if it is absent
    pub fn get_opt<T: FromValue>(&self, name: &str) -> Result<Option<T>> {
        self.opcodes
            .get(name)
            .map(|value| T::from_value(name, value))
            .transpose()
    }

    /// The sample path as written in the patch
    pub fn sample(&self) -> Option<&str> {
        self.opcodes.get("sample").and_then(Value::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.opcodes.iter()
    }

    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    pub(crate) fn missing_required(&self) -> Option<&'static str> {
        REQUIRED_KEYS
            .iter()
            .copied()
            .find(|key| !self.opcodes.contains_key(*key))
    }

    pub(crate) fn check_required(&self) -> Result<()> {
        match self.missing_required() {
            Some(key) => Err(Error::MissingRequiredKey {
                key: key.to_string(),
                region: Box::new(self.clone()),
                line: None,
            }),
            None => Ok(()),
        }
    }
}

impl<'a> IntoIterator for &'a Region {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.opcodes.iter()
    }
}
