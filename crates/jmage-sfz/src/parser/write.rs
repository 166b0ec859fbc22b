//! Writing documents back to SFZ/JMZ text.
//!
//! Output is one line per scope: a `<control>` line when the format has a
//! control scope, then one `<region>` line per region. Opcodes are written
//! strictly in the format's write order; opcodes outside that order are not
//! written at all, and write-order opcodes a region lacks are skipped.

use std::io::Write;

use crate::parser::error::Error;
use crate::parser::opcodes::Value;
use crate::parser::types::Document;

type Result<T> = std::result::Result<T, Error>;

impl Document {
    /// Write the document to `out`
    ///
    /// # Errors
    ///
    /// Fails before writing anything if [`Document::validate`] rejects the
    /// document, or with `IO` if the writer fails.
    ///
    /// # Example
    ///
    /// ```
    /// use jmage_sfz::parser::{Document, Format, Value};
    ///
    /// let mut doc = Document::new(Format::sfz());
    /// doc.add_region([("sample", Value::from("kick.wav")), ("lokey", Value::Int(36))]).unwrap();
    ///
    /// let mut out = Vec::new();
    /// doc.write(&mut out).unwrap();
    /// let text = String::from_utf8(out).unwrap();
    /// assert!(text.starts_with("<region> volume=0 pitch_keycenter=32 lokey=36"));
    /// ```
    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        self.validate()?;

        let format = self.format();
        if format.has_control() {
            out.write_all(b"<control>")?;
            write_ordered(out, format.control_order(), |name| self.control().get(name))?;
            out.write_all(b"\n")?;
        }
        for region in self.regions() {
            out.write_all(b"<region>")?;
            write_ordered(out, format.region_order(), |name| region.value(name))?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write the document into a string
    pub fn to_text(&self) -> Result<String> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        String::from_utf8(out)
            .map_err(|e| Error::IO(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }
}

/// Write ` name=value` for each name in `order` that `lookup` finds
fn write_ordered<'a, W, F>(out: &mut W, order: &[&str], lookup: F) -> Result<()>
where
    W: Write,
    F: Fn(&str) -> Option<&'a Value>,
{
    for name in order {
        if let Some(value) = lookup(name) {
            write!(out, " {}={}", name, value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse_jmz_str, parse_sfz_str, Document, Error, Format, Value};

    #[test]
    fn test_write_sfz_has_no_control_line() {
        let mut doc = Document::new(Format::sfz());
        doc.add_region([("sample", "a.wav")]).unwrap();
        let text = doc.to_text().unwrap();
        assert_eq!(text.lines().count(), 1);
        assert_eq!(
            text,
            "<region> volume=0 pitch_keycenter=32 lokey=0 hikey=127 lovel=0 hivel=127 \
             tune=0 offset=0 loop_crossfade=0 group=0 off_group=0 ampeg_attack=0 \
             ampeg_hold=0 ampeg_decay=0 ampeg_sustain=100 ampeg_release=0 sample=a.wav\n"
        );
    }

    #[test]
    fn test_write_jmz_control_first() {
        let doc = parse_jmz_str("<control> jm_chan=2 <region> jm_name=Kick sample=k.wav").unwrap();
        let text = doc.to_text().unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("<control> jm_vol=0 jm_chan=2"));
        let region = lines.next().unwrap();
        assert!(region.starts_with("<region> jm_name=Kick jm_mute=0 jm_solo=0 volume=0"));
        assert!(region.ends_with("sample=k.wav"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_unknown_opcodes_are_not_written() {
        let doc = parse_sfz_str("<region> sample=a.wav cutoff=800 jm_name=x").unwrap();
        let text = doc.to_text().unwrap();
        assert!(!text.contains("cutoff"));
        assert!(!text.contains("jm_name"));
    }

    #[test]
    fn test_loop_keys_written_only_when_set() {
        let doc = parse_sfz_str(
            "<region> sample=a.wav
             <region> sample=b.wav loop_mode=loop_continuous loop_start=10 loop_end=900",
        )
        .unwrap();
        let text = doc.to_text().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(!lines[0].contains("loop_mode"));
        assert!(lines[1].contains(" loop_start=10 loop_end=900 loop_mode=loop_continuous "));
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let source = "
        <group> ampeg_release=0.25 lovel=10
        <region> sample=My Sample.wav tune=-5 volume=-6.5 loop_mode=one_shot
        <region> sample=b.wav lokey=60 hikey=72 pitch_keycenter=66 ampeg_sustain=42.5
        ";
        let first = parse_sfz_str(source).unwrap();
        let second = parse_sfz_str(&first.to_text().unwrap()).unwrap();
        assert_eq!(first.regions(), second.regions());

        let jmz = first.convert(Format::jmz()).unwrap();
        let reparsed = parse_jmz_str(&jmz.to_text().unwrap()).unwrap();
        assert_eq!(jmz.regions(), reparsed.regions());
        assert_eq!(jmz.control(), reparsed.control());
    }

    #[test]
    fn test_write_validates_first() {
        let mut doc = Document::new(Format::sfz());
        doc.add_region([("lokey", Value::Int(3))]).unwrap();
        let mut out = Vec::new();
        assert!(matches!(doc.write(&mut out), Err(Error::MissingRequiredKey { .. })));
        assert!(out.is_empty());
    }
}
