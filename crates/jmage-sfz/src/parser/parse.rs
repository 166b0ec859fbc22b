use std::io::BufRead;

use crate::config::{MissingKeyPolicy, ParseOptions};
use crate::parser::error::{Error, Warning};
use crate::parser::format::{Format, OpcodeMap};
use crate::parser::types::{Document, Region};

/// Result type alias for parser functions
type Result<T> = std::result::Result<T, Error>;

/// The scope assignments currently land in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Before the first section tag
    Initial,
    Control,
    Group,
    Region,
}

/// An opcode whose value is still being accumulated
#[derive(Debug)]
struct Pending {
    opcode: String,
    value: String,
    line: usize,
}

/// Single-pass parser for SFZ and JMZ text
///
/// The input is read line by line. On every line, everything from the first
/// `//` on is discarded, then the rest is split on whitespace into fields:
///
/// 1. **Tags** like `<region>` close the current opcode and, when leaving a
///    region, the region itself; then they switch scope
/// 2. **Assignments** like `lokey=36` close the current opcode and start a
///    new one with the text after the first `=`
/// 3. **Anything else** continues the current opcode's value, joined with a
///    single space, so `sample=My Sample.wav` is one value
///
/// An opcode's value is converted and stored only when it is closed, by the
/// next tag, the next assignment or the end of input. Later assignments to
/// the same opcode in a scope replace earlier ones.
///
/// # Known limitations
///
/// - `//` inside a value, e.g. in a sample path, still starts a comment
/// - a continuation fragment containing `=` starts a new opcode
/// - runs of whitespace inside a continued value collapse to one space
/// - tags must be separated from the next field by whitespace
///
/// # Example
///
/// ```
/// use jmage_sfz::parser::{Format, Parser};
///
/// let text = "<group> ampeg_release=0.2\n<region> sample=My Sample.wav lokey=36\n";
/// let doc = Parser::new(text.as_bytes(), Format::sfz()).parse().unwrap();
/// assert_eq!(doc.regions()[0].sample(), Some("My Sample.wav"));
/// assert_eq!(doc.regions()[0].get::<f64>("ampeg_release").unwrap(), 0.2);
/// ```
pub struct Parser<R> {
    reader: R,
    options: ParseOptions,
    doc: Document,
    scope: Scope,
    group: OpcodeMap,
    region: Region,
    pending: Option<Pending>,
    line: usize,
}

impl<R: BufRead> Parser<R> {
    /// Create a parser reading `reader` as `format`
    pub fn new(reader: R, format: Format) -> Self {
        let group = format.region_defaults().clone();
        Self {
            reader,
            options: ParseOptions::default(),
            doc: Document::new(format),
            scope: Scope::Initial,
            region: Region::from_map(group.clone()),
            group,
            pending: None,
            line: 0,
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Consume the whole input and return the finished document
    ///
    /// # Errors
    ///
    /// The first value error, missing required key or I/O error aborts the
    /// parse; no partial document is returned.
    pub fn parse(mut self) -> Result<Document> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                break;
            }
            self.line += 1;
            let text = strip_comment(&buf);
            for field in text.split_whitespace() {
                self.field(field)?;
            }
        }

        // close whatever was open at end of input
        self.flush()?;
        self.close_region()?;

        log::debug!(
            "parsed {} regions from {} lines",
            self.doc.regions().len(),
            self.line
        );
        Ok(self.doc)
    }

    fn field(&mut self, field: &str) -> Result<()> {
        if field.len() >= 2 && field.starts_with('<') && field.ends_with('>') {
            self.flush()?;
            self.tag(&field[1..field.len() - 1])
        } else if let Some((opcode, value)) = field.split_once('=') {
            self.flush()?;
            if opcode.is_empty() {
                return Err(Error::Syntax {
                    text: field.to_string(),
                    line: Some(self.line),
                });
            }
            self.pending = Some(Pending {
                opcode: opcode.to_string(),
                value: value.to_string(),
                line: self.line,
            });
            Ok(())
        } else {
            match self.pending.as_mut() {
                Some(pending) => {
                    pending.value.push(' ');
                    pending.value.push_str(field);
                }
                None => {
                    let warning = Warning::StrayText {
                        text: field.to_string(),
                        line: self.line,
                    };
                    self.doc.push_warning(warning);
                }
            }
            Ok(())
        }
    }

    fn tag(&mut self, name: &str) -> Result<()> {
        match name {
            "control" => {
                self.close_region()?;
                let defaults = self.doc.format().control_defaults().clone();
                *self.doc.control_mut() = defaults;
                self.scope = Scope::Control;
            }
            "group" => {
                self.close_region()?;
                self.group = self.doc.format().region_defaults().clone();
                self.scope = Scope::Group;
            }
            "region" => {
                self.close_region()?;
                self.region = Region::from_map(self.group.clone());
                self.scope = Scope::Region;
            }
            other => {
                // scope is unchanged; what follows keeps landing in it
                let warning = Warning::UnrecognizedSection {
                    name: other.to_string(),
                    line: self.line,
                };
                self.doc.push_warning(warning);
                return Ok(());
            }
        }
        log::debug!("line {}: entering <{}>", self.line, name);
        Ok(())
    }

    /// Convert the pending opcode and store it in the active scope
    fn flush(&mut self) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        if self.scope == Scope::Initial {
            let warning = Warning::OutsideSection {
                opcode: pending.opcode,
                line: pending.line,
            };
            self.doc.push_warning(warning);
            return Ok(());
        }
        let value = self
            .doc
            .format()
            .convert(&pending.opcode, &pending.value)
            .map_err(|e| e.at_line(pending.line))?;

        match self.scope {
            Scope::Initial => {}
            Scope::Control => {
                self.doc.control_mut().insert(pending.opcode, value);
            }
            Scope::Group => {
                self.group.insert(pending.opcode, value);
            }
            Scope::Region => self.region.set(pending.opcode, value),
        }
        Ok(())
    }

    /// Validate and append the working region if a region scope is open
    fn close_region(&mut self) -> Result<()> {
        if self.scope != Scope::Region {
            return Ok(());
        }
        let region = std::mem::take(&mut self.region);

        match region.missing_required() {
            None => {
                log::debug!(
                    "line {}: region {} closed",
                    self.line,
                    self.doc.regions().len()
                );
                self.doc.push_region(region);
            }
            Some(key) => match self.options.missing_required {
                MissingKeyPolicy::Abort => {
                    return Err(Error::MissingRequiredKey {
                        key: key.to_string(),
                        region: Box::new(region),
                        line: Some(self.line),
                    });
                }
                MissingKeyPolicy::Skip => {
                    let warning = Warning::RegionSkipped {
                        key: key.to_string(),
                        line: self.line,
                    };
                    self.doc.push_warning(warning);
                }
            },
        }
        Ok(())
    }
}

/// Drop everything from the first `//` to the end of the line
fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::opcodes::{LoopMode, Value};

    fn parse_with(content: &str, format: Format) -> Result<Document> {
        Parser::new(content.as_bytes(), format).parse()
    }

    fn parse_sfz(content: &str) -> Result<Document> {
        parse_with(content, Format::sfz())
    }

    #[test]
    fn test_parse_simple_sfz() {
        let content = r#"
        // a two zone kit
        <region>
        sample=kick.wav
        lokey=36 hikey=36

        <region> sample=snare.wav lokey=38 hikey=38 loop_mode=one_shot
        "#;

        let sfz = parse_sfz(content).expect("Failed to parse SFZ");
        assert_eq!(sfz.regions().len(), 2);

        let kick = &sfz.regions()[0];
        assert_eq!(kick.sample(), Some("kick.wav"));
        assert_eq!(kick.get::<u8>("lokey").unwrap(), 36);
        assert_eq!(kick.get::<u8>("lovel").unwrap(), 0);
        assert!(!kick.contains_key("loop_mode"));

        let snare = &sfz.regions()[1];
        assert_eq!(snare.sample(), Some("snare.wav"));
        assert_eq!(snare.get::<LoopMode>("loop_mode").unwrap(), LoopMode::OneShot);
        assert!(sfz.warnings().is_empty());
    }

    #[test]
    fn test_regions_keep_source_order() {
        let content: String = (0..10)
            .map(|i| format!("<region> sample=s{}.wav lokey={}\n", i, i))
            .collect();
        let doc = parse_sfz(&content).unwrap();
        assert_eq!(doc.regions().len(), 10);
        for (i, region) in doc.regions().iter().enumerate() {
            assert_eq!(region.get::<i64>("lokey").unwrap(), i as i64);
        }
    }

    #[test]
    fn test_group_values_are_inherited_until_next_group() {
        let content = "
        <group> ampeg_release=0.2
        <region> sample=a.wav
        <region> sample=b.wav
        <group>
        <region> sample=c.wav
        ";
        let doc = parse_sfz(content).unwrap();
        let release: Vec<f64> = doc
            .regions()
            .iter()
            .map(|r| r.get("ampeg_release").unwrap())
            .collect();
        assert_eq!(release, vec![0.2, 0.2, 0.0]);
    }

    #[test]
    fn test_region_overrides_group() {
        let doc = parse_sfz("<group> tune=10 lokey=5 <region> sample=a.wav tune=-3").unwrap();
        let region = &doc.regions()[0];
        assert_eq!(region.get::<i64>("tune").unwrap(), -3);
        assert_eq!(region.get::<i64>("lokey").unwrap(), 5);
    }

    #[test]
    fn test_group_sample_satisfies_required_key() {
        let doc = parse_sfz("<group> sample=shared.wav <region> lokey=1 <region> lokey=2").unwrap();
        assert_eq!(doc.regions().len(), 2);
        assert!(doc.regions().iter().all(|r| r.sample() == Some("shared.wav")));
    }

    #[test]
    fn test_value_with_spaces() {
        let doc = parse_sfz("<region> sample=My Sample.wav lokey=3").unwrap();
        let region = &doc.regions()[0];
        assert_eq!(region.sample(), Some("My Sample.wav"));
        assert_eq!(region.get::<i64>("lokey").unwrap(), 3);
        assert!(!region.contains_key("Sample.wav"));
    }

    #[test]
    fn test_value_continues_across_lines() {
        let doc = parse_sfz("<region> sample=Grand\nPiano   C4.wav\n").unwrap();
        assert_eq!(doc.regions()[0].sample(), Some("Grand Piano C4.wav"));
    }

    #[test]
    fn test_last_write_wins() {
        let doc = parse_sfz("<region> tune=10 sample=a.wav tune=-5").unwrap();
        assert_eq!(doc.regions()[0].get::<i64>("tune").unwrap(), -5);
    }

    #[test]
    fn test_comment_stripping() {
        let doc = parse_sfz("<region> sample=a.wav lokey=10 // comment lokey=99\n").unwrap();
        assert_eq!(doc.regions()[0].get::<i64>("lokey").unwrap(), 10);
    }

    #[test]
    fn test_comment_marker_inside_value_is_stripped() {
        // known limitation: the path is cut at the marker
        let doc = parse_sfz("<region> sample=http://host/a.wav").unwrap();
        assert_eq!(doc.regions()[0].sample(), Some("http:"));
    }

    #[test]
    fn test_range_errors_carry_line() {
        match parse_sfz("<region>\nsample=a.wav\nlokey=128\n") {
            Err(Error::Range { opcode, value, line, .. }) => {
                assert_eq!(opcode, "lokey");
                assert_eq!(value, 128);
                assert_eq!(line, Some(3));
            }
            other => panic!("expected range error, got {:?}", other),
        }
        assert!(parse_sfz("<region> sample=a.wav lokey=0").is_ok());
        assert!(parse_sfz("<region> sample=a.wav lokey=127").is_ok());
    }

    #[test]
    fn test_enum_validation() {
        assert!(matches!(
            parse_sfz("<region> sample=a.wav loop_mode=bogus"),
            Err(Error::InvalidEnum { .. })
        ));
        for mode in ["no_loop", "loop_continuous", "one_shot"] {
            let doc = parse_sfz(&format!("<region> sample=a.wav loop_mode={}", mode)).unwrap();
            assert_eq!(doc.regions()[0].value("loop_mode"), Some(&Value::Enum(mode)));
        }
    }

    #[test]
    fn test_malformed_value_aborts() {
        assert!(matches!(
            parse_sfz("<region> sample=a.wav offset=lots"),
            Err(Error::MalformedValue { line: Some(1), .. })
        ));
        // a continued numeric value is malformed too
        assert!(matches!(
            parse_sfz("<region> sample=a.wav ampeg_attack=0.1 0.2"),
            Err(Error::MalformedValue { .. })
        ));
    }

    #[test]
    fn test_missing_sample_before_next_tag() {
        match parse_sfz("<region> lokey=1\n<region> sample=b.wav\n") {
            Err(Error::MissingRequiredKey { key, region, line }) => {
                assert_eq!(key, "sample");
                assert_eq!(region.get::<i64>("lokey").unwrap(), 1);
                assert_eq!(line, Some(2));
            }
            other => panic!("expected missing key, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_sample_at_end_of_input() {
        assert!(matches!(
            parse_sfz("<region> sample=a.wav\n<region> lokey=1\n"),
            Err(Error::MissingRequiredKey { .. })
        ));
        // an empty trailing region is still a region
        assert!(matches!(
            parse_sfz("<region> sample=a.wav <region>"),
            Err(Error::MissingRequiredKey { .. })
        ));
    }

    #[test]
    fn test_skip_policy_drops_incomplete_regions() {
        let options = ParseOptions {
            missing_required: MissingKeyPolicy::Skip,
            ..ParseOptions::default()
        };
        let doc = Parser::new("<region> lokey=1 <region> sample=b.wav".as_bytes(), Format::sfz())
            .with_options(options)
            .parse()
            .unwrap();
        assert_eq!(doc.regions().len(), 1);
        assert_eq!(doc.regions()[0].sample(), Some("b.wav"));
        assert!(matches!(doc.warnings()[0], Warning::RegionSkipped { .. }));
    }

    #[test]
    fn test_unrecognized_section_is_a_warning() {
        let doc = parse_sfz("<region> sample=a.wav <curve> lokey=4").unwrap();
        assert_eq!(
            doc.warnings(),
            &[Warning::UnrecognizedSection { name: "curve".into(), line: 1 }]
        );
        // the assignment still lands in the open region
        assert_eq!(doc.regions().len(), 1);
        assert_eq!(doc.regions()[0].get::<i64>("lokey").unwrap(), 4);
    }

    #[test]
    fn test_text_outside_sections() {
        let doc = parse_sfz("lokey=300 junk\n<region> sample=a.wav").unwrap();
        assert_eq!(doc.regions()[0].get::<i64>("lokey").unwrap(), 0);
        assert!(matches!(doc.warnings()[0], Warning::OutsideSection { .. }));

        let doc = parse_sfz("<region> stray sample=a.wav").unwrap();
        assert!(matches!(doc.warnings()[0], Warning::StrayText { .. }));
    }

    #[test]
    fn test_empty_opcode_name() {
        assert!(matches!(
            parse_sfz("<region> =a.wav"),
            Err(Error::Syntax { line: Some(1), .. })
        ));
    }

    #[test]
    fn test_unknown_opcodes_pass_through() {
        let doc = parse_sfz("<region> sample=a.wav cutoff=800 fil_type=lpf_2p").unwrap();
        let region = &doc.regions()[0];
        assert_eq!(region.value("cutoff"), Some(&Value::Text("800".into())));
        assert_eq!(region.value("fil_type"), Some(&Value::Text("lpf_2p".into())));
    }

    #[test]
    fn test_jmz_control_and_extension_keys() {
        let content = "
        <control> jm_vol=3 jm_chan=10
        <region> jm_name=Low Kick jm_mute=1 sample=kick.wav
        ";
        let doc = parse_with(content, Format::jmz()).unwrap();
        assert_eq!(doc.control().get("jm_vol"), Some(&Value::Int(3)));
        assert_eq!(doc.control().get("jm_chan"), Some(&Value::Int(10)));
        let region = &doc.regions()[0];
        assert_eq!(region.get::<String>("jm_name").unwrap(), "Low Kick");
        assert_eq!(region.get::<i64>("jm_mute").unwrap(), 1);
        assert_eq!(region.get::<i64>("jm_solo").unwrap(), 0);

        assert!(matches!(
            parse_with("<control> jm_chan=0", Format::jmz()),
            Err(Error::Range { .. })
        ));
    }

    #[test]
    fn test_control_defaults_without_control_section() {
        let doc = parse_with("<region> sample=a.wav", Format::jmz()).unwrap();
        assert_eq!(doc.control().get("jm_chan"), Some(&Value::Int(1)));
        assert_eq!(doc.control().get("jm_vol"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_empty_input() {
        let doc = parse_sfz("// nothing here\n\n").unwrap();
        assert!(doc.regions().is_empty());
        assert!(doc.warnings().is_empty());
    }
}
