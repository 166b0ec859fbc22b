//! Zone records handed to the sampler engine.

use crate::parser::{Document, Error, LoopMode, Region, Value};
use std::path::PathBuf;

/// Sample rate the engine runs at unless told otherwise.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// A region's resolved fields in the engine's units.
///
/// Times are converted from seconds to frames, `volume` from decibels to a
/// linear gain, `tune` from cents to semitones and `ampeg_sustain` from a
/// percentage to a fraction.
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    /// Display name (`jm_name`), empty when the region has none.
    pub name: String,
    /// Resolved path of the sample file.
    pub path: PathBuf,
    /// Linear gain.
    pub amp: f32,
    /// MIDI key range (lokey, hikey).
    pub key_range: (u8, u8),
    /// Velocity range (lovel, hivel).
    pub vel_range: (u8, u8),
    /// Key the sample plays at its original pitch.
    pub origin: u8,
    /// Fine tuning in semitones.
    pub pitch_corr: f64,
    /// First frame played.
    pub start: i64,
    /// Loop mode, `None` to take it from the sample file.
    pub loop_mode: Option<LoopMode>,
    /// Loop start frame, `None` to take it from the sample file.
    pub loop_start: Option<i64>,
    /// Loop end frame, `None` to take it from the sample file.
    pub loop_end: Option<i64>,
    /// Loop crossfade in frames.
    pub crossfade: u32,
    /// Polyphony group.
    pub group: i64,
    /// Group silenced when this zone starts.
    pub off_group: i64,
    pub attack: u32,
    pub hold: u32,
    pub decay: u32,
    /// Sustain level, 1.0 is full scale.
    pub sustain: f32,
    pub release: u32,
    pub mute: bool,
    pub solo: bool,
}

impl Zone {
    /// Build a zone from a region's resolved values.
    ///
    /// `path` is the already resolved sample path; see
    /// [`Document::resolve_sample_path`]. Plain SFZ keeps `jm_mute` and
    /// `jm_solo` as unconverted text; such flags read as off.
    pub fn from_region(region: &Region, path: PathBuf, sample_rate: u32) -> Result<Self, Error> {
        let frames = |name: &str| -> Result<u32, Error> {
            Ok(seconds_to_frames(region.get::<f64>(name)?, sample_rate))
        };

        Ok(Self {
            name: region.get_opt::<String>("jm_name")?.unwrap_or_default(),
            path,
            amp: db_to_amp(region.get::<f64>("volume")? as f32),
            key_range: (region.get("lokey")?, region.get("hikey")?),
            vel_range: (region.get("lovel")?, region.get("hivel")?),
            origin: region.get("pitch_keycenter")?,
            pitch_corr: region.get::<i64>("tune")? as f64 / 100.0,
            start: region.get("offset")?,
            loop_mode: region.get_opt("loop_mode")?,
            loop_start: region.get_opt("loop_start")?,
            loop_end: region.get_opt("loop_end")?,
            crossfade: frames("loop_crossfade")?,
            group: region.get("group")?,
            off_group: region.get("off_group")?,
            attack: frames("ampeg_attack")?,
            hold: frames("ampeg_hold")?,
            decay: frames("ampeg_decay")?,
            sustain: (region.get::<f64>("ampeg_sustain")? / 100.0) as f32,
            release: frames("ampeg_release")?,
            mute: flag(region, "jm_mute"),
            solo: flag(region, "jm_solo"),
        })
    }

    /// Convert the zone back into region opcodes for saving.
    ///
    /// The `jm_*` opcodes are always included; writing a plain SFZ document
    /// leaves them out because they are not in its write order.
    pub fn to_region(&self, sample_rate: u32) -> Vec<(&'static str, Value)> {
        let seconds = |frames: u32| Value::Float(frames_to_seconds(frames, sample_rate));
        let mut fields = vec![
            ("jm_name", Value::Text(self.name.clone())),
            ("jm_mute", Value::Int(i64::from(self.mute))),
            ("jm_solo", Value::Int(i64::from(self.solo))),
            ("sample", Value::Text(self.path.to_string_lossy().into_owned())),
            ("volume", Value::Float(amp_to_db(self.amp) as f64)),
            ("lokey", Value::Int(i64::from(self.key_range.0))),
            ("hikey", Value::Int(i64::from(self.key_range.1))),
            ("lovel", Value::Int(i64::from(self.vel_range.0))),
            ("hivel", Value::Int(i64::from(self.vel_range.1))),
            ("pitch_keycenter", Value::Int(i64::from(self.origin))),
            ("tune", Value::Int((self.pitch_corr * 100.0).round() as i64)),
            ("offset", Value::Int(self.start)),
            ("loop_crossfade", seconds(self.crossfade)),
            ("group", Value::Int(self.group)),
            ("off_group", Value::Int(self.off_group)),
            ("ampeg_attack", seconds(self.attack)),
            ("ampeg_hold", seconds(self.hold)),
            ("ampeg_decay", seconds(self.decay)),
            ("ampeg_sustain", Value::Float(f64::from(self.sustain) * 100.0)),
            ("ampeg_release", seconds(self.release)),
        ];
        if let Some(mode) = self.loop_mode {
            fields.push(("loop_mode", Value::from(mode)));
        }
        if let Some(start) = self.loop_start {
            fields.push(("loop_start", Value::Int(start)));
        }
        if let Some(end) = self.loop_end {
            fields.push(("loop_end", Value::Int(end)));
        }
        fields
    }

    /// Whether a note falls inside this zone's key and velocity ranges.
    pub fn contains(&self, pitch: u8, velocity: u8) -> bool {
        pitch >= self.key_range.0
            && pitch <= self.key_range.1
            && velocity >= self.vel_range.0
            && velocity <= self.vel_range.1
    }
}

impl Document {
    /// Build engine zones for every region, resolving sample paths.
    ///
    /// Regions without a `jm_name` are numbered `Zone 1`, `Zone 2`, ... in
    /// document order.
    pub fn zones(&self, sample_rate: u32) -> Result<Vec<Zone>, Error> {
        let mut unnamed = 0;
        self.regions()
            .iter()
            .map(|region| {
                let path = self
                    .resolve_sample_path(region)
                    .ok_or_else(|| Error::MissingOpcode("sample".to_string()))?;
                let mut zone = Zone::from_region(region, path, sample_rate)?;
                if zone.name.is_empty() {
                    unnamed += 1;
                    zone.name = format!("Zone {}", unnamed);
                }
                Ok(zone)
            })
            .collect()
    }
}

// jm_* flags only count once the JMZ table has converted them
fn flag(region: &Region, name: &str) -> bool {
    matches!(region.value(name), Some(Value::Int(v)) if *v != 0)
}

/// Convert decibels to linear gain.
pub fn db_to_amp(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Lowest level `amp_to_db` reports, for silent or negative gains.
pub const SILENCE_DB: f32 = -144.0;

/// Convert linear gain to decibels, never below [`SILENCE_DB`].
pub fn amp_to_db(amp: f32) -> f32 {
    (20.0 * amp.log10()).max(SILENCE_DB)
}

fn seconds_to_frames(seconds: f64, sample_rate: u32) -> u32 {
    (seconds.max(0.0) * f64::from(sample_rate)) as u32
}

fn frames_to_seconds(frames: u32, sample_rate: u32) -> f64 {
    f64::from(frames) / f64::from(sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_jmz_str, parse_sfz_str, Format};

    #[test]
    fn test_zone_from_defaults() {
        let doc = parse_sfz_str("<region> sample=a.wav").unwrap();
        let zones = doc.zones(DEFAULT_SAMPLE_RATE).unwrap();
        let zone = &zones[0];
        assert_eq!(zone.path, PathBuf::from("a.wav"));
        assert_eq!(zone.name, "Zone 1");
        assert!((zone.amp - 1.0).abs() < 1e-6);
        assert_eq!(zone.key_range, (0, 127));
        assert_eq!(zone.origin, 32);
        assert_eq!(zone.loop_mode, None);
        assert_eq!(zone.loop_start, None);
        assert!((zone.sustain - 1.0).abs() < 1e-6);
        assert!(!zone.mute);
    }

    #[test]
    fn test_zone_unit_conversion() {
        let doc = parse_jmz_str(
            "<region> sample=a.wav jm_name=Pad jm_solo=1 volume=-6 tune=-50 \
             ampeg_attack=0.5 ampeg_release=1 ampeg_sustain=50 \
             loop_mode=loop_continuous loop_end=1000",
        )
        .unwrap();
        let zone = &doc.zones(48000).unwrap()[0];
        assert_eq!(zone.name, "Pad");
        assert!(zone.solo);
        assert!((zone.amp - 0.501).abs() < 0.01);
        assert!((zone.pitch_corr + 0.5).abs() < 1e-9);
        assert_eq!(zone.attack, 24000);
        assert_eq!(zone.release, 48000);
        assert!((zone.sustain - 0.5).abs() < 1e-6);
        assert_eq!(zone.loop_mode, Some(LoopMode::LoopContinuous));
        assert_eq!(zone.loop_end, Some(1000));
    }

    #[test]
    fn test_zone_back_to_region() {
        let doc =
            parse_jmz_str("<region> sample=a.wav jm_name=Bass lokey=30 tune=25 ampeg_decay=0.5")
                .unwrap();
        let zone = &doc.zones(DEFAULT_SAMPLE_RATE).unwrap()[0];

        let mut saved = crate::parser::Document::new(Format::jmz());
        saved.add_region(zone.to_region(DEFAULT_SAMPLE_RATE)).unwrap();
        let region = &saved.regions()[0];
        assert_eq!(region.get::<String>("jm_name").unwrap(), "Bass");
        assert_eq!(region.get::<i64>("lokey").unwrap(), 30);
        assert_eq!(region.get::<i64>("tune").unwrap(), 25);
        assert_eq!(region.get::<f64>("ampeg_decay").unwrap(), 0.5);
        assert!(!region.contains_key("loop_mode"));
    }

    #[test]
    fn test_unnamed_zones_are_numbered() {
        let doc = parse_jmz_str(
            "<region> sample=a.wav <region> sample=b.wav jm_name=Snare <region> sample=c.wav",
        )
        .unwrap();
        let names: Vec<String> = doc
            .zones(DEFAULT_SAMPLE_RATE)
            .unwrap()
            .into_iter()
            .map(|zone| zone.name)
            .collect();
        assert_eq!(names, ["Zone 1", "Snare", "Zone 2"]);
    }

    #[test]
    fn test_silent_zone_saves_finite_volume() {
        let doc = parse_sfz_str("<region> sample=a.wav volume=-1000").unwrap();
        let zone = &doc.zones(DEFAULT_SAMPLE_RATE).unwrap()[0];
        assert_eq!(zone.amp, 0.0);

        let mut saved = crate::parser::Document::new(Format::sfz());
        saved.add_region(zone.to_region(DEFAULT_SAMPLE_RATE)).unwrap();
        let text = saved.to_text().unwrap();
        assert!(text.contains(" volume=-144 "));

        let reparsed = parse_sfz_str(&text).unwrap();
        assert_eq!(reparsed.regions()[0].get::<f64>("volume").unwrap(), -144.0);
    }

    #[test]
    fn test_sfz_extension_text_is_ignored() {
        let doc = parse_sfz_str("<region> sample=a.wav jm_mute=1 jm_solo=yes").unwrap();
        let zone = &doc.zones(DEFAULT_SAMPLE_RATE).unwrap()[0];
        assert!(!zone.mute);
        assert!(!zone.solo);

        let doc = parse_jmz_str("<region> sample=a.wav jm_mute=1").unwrap();
        assert!(doc.zones(DEFAULT_SAMPLE_RATE).unwrap()[0].mute);
    }

    #[test]
    fn test_zone_contains() {
        let doc =
            parse_sfz_str("<region> sample=a.wav lokey=36 hikey=48 lovel=10 hivel=100").unwrap();
        let zone = &doc.zones(DEFAULT_SAMPLE_RATE).unwrap()[0];
        assert!(zone.contains(36, 10));
        assert!(zone.contains(48, 100));
        assert!(!zone.contains(35, 64));
        assert!(!zone.contains(40, 101));
    }

    #[test]
    fn test_db_to_amp() {
        assert!((db_to_amp(0.0) - 1.0).abs() < 0.01);
        assert!((db_to_amp(-6.0) - 0.5).abs() < 0.01);
        assert!((amp_to_db(1.0)).abs() < 0.01);
        assert_eq!(amp_to_db(0.0), SILENCE_DB);
        assert_eq!(amp_to_db(-1.0), SILENCE_DB);
    }
}
