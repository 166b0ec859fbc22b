//! Zone matching for note triggering.

use crate::types::Zone;

/// Find all zones a note-on should start.
///
/// Every zone whose key and velocity ranges contain the note matches, in
/// zone order. Overlapping zones all sound.
pub fn find_matching_zones(zones: &[Zone], pitch: u8, velocity: u8) -> Vec<&Zone> {
    zones
        .iter()
        .filter(|zone| zone.contains(pitch, velocity))
        .collect()
}

/// Whether starting `trigger` releases a voice playing `playing`.
///
/// A zone with a positive `group` silences voices whose `off_group` names
/// that group. Group 0 never silences anything.
pub fn silences(trigger: &Zone, playing: &Zone) -> bool {
    trigger.group > 0 && playing.off_group == trigger.group
}

/// Calculate the playback rate for a zone at `pitch`.
///
/// 1.0 plays the sample at its original speed. The zone's `origin` key plays
/// unshifted and `pitch_corr` adds fine tuning in semitones.
pub fn playback_rate(zone: &Zone, pitch: u8) -> f64 {
    let semitones = f64::from(pitch) + zone.pitch_corr - f64::from(zone.origin);
    2.0_f64.powf(semitones / 12.0)
}

/// Convert MIDI note number to frequency in Hz.
///
/// Uses the standard A4 = 440 Hz tuning.
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Convert velocity (0-127) to amplitude (0.0-1.0).
pub fn velocity_to_amp(velocity: u8) -> f32 {
    velocity as f32 / 127.0
}
