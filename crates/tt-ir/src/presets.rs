//! Named envelope shapes offered by the envelope editor.

use crate::instrument::EnvelopeConfig;

/// A named, categorized envelope shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopePreset {
    pub name: &'static str,
    pub category: &'static str,
    pub envelope: EnvelopeConfig,
}

const fn preset(
    name: &'static str,
    category: &'static str,
    attack: f64,
    decay: f64,
    sustain: f64,
    release: f64,
) -> EnvelopePreset {
    EnvelopePreset {
        name,
        category,
        envelope: EnvelopeConfig::new(attack, decay, sustain, release),
    }
}

/// Built-in presets. The first entry is the flat "Off" shape.
pub static ENVELOPE_PRESETS: [EnvelopePreset; 21] = [
    preset("Off", "Utility", 0.00, 0.00, 1.00, 0.00),
    preset("Pluck Clean", "Pluck", 0.01, 0.12, 0.00, 0.10),
    preset("Bright Lead", "Lead", 0.02, 0.10, 0.60, 0.12),
    preset("Organ Hold", "Organ", 0.00, 0.00, 1.00, 0.08),
    preset("Perc Hit", "Percussion", 0.00, 0.18, 0.00, 0.20),
    preset("Bass Pluck", "Bass", 0.01, 0.15, 0.10, 0.08),
    preset("Piano", "Keys", 0.02, 0.40, 0.20, 0.15),
    preset("Brass", "Brass", 0.12, 0.25, 0.70, 0.20),
    preset("Warm Strings", "Strings", 0.50, 0.20, 0.80, 0.25),
    preset("Soft Pad", "Pad", 0.30, 0.30, 0.80, 0.35),
    preset("Slow Swell", "Pad", 0.65, 0.10, 0.90, 0.20),
    preset("Blip Lead", "Chiptune", 0.00, 0.10, 0.20, 0.05),
    preset("Square Stab", "Chiptune", 0.00, 0.08, 0.00, 0.04),
    preset("Arp Pluck", "Chiptune", 0.00, 0.12, 0.10, 0.06),
    preset("Pulse Bass", "Chiptune", 0.00, 0.18, 0.50, 0.12),
    preset("Duty Sweep", "Chiptune", 0.00, 0.25, 0.30, 0.18),
    preset("Noise Hat", "Chiptune", 0.00, 0.05, 0.00, 0.03),
    preset("Click Kick", "Chiptune", 0.00, 0.20, 0.00, 0.08),
    preset("Glide Pad 8-bit", "Chiptune", 0.05, 0.30, 0.35, 0.25),
    preset("Game Intro Bell", "Chiptune", 0.01, 0.35, 0.15, 0.30),
    preset("Laser Zap", "Chiptune", 0.00, 0.10, 0.00, 0.12),
];

/// Find a preset by name, ignoring ASCII case.
pub fn find_preset(name: &str) -> Option<&'static EnvelopePreset> {
    ENVELOPE_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Step through the preset list, wrapping at both ends.
pub fn cycle_preset(index: usize, step: isize) -> usize {
    let len = ENVELOPE_PRESETS.len() as isize;
    (index as isize + step).rem_euclid(len) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_preset_is_flat() {
        assert_eq!(ENVELOPE_PRESETS[0].envelope, EnvelopeConfig::FLAT);
    }

    #[test]
    fn find_is_case_insensitive() {
        let p = find_preset("soft pad").unwrap();
        assert_eq!(p.category, "Pad");
        assert!(find_preset("Dubstep Wobble").is_none());
    }

    #[test]
    fn cycle_wraps() {
        assert_eq!(cycle_preset(0, -1), ENVELOPE_PRESETS.len() - 1);
        assert_eq!(cycle_preset(ENVELOPE_PRESETS.len() - 1, 1), 0);
        assert_eq!(cycle_preset(3, 1), 4);
    }

    #[test]
    fn fractions_stay_in_unit_range() {
        for p in &ENVELOPE_PRESETS {
            let e = p.envelope;
            for v in [e.attack, e.decay, e.sustain, e.release] {
                assert!((0.0..=1.0).contains(&v), "{}", p.name);
            }
        }
    }
}
