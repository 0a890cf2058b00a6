use std::fmt;
use std::str::FromStr;

use super::automation::{Automation, EXP_FLOOR};
use super::envelope::{EnvelopeShape, EnvelopeStages};
use super::filter::FilterType;
use super::waveform::Waveform;
use crate::music::ParseError;

/// One oscillator in a patch, tuned relative to the note frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    pub waveform: Waveform,
    pub ratio: f32,
    pub level: f32,
    /// Whether the patch vibrato modulates this partial.
    pub vibrato: bool,
}

impl Partial {
    const fn new(waveform: Waveform, ratio: f32, level: f32) -> Self {
        Self {
            waveform,
            ratio,
            level,
            vibrato: false,
        }
    }

    const fn with_vibrato(self) -> Self {
        Self {
            vibrato: true,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterSweep {
    pub filter_type: FilterType,
    pub q: f32,
    pub cutoff: Automation,
}

/// Pitch modulation in Hz, applied to partials flagged for vibrato.
#[derive(Debug, Clone, PartialEq)]
pub struct Vibrato {
    pub rate_hz: f32,
    pub depth: Automation,
}

/// Everything the renderer needs to play one bounded note.
///
/// All automation times are seconds from the note start; the note ends at
/// `stages.total()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEnvelope {
    pub frequency: f32,
    pub stages: EnvelopeStages,
    pub partials: Vec<Partial>,
    pub gain: Automation,
    pub filter: Option<FilterSweep>,
    pub vibrato: Option<Vibrato>,
}

impl ScheduledEnvelope {
    pub fn duration(&self) -> f64 {
        self.stages.total()
    }
}

const SYNTH_PARTIALS: [Partial; 1] = [Partial::new(Waveform::Sine, 1.0, 1.0)];

const GUITAR_PARTIALS: [Partial; 3] = [
    Partial::new(Waveform::Triangle, 1.0, 1.0),
    // slightly sharp second harmonic
    Partial::new(Waveform::Triangle, 2.01, 0.4),
    Partial::new(Waveform::Sawtooth, 0.5, 0.2),
];

const SAXOPHONE_PARTIALS: [Partial; 3] = [
    Partial::new(Waveform::Sawtooth, 1.0, 1.0).with_vibrato(),
    Partial::new(Waveform::Square, 3.0, 0.15),
    Partial::new(Waveform::Sine, 5.0, 0.08),
];

const PIANO_PARTIALS: [Partial; 3] = [
    Partial::new(Waveform::Sine, 1.0, 1.0),
    Partial::new(Waveform::Sine, 2.0, 0.3),
    Partial::new(Waveform::Sine, 3.0, 0.15),
];

/// Instrument patches: immutable descriptions of partials, filter and envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Synth,
    Guitar,
    Saxophone,
    Piano,
}

impl Instrument {
    pub const ALL: [Instrument; 4] = [
        Instrument::Synth,
        Instrument::Guitar,
        Instrument::Saxophone,
        Instrument::Piano,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Instrument::Synth => "synth",
            Instrument::Guitar => "guitar",
            Instrument::Saxophone => "saxophone",
            Instrument::Piano => "piano",
        }
    }

    pub fn partials(self) -> &'static [Partial] {
        match self {
            Instrument::Synth => &SYNTH_PARTIALS,
            Instrument::Guitar => &GUITAR_PARTIALS,
            Instrument::Saxophone => &SAXOPHONE_PARTIALS,
            Instrument::Piano => &PIANO_PARTIALS,
        }
    }

    pub fn envelope_shape(self) -> EnvelopeShape {
        match self {
            Instrument::Synth => EnvelopeShape {
                attack: 0.02,
                decay: 0.0,
                release: 0.1,
                sustain_floor: 0.05,
            },
            Instrument::Guitar => EnvelopeShape {
                attack: 0.003,
                decay: 0.05,
                release: 0.8,
                sustain_floor: 0.05,
            },
            Instrument::Saxophone => EnvelopeShape {
                attack: 0.12,
                decay: 0.0,
                release: 0.2,
                sustain_floor: 0.15,
            },
            Instrument::Piano => EnvelopeShape {
                attack: 0.005,
                decay: 0.1,
                release: 0.4,
                sustain_floor: 0.05,
            },
        }
    }

    /// Waveform a sustained (continuous-mode) voice uses for this instrument.
    pub fn carrier_waveform(self) -> Waveform {
        self.partials()[0].waveform
    }

    pub fn next(self) -> Self {
        match self {
            Instrument::Synth => Instrument::Guitar,
            Instrument::Guitar => Instrument::Saxophone,
            Instrument::Saxophone => Instrument::Piano,
            Instrument::Piano => Instrument::Synth,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Instrument::Synth => Instrument::Piano,
            Instrument::Guitar => Instrument::Synth,
            Instrument::Saxophone => Instrument::Guitar,
            Instrument::Piano => Instrument::Saxophone,
        }
    }

    /// Renders a note of `duration` seconds into a self-contained schedule.
    pub fn render(self, frequency: f32, volume: f32, duration: f64) -> ScheduledEnvelope {
        let volume = unit_volume(volume);
        let stages = self.envelope_shape().partition(duration);
        let (a, d, s, end) = (
            stages.attack_end(),
            stages.decay_end(),
            stages.sustain_end(),
            stages.total(),
        );

        let mut filter = None;
        let mut vibrato = None;

        let gain = match self {
            Instrument::Synth => {
                let peak = volume * 0.4;
                Automation::new(0.0)
                    .set(0.0, 0.0)
                    .linear_to(a, peak)
                    .set(s, peak)
                    .linear_to(end, 0.0)
            }
            Instrument::Guitar => {
                // Pluck: snap up, fall fast, ring out long. The body filter
                // closes down over the first 200ms for the "twang".
                filter = Some(FilterSweep {
                    filter_type: FilterType::LowPass,
                    q: 1.0,
                    cutoff: Automation::new(5000.0)
                        .set(0.0, 5000.0)
                        .exponential_to(0.05, 2500.0)
                        .exponential_to(0.2, 2000.0),
                });
                Automation::new(0.0)
                    .set(0.0, 0.0)
                    .linear_to(a, volume * 0.7)
                    .exponential_to(d, volume * 0.2)
                    .exponential_to(s, volume * 0.15)
                    .exponential_to(end, EXP_FLOOR)
            }
            Instrument::Saxophone => {
                filter = Some(FilterSweep {
                    filter_type: FilterType::BandPass,
                    q: 3.0,
                    cutoff: Automation::new(800.0 + frequency * 0.8),
                });
                vibrato = Some(Vibrato {
                    rate_hz: 4.5,
                    depth: Automation::new(0.0)
                        .set(0.0, 0.0)
                        .linear_to(a + stages.sustain * 0.3, 8.0),
                });
                // breath: soft onset, then full tone
                let peak = volume * 0.45;
                Automation::new(0.0)
                    .set(0.0, 0.0)
                    .linear_to(stages.attack * 0.3, volume * 0.15)
                    .linear_to(a, peak)
                    .set(s, peak)
                    .linear_to(end, 0.0)
            }
            Instrument::Piano => {
                let held = volume * 0.3;
                Automation::new(0.0)
                    .set(0.0, 0.0)
                    .linear_to(a, volume * 0.6)
                    .exponential_to(d, held)
                    .set(s, held.max(EXP_FLOOR))
                    .exponential_to(end, EXP_FLOOR)
            }
        };

        ScheduledEnvelope {
            frequency,
            stages,
            partials: self.partials().to_vec(),
            gain,
            filter,
            vibrato,
        }
    }
}

/// Clamps a volume into [0, 1]; NaN and infinities count as silence.
pub fn unit_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Instrument::Synth
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Instrument {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        // "sine" is what the oldest UI called the synth patch.
        if lowered == "sine" {
            return Ok(Instrument::Synth);
        }
        Instrument::ALL
            .iter()
            .copied()
            .find(|i| i.name() == lowered)
            .ok_or(ParseError::UnknownInstrument { name: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_patch_fills_the_requested_duration() {
        for instrument in Instrument::ALL.iter() {
            let mut ms = 50;
            while ms <= 2000 {
                let duration = ms as f64 / 1000.0;
                let note = instrument.render(440.0, 0.8, duration);
                let s = note.stages;
                assert!(s.attack >= 0.0 && s.decay >= 0.0 && s.sustain >= 0.0 && s.release >= 0.0);
                assert!(
                    (s.attack + s.decay + s.sustain + s.release - duration).abs() < 1e-9,
                    "{} at {}ms",
                    instrument,
                    ms
                );
                assert!((note.duration() - duration).abs() < 1e-9);
                ms += 25;
            }
        }
    }

    #[test]
    fn non_finite_volume_renders_silence() {
        assert_eq!(unit_volume(f32::NAN), 0.0);
        assert_eq!(unit_volume(f32::INFINITY), 0.0);
        assert_eq!(unit_volume(1.5), 1.0);

        for instrument in Instrument::ALL.iter() {
            let note = instrument.render(330.0, f32::NAN, 0.4);
            for step in 0..=40 {
                let gain = note.gain.value_at(step as f64 * 0.01);
                assert!(gain.is_finite() && gain <= EXP_FLOOR, "{} gain {}", instrument, gain);
            }
        }
    }

    #[test]
    fn gain_starts_and_ends_silent() {
        for instrument in Instrument::ALL.iter() {
            let note = instrument.render(220.0, 1.0, 0.5);
            assert_eq!(note.gain.value_at(0.0), 0.0);
            assert!(note.gain.value_at(note.duration()) <= EXP_FLOOR);
        }
    }

    #[test]
    fn guitar_sweeps_its_filter_down() {
        let note = Instrument::Guitar.render(196.0, 0.5, 0.5);
        let sweep = note.filter.expect("guitar has a body filter");
        assert_eq!(sweep.filter_type, FilterType::LowPass);
        assert_eq!(sweep.cutoff.value_at(0.0), 5000.0);
        assert!((sweep.cutoff.value_at(0.3) - 2000.0).abs() < 1e-2);
        assert_eq!(note.partials.len(), 3);
    }

    #[test]
    fn saxophone_tracks_pitch_and_grows_vibrato() {
        let note = Instrument::Saxophone.render(500.0, 0.5, 1.0);
        let sweep = note.filter.expect("saxophone has a band-pass");
        assert_eq!(sweep.filter_type, FilterType::BandPass);
        assert_eq!(sweep.cutoff.value_at(0.5), 1200.0);

        let vibrato = note.vibrato.expect("saxophone has vibrato");
        assert_eq!(vibrato.rate_hz, 4.5);
        assert_eq!(vibrato.depth.value_at(0.0), 0.0);
        assert_eq!(vibrato.depth.value_at(0.9), 8.0);
        assert!(note.partials[0].vibrato);
    }

    #[test]
    fn saxophone_attack_has_two_stages() {
        let note = Instrument::Saxophone.render(300.0, 1.0, 1.0);
        assert!((note.gain.value_at(0.036) - 0.15).abs() < 1e-4);
        assert!((note.gain.value_at(0.12) - 0.45).abs() < 1e-4);
    }

    #[test]
    fn silent_volume_is_still_well_formed() {
        for instrument in Instrument::ALL.iter() {
            let note = instrument.render(300.0, 0.0, 0.3);
            for i in 0..=30 {
                let v = note.gain.value_at(i as f64 / 100.0);
                assert!(v.is_finite() && v >= 0.0);
            }
        }
    }

    #[test]
    fn carrier_waveforms_follow_the_patch() {
        assert_eq!(Instrument::Synth.carrier_waveform(), Waveform::Sine);
        assert_eq!(Instrument::Guitar.carrier_waveform(), Waveform::Triangle);
        assert_eq!(Instrument::Saxophone.carrier_waveform(), Waveform::Sawtooth);
        assert_eq!(Instrument::Piano.carrier_waveform(), Waveform::Sine);
    }

    #[test]
    fn parses_names() {
        assert_eq!("Piano".parse::<Instrument>(), Ok(Instrument::Piano));
        assert_eq!("sine".parse::<Instrument>(), Ok(Instrument::Synth));
        assert!("theremin".parse::<Instrument>().is_err());
    }
}
