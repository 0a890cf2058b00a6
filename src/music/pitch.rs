use std::fmt;

use snafu::Snafu;

/// Reference pitch for octave numbering.
pub const C0_HZ: f32 = 16.35;

const PITCH_CLASSES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

#[derive(Debug, Clone, Copy, PartialEq, Snafu)]
pub enum NoteError {
    #[snafu(display("Cannot name frequency {} Hz. Must be positive and finite.", frequency))]
    InvalidFrequency { frequency: f32 },
}

/// A display label such as `C4` or `F#2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteName {
    pitch_class: usize,
    octave: i32,
}

impl NoteName {
    /// Names the equal-tempered semitone nearest to `frequency`.
    pub fn from_frequency(frequency: f32) -> Result<Self, NoteError> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(NoteError::InvalidFrequency { frequency });
        }

        let half_steps = 12.0 * (frequency / C0_HZ).log2();
        let nearest = half_steps.round() as i32;

        // Euclidean division keeps the pitch class in 0..12 below C0 as well.
        Ok(Self {
            pitch_class: nearest.rem_euclid(12) as usize,
            octave: nearest.div_euclid(12),
        })
    }

    pub fn pitch_class(&self) -> &'static str {
        PITCH_CLASSES[self.pitch_class]
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class(), self.octave)
    }
}

pub fn note_name(frequency: f32) -> Result<NoteName, NoteError> {
    NoteName::from_frequency(frequency)
}
