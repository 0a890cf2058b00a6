use std::fmt;
use std::str::FromStr;

use super::ParseError;

// Two octaves from C3 to C5, equal temperament.
const MAJOR: [f32; 15] = [
    130.81, 146.83, 164.81, 174.61, 196.00, 220.00, 246.94, 261.63, 293.66, 329.63, 349.23,
    392.00, 440.00, 493.88, 523.25,
];
const MINOR: [f32; 15] = [
    130.81, 146.83, 155.56, 174.61, 196.00, 207.65, 233.08, 261.63, 293.66, 311.13, 349.23,
    392.00, 415.30, 466.16, 523.25,
];
const PENTATONIC: [f32; 11] = [
    130.81, 146.83, 164.81, 196.00, 220.00, 261.63, 293.66, 329.63, 392.00, 440.00, 523.25,
];
const BLUES: [f32; 13] = [
    130.81, 155.56, 174.61, 185.00, 196.00, 233.08, 261.63, 311.13, 349.23, 369.99, 392.00,
    466.16, 523.25,
];
const CHROMATIC: [f32; 25] = [
    130.81, 138.59, 146.83, 155.56, 164.81, 174.61, 185.00, 196.00, 207.65, 220.00, 233.08,
    246.94, 261.63, 277.18, 293.66, 311.13, 329.63, 349.23, 369.99, 392.00, 415.30, 440.00,
    466.16, 493.88, 523.25,
];

/// The selectable pitch sets. Each one is a fixed, strictly ascending frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    Major,
    Minor,
    Pentatonic,
    Blues,
    Chromatic,
}

impl Scale {
    pub const ALL: [Scale; 5] = [
        Scale::Major,
        Scale::Minor,
        Scale::Pentatonic,
        Scale::Blues,
        Scale::Chromatic,
    ];

    /// Frequencies in Hz, lowest first.
    pub fn frequencies(self) -> &'static [f32] {
        match self {
            Scale::Major => &MAJOR,
            Scale::Minor => &MINOR,
            Scale::Pentatonic => &PENTATONIC,
            Scale::Blues => &BLUES,
            Scale::Chromatic => &CHROMATIC,
        }
    }

    /// Quantizes a normalized horizontal position onto the scale.
    ///
    /// This is a bucket lookup, not a nearest-frequency search: the position
    /// selects `floor(x * (len - 1))`, clamped into the table, so `x = 1.0`
    /// lands exactly on the top note.
    pub fn closest_note(self, x: f32) -> f32 {
        let notes = self.frequencies();
        let last = notes.len() - 1;
        // NaN falls through to index 0 via the saturating cast.
        let index = (x.clamp(0.0, 1.0) * last as f32).floor() as usize;
        notes[index.min(last)]
    }

    pub fn name(self) -> &'static str {
        match self {
            Scale::Major => "major",
            Scale::Minor => "minor",
            Scale::Pentatonic => "pentatonic",
            Scale::Blues => "blues",
            Scale::Chromatic => "chromatic",
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Major
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scale {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Scale::ALL
            .iter()
            .copied()
            .find(|scale| scale.name() == lowered)
            .ok_or(ParseError::UnknownScale { name: s.to_string() })
    }
}
