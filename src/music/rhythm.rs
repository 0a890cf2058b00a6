use std::fmt;

pub const MIN_BPM: u32 = 60;
pub const MAX_BPM: u32 = 180;
pub const BEATS_IN_BAR: u8 = 4;

/// Note length denominator: `Subdivision::Eighth` plays 1/8 notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subdivision {
    Sixteenth,
    Twelfth,
    Eighth,
    Sixth,
    Quarter,
    Third,
    Half,
    Whole,
}

impl Subdivision {
    /// Ordered from finest to coarsest; this is also the order of the height bands.
    pub const BANDS: [Subdivision; 8] = [
        Subdivision::Sixteenth,
        Subdivision::Twelfth,
        Subdivision::Eighth,
        Subdivision::Sixth,
        Subdivision::Quarter,
        Subdivision::Third,
        Subdivision::Half,
        Subdivision::Whole,
    ];

    pub fn denominator(self) -> u32 {
        match self {
            Subdivision::Sixteenth => 16,
            Subdivision::Twelfth => 12,
            Subdivision::Eighth => 8,
            Subdivision::Sixth => 6,
            Subdivision::Quarter => 4,
            Subdivision::Third => 3,
            Subdivision::Half => 2,
            Subdivision::Whole => 1,
        }
    }

    /// Snaps any denominator onto the supported set. Ties go to the finer value.
    pub fn from_denominator(n: u32) -> Self {
        Self::BANDS
            .iter()
            .copied()
            .min_by_key(|s| (s.denominator() as i64 - n as i64).abs())
            .unwrap_or_default()
    }

    /// Maps a normalized hand height onto the eight bands, low hands playing fastest.
    pub fn from_height(y: f32) -> Self {
        let band = (y.clamp(0.0, 1.0) * Self::BANDS.len() as f32).floor() as usize;
        Self::BANDS[band.min(Self::BANDS.len() - 1)]
    }
}

impl Default for Subdivision {
    fn default() -> Self {
        Subdivision::Quarter
    }
}

impl fmt::Display for Subdivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{}", self.denominator())
    }
}

/// Fixed-period software timer polled once per frame.
///
/// A trigger fires when at least one note interval has passed since the last
/// one. Late polls fire a single trigger and restart the period from the poll
/// time; missed beats are never replayed.
#[derive(Debug, Clone)]
pub struct RhythmClock {
    bpm: u32,
    subdivision: Subdivision,
    note_interval_ms: f64,
    last_trigger_ms: Option<f64>,
    beat: u8,
}

impl RhythmClock {
    pub fn new(bpm: u32, subdivision: Subdivision) -> Self {
        let mut clock = Self {
            bpm: MIN_BPM,
            subdivision,
            note_interval_ms: 0.0,
            last_trigger_ms: None,
            beat: 0,
        };
        clock.set_bpm(bpm);
        clock
    }

    /// Clamps to 60..=180 so the interval can never divide by zero.
    pub fn set_bpm(&mut self, bpm: u32) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        self.update_note_interval();
    }

    pub fn set_subdivision(&mut self, subdivision: Subdivision) {
        self.subdivision = subdivision;
        self.update_note_interval();
    }

    /// Accepts a raw denominator, as a UI slider would deliver it.
    pub fn set_subdivision_denominator(&mut self, n: u32) {
        self.set_subdivision(Subdivision::from_denominator(n));
    }

    fn update_note_interval(&mut self) {
        self.note_interval_ms =
            (60_000.0 / self.bpm as f64) * (4.0 / self.subdivision.denominator() as f64);
    }

    pub fn should_trigger(&mut self, now_ms: f64) -> bool {
        let due = match self.last_trigger_ms {
            None => true,
            Some(last) => now_ms - last >= self.note_interval_ms,
        };
        if due {
            self.last_trigger_ms = Some(now_ms);
            self.beat = (self.beat + 1) % BEATS_IN_BAR;
        }
        due
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn subdivision(&self) -> Subdivision {
        self.subdivision
    }

    pub fn note_interval_ms(&self) -> f64 {
        self.note_interval_ms
    }

    /// Position of the 4-beat display indicator.
    pub fn beat(&self) -> u8 {
        self.beat
    }
}

impl Default for RhythmClock {
    fn default() -> Self {
        Self::new(120, Subdivision::Quarter)
    }
}
