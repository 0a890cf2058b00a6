/// Fixed stage lengths (seconds) of an instrument's amplitude envelope.
///
/// Only the sustain stage stretches with the note; attack, decay and release
/// are constants of the instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeShape {
    pub attack: f64,
    pub decay: f64,
    pub release: f64,
    pub sustain_floor: f64,
}

/// The concrete timing of one note, in seconds from note start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeStages {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl EnvelopeShape {
    /// Splits `duration` into stages that add up to exactly `duration`.
    ///
    /// Normally sustain = max(floor, duration - attack - decay - release). When
    /// the note is too short to hold the fixed stages plus the sustain floor,
    /// every stage shrinks by the same factor instead of overrunning the note.
    pub fn partition(&self, duration: f64) -> EnvelopeStages {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        let fixed = self.attack + self.decay + self.release;
        let needed = fixed + self.sustain_floor;

        let scale = if needed > duration && needed > 0.0 {
            duration / needed
        } else {
            1.0
        };

        let attack = self.attack * scale;
        let decay = self.decay * scale;
        let release = self.release * scale;
        let sustain = (duration - attack - decay - release).max(0.0);

        EnvelopeStages {
            attack,
            decay,
            sustain,
            release,
        }
    }
}

impl EnvelopeStages {
    pub fn attack_end(&self) -> f64 {
        self.attack
    }

    pub fn decay_end(&self) -> f64 {
        self.attack + self.decay
    }

    pub fn sustain_end(&self) -> f64 {
        self.attack + self.decay + self.sustain
    }

    pub fn total(&self) -> f64 {
        self.sustain_end() + self.release
    }
}
