//! Turning hand frames into performed notes.

pub mod adapter;
pub mod audio_engine;

pub use self::adapter::{FrameReport, HandReading, PerformanceAdapter};
pub use self::audio_engine::{AudioEngine, HandState};

use std::fmt;
use std::str::FromStr;

use crate::music::{ParseError, Scale};
use crate::synth::Instrument;

/// How hands are turned into sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Discrete notes, one per rhythm-clock trigger, each lasting one interval.
    Rhythm,
    /// One held tone per hand, retuned every frame.
    Continuous,
}

impl Default for PlayMode {
    fn default() -> Self {
        PlayMode::Rhythm
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayMode::Rhythm => f.write_str("rhythm"),
            PlayMode::Continuous => f.write_str("continuous"),
        }
    }
}

impl FromStr for PlayMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rhythm" => Ok(PlayMode::Rhythm),
            "continuous" => Ok(PlayMode::Continuous),
            _ => Err(ParseError::UnknownMode { name: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PerformanceConfig {
    pub scale: Scale,
    pub instrument: Instrument,
    pub bpm: u32,
    pub mode: PlayMode,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            scale: Scale::Major,
            instrument: Instrument::Synth,
            bpm: 120,
            mode: PlayMode::Rhythm,
        }
    }
}
