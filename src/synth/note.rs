use std::fmt;

use super::instrument::ScheduledEnvelope;
use super::waveform::Waveform;
use crate::input::HandSide;

/// Identifies a sustained voice across the control/render boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice#{}", self.0)
    }
}

/// Instructions sent from the control side to the render timeline.
///
/// Commands take effect at the start of the next rendered buffer; ramp
/// lengths are in seconds.
#[derive(Debug, Clone)]
pub enum VoiceCommand {
    /// Allocate a sustained voice that fades in from silence.
    Start {
        id: VoiceId,
        hand: HandSide,
        waveform: Waveform,
        frequency: f32,
        gain: f32,
        ramp: f64,
    },
    /// Retune and regain an existing sustained voice.
    Glide {
        id: VoiceId,
        frequency: f32,
        gain: f32,
        ramp: f64,
    },
    SetWaveform { id: VoiceId, waveform: Waveform },
    FadeOut { id: VoiceId, ramp: f64 },
    /// Drop the voice once its fade has been rendered. Unknown ids are ignored.
    Release { id: VoiceId },
    /// Fire-and-forget bounded note.
    Schedule {
        hand: HandSide,
        note: Box<ScheduledEnvelope>,
    },
}
