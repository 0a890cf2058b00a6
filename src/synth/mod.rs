pub mod automation;
pub mod config;
pub mod engine;
pub mod envelope;
pub mod filter;
pub mod instrument;
pub mod note;
pub mod voice;
pub mod waveform;

pub use self::config::SynthConfig;
pub use self::engine::SynthEngine;
pub use self::instrument::{Instrument, ScheduledEnvelope};
pub use self::note::{VoiceCommand, VoiceId};
