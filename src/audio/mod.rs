//! Audio output.

mod cpal_backend;

pub use self::cpal_backend::CpalBackend;

use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum AudioError {
    #[snafu(display("No audio output device available"))]
    NoOutputDevice,
    #[snafu(display("Could not query the output configuration: {}", source))]
    DefaultConfig { source: cpal::DefaultStreamConfigError },
    #[snafu(display("Sample format {} is not supported, only f32 output is", format))]
    UnsupportedFormat { format: String },
    #[snafu(display("Could not build the output stream: {}", source))]
    BuildStream { source: cpal::BuildStreamError },
    #[snafu(display("Could not start the output stream: {}", source))]
    PlayStream { source: cpal::PlayStreamError },
    #[snafu(display("Could not pause the output stream: {}", source))]
    PauseStream { source: cpal::PauseStreamError },
}

/// Something that pulls rendered buffers out of a `SynthEngine` and plays them.
pub trait AudioBackend {
    fn start(&mut self) -> Result<(), AudioError>;
    fn stop(&mut self) -> Result<(), AudioError>;
    fn is_running(&self) -> bool;
}
