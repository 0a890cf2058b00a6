//! Musical mapping: scales, note naming and the rhythm clock.

pub mod pitch;
pub mod rhythm;
pub mod scale;

pub use self::pitch::{note_name, NoteError, NoteName};
pub use self::rhythm::{RhythmClock, Subdivision};
pub use self::scale::Scale;

use snafu::Snafu;

/// Returned when a user-facing name (scale, instrument, play mode) is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum ParseError {
    #[snafu(display("unknown scale {:?} (expected major, minor, pentatonic, blues or chromatic)", name))]
    UnknownScale { name: String },
    #[snafu(display("unknown instrument {:?} (expected synth, guitar, saxophone or piano)", name))]
    UnknownInstrument { name: String },
    #[snafu(display("unknown play mode {:?} (expected rhythm or continuous)", name))]
    UnknownMode { name: String },
}
