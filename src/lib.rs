//! Hand-tracked instrument: two hands, two voices.
//!
//! Horizontal position picks a pitch from a scale, height picks the rhythmic
//! subdivision, depth picks the volume and the selected instrument shapes the
//! timbre of every note.

pub mod audio;
pub mod input;
pub mod music;
pub mod performance;
pub mod synth;
