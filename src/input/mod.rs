//! Hand tracking input.
//!
//! A sensor driver (or the keyboard/mouse stand-in in [`keyboard`]) delivers
//! one [`HandFrame`] per display frame, already normalized to the unit cube.

pub mod keyboard;

pub use self::keyboard::KeyboardHands;

use crate::music::Scale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    pub const BOTH: [HandSide; 2] = [HandSide::Left, HandSide::Right];

    pub fn index(self) -> usize {
        match self {
            HandSide::Left => 0,
            HandSide::Right => 1,
        }
    }
}

/// Palm position, each axis in [0, 1]: x is left to right, y is low to high,
/// z is far to near.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandPose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl HandPose {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        let unit = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            x: unit(x),
            y: unit(y),
            z: unit(z),
        }
    }
}

/// Both hands as seen in one sensor frame. `None` means not tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HandFrame {
    pub left: Option<HandPose>,
    pub right: Option<HandPose>,
}

impl HandFrame {
    pub fn new(left: Option<HandPose>, right: Option<HandPose>) -> Self {
        Self { left, right }
    }

    pub fn get(&self, side: HandSide) -> Option<HandPose> {
        match side {
            HandSide::Left => self.left,
            HandSide::Right => self.right,
        }
    }

    pub fn present(&self) -> impl Iterator<Item = HandPose> + '_ {
        self.left.iter().chain(self.right.iter()).copied()
    }

    pub fn hand_count(&self) -> usize {
        self.present().count()
    }

    /// Mean height of the tracked hands, if any are tracked.
    pub fn average_height(&self) -> Option<f32> {
        self.average(|pose| pose.y)
    }

    pub fn average_depth(&self) -> Option<f32> {
        self.average(|pose| pose.z)
    }

    fn average(&self, axis: impl Fn(&HandPose) -> f32) -> Option<f32> {
        let count = self.hand_count();
        if count == 0 {
            return None;
        }
        Some(self.present().map(|pose| axis(&pose)).sum::<f32>() / count as f32)
    }
}

/// UI-level requests that arrive alongside hand frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    SelectScale(Scale),
    NudgeBpm(i32),
    NextInstrument,
    PreviousInstrument,
    ToggleAudio,
    Quit,
}

/// Everything an input source produced since the previous poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputPoll {
    pub hands: HandFrame,
    pub controls: Vec<ControlEvent>,
}

/// Anything that can be polled once per frame for hand poses.
pub trait HandSource {
    fn poll(&mut self) -> InputPoll;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poses_are_clamped_into_the_unit_cube() {
        let pose = HandPose::new(-0.5, 1.5, f32::NAN);
        assert_eq!(pose, HandPose { x: 0.0, y: 1.0, z: 0.0 });
    }

    #[test]
    fn averages_cover_only_tracked_hands() {
        let frame = HandFrame::new(Some(HandPose::new(0.1, 0.2, 0.4)), None);
        assert_eq!(frame.average_height(), Some(0.2));

        let frame = HandFrame::new(Some(HandPose::new(0.1, 0.2, 0.4)), Some(HandPose::new(0.9, 0.6, 0.8)));
        assert!((frame.average_height().unwrap() - 0.4).abs() < 1e-6);
        assert!((frame.average_depth().unwrap() - 0.6).abs() < 1e-6);

        assert_eq!(HandFrame::default().average_height(), None);
    }
}
