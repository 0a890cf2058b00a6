use log::trace;

use super::{AudioEngine, PlayMode};
use crate::input::{HandFrame, HandSide};
use crate::music::{NoteName, Subdivision};

/// What one hand is doing this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandReading {
    pub x: f32,
    pub frequency: f32,
    pub note: Option<NoteName>,
}

/// Per-frame summary for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub left: Option<HandReading>,
    pub right: Option<HandReading>,
    pub subdivision: Subdivision,
    pub average_height: Option<f32>,
    pub average_depth: Option<f32>,
    pub triggered: bool,
    pub beat: u8,
}

impl FrameReport {
    pub fn hand(&self, side: HandSide) -> Option<HandReading> {
        match side {
            HandSide::Left => self.left,
            HandSide::Right => self.right,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingNote {
    frequency: f32,
    volume: f32,
}

/// Decides, once per frame, what each hand should be playing.
pub struct PerformanceAdapter {
    mode: PlayMode,
    pending: [Option<PendingNote>; 2],
}

impl PerformanceAdapter {
    pub fn new(mode: PlayMode) -> Self {
        Self {
            mode,
            pending: [None; 2],
        }
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    /// Switching away from continuous playback silences the held tones.
    pub fn set_mode(&mut self, engine: &mut AudioEngine, mode: PlayMode) {
        if mode != self.mode && self.mode == PlayMode::Continuous {
            for side in HandSide::BOTH.iter() {
                engine.stop_hand(*side);
            }
        }
        self.pending = [None; 2];
        self.mode = mode;
    }

    pub fn on_frame(&mut self, engine: &mut AudioEngine, frame: &HandFrame, now_ms: f64) -> FrameReport {
        engine.advance(now_ms);

        let mut readings = [None; 2];
        for side in HandSide::BOTH.iter().copied() {
            let i = side.index();
            match frame.get(side) {
                Some(pose) => {
                    let frequency = engine.closest_note_in_scale(pose.x);
                    let volume = pose.z;
                    match self.mode {
                        PlayMode::Continuous => engine.play_hand_note(side, frequency, volume),
                        PlayMode::Rhythm => self.pending[i] = Some(PendingNote { frequency, volume }),
                    }
                    readings[i] = Some(HandReading {
                        x: pose.x,
                        frequency,
                        note: engine.note_name(frequency).ok(),
                    });
                }
                None => {
                    self.pending[i] = None;
                    engine.stop_hand(side);
                }
            }
        }

        let average_height = frame.average_height();
        if let Some(height) = average_height {
            engine.set_subdivision(Subdivision::from_height(height));
        }

        let triggered = engine.should_trigger_note(now_ms);
        if triggered && self.mode == PlayMode::Rhythm {
            for side in HandSide::BOTH.iter().copied() {
                if let Some(note) = self.pending[side.index()] {
                    trace!("beat {}: {:?} hand plays {:.2} Hz", engine.rhythm().beat(), side, note.frequency);
                    engine.play_rhythm_note(side, note.frequency, note.volume, None);
                }
            }
        }

        FrameReport {
            left: readings[0],
            right: readings[1],
            subdivision: engine.rhythm().subdivision(),
            average_height,
            average_depth: frame.average_depth(),
            triggered,
            beat: engine.rhythm().beat(),
        }
    }
}

impl Default for PerformanceAdapter {
    fn default() -> Self {
        Self::new(PlayMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::HandPose;
    use crate::performance::{HandState, PerformanceConfig};
    use crate::synth::VoiceCommand;
    use std::sync::mpsc::{self, Receiver};

    fn setup(mode: PlayMode) -> (PerformanceAdapter, AudioEngine, Receiver<VoiceCommand>) {
        let (tx, rx) = mpsc::channel();
        let mut engine = AudioEngine::new(tx, &PerformanceConfig::default());
        engine.start();
        (PerformanceAdapter::new(mode), engine, rx)
    }

    fn scheduled(rx: &Receiver<VoiceCommand>) -> Vec<(HandSide, f32)> {
        rx.try_iter()
            .filter_map(|command| match command {
                VoiceCommand::Schedule { hand, note } => Some((hand, note.frequency)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn rhythm_mode_plays_only_on_triggers() {
        let (mut adapter, mut engine, rx) = setup(PlayMode::Rhythm);
        // y = 0.55 lands in the quarter-note band; 120 bpm gives 500ms
        let frame = HandFrame::new(None, Some(HandPose::new(1.0, 0.55, 0.8)));

        let report = adapter.on_frame(&mut engine, &frame, 0.0);
        assert!(report.triggered);
        assert_eq!(report.subdivision, Subdivision::Quarter);
        assert_eq!(scheduled(&rx), vec![(HandSide::Right, 523.25)]);

        let report = adapter.on_frame(&mut engine, &frame, 250.0);
        assert!(!report.triggered);
        assert!(scheduled(&rx).is_empty());

        let report = adapter.on_frame(&mut engine, &frame, 500.0);
        assert!(report.triggered);
        assert_eq!(report.beat, 2);
        assert_eq!(scheduled(&rx).len(), 1);
    }

    #[test]
    fn missing_hand_clears_its_stashed_note() {
        let (mut adapter, mut engine, rx) = setup(PlayMode::Rhythm);
        let both = HandFrame::new(Some(HandPose::new(0.0, 0.55, 0.5)), Some(HandPose::new(1.0, 0.55, 0.5)));
        adapter.on_frame(&mut engine, &both, 0.0);
        assert_eq!(scheduled(&rx).len(), 2);

        let right_only = HandFrame::new(None, Some(HandPose::new(1.0, 0.55, 0.5)));
        adapter.on_frame(&mut engine, &right_only, 600.0);
        assert_eq!(scheduled(&rx), vec![(HandSide::Right, 523.25)]);
    }

    #[test]
    fn average_height_picks_the_subdivision() {
        let (mut adapter, mut engine, _rx) = setup(PlayMode::Rhythm);
        let frame = HandFrame::new(Some(HandPose::new(0.5, 0.0, 0.5)), Some(HandPose::new(0.5, 0.2, 0.5)));
        let report = adapter.on_frame(&mut engine, &frame, 0.0);
        assert_eq!(report.subdivision, Subdivision::Sixteenth);
        assert!((report.average_height.unwrap() - 0.1).abs() < 1e-6);

        // no hands: subdivision is left where it was
        let report = adapter.on_frame(&mut engine, &HandFrame::default(), 10.0);
        assert_eq!(report.subdivision, Subdivision::Sixteenth);
        assert_eq!(report.average_height, None);
    }

    #[test]
    fn continuous_mode_follows_and_releases_hands() {
        let (mut adapter, mut engine, _rx) = setup(PlayMode::Continuous);
        let frame = HandFrame::new(Some(HandPose::new(0.0, 0.5, 0.5)), None);
        let report = adapter.on_frame(&mut engine, &frame, 0.0);
        assert_eq!(report.left.map(|r| r.frequency), Some(130.81));
        assert_eq!(report.left.and_then(|r| r.note).map(|n| n.to_string()), Some("C3".to_string()));
        assert!(matches!(engine.hand_state(HandSide::Left), HandState::Sustaining(_)));

        adapter.on_frame(&mut engine, &HandFrame::default(), 16.0);
        assert!(matches!(engine.hand_state(HandSide::Left), HandState::Stopping(_)));
        adapter.on_frame(&mut engine, &HandFrame::default(), 200.0);
        assert_eq!(engine.hand_state(HandSide::Left), HandState::Idle);
    }

    #[test]
    fn leaving_continuous_mode_stops_held_tones() {
        let (mut adapter, mut engine, _rx) = setup(PlayMode::Continuous);
        let frame = HandFrame::new(Some(HandPose::new(0.3, 0.5, 0.5)), None);
        adapter.on_frame(&mut engine, &frame, 0.0);
        adapter.set_mode(&mut engine, PlayMode::Rhythm);
        assert!(matches!(engine.hand_state(HandSide::Left), HandState::Stopping(_)));
        assert_eq!(adapter.mode(), PlayMode::Rhythm);
    }
}
