use super::{ControlEvent, HandFrame, HandPose, HandSource, InputPoll};
use crate::music::Scale;
use device_query::{DeviceQuery, DeviceState, Keycode};
use log::debug;
use std::collections::HashSet;

const STEP: f32 = 0.05;

/// Keyboard and mouse stand-in for the motion sensor.
///
/// * Right hand: follows the mouse pointer while the left button is held.
/// * Left hand: the home row (`A` .. `;`) places it left to right while a key
///   is held; Up/Down move it higher or lower.
/// * PageUp/PageDown bring both hands nearer or further (louder or softer).
///
/// Control keys: `1`-`5` pick the scale, Left/Right change the tempo by
/// 5 BPM, `,`/`.` cycle instruments, Space toggles audio, Escape quits.
pub struct KeyboardHands {
    device_state: DeviceState,
    screen_width: f32,
    screen_height: f32,
    left_height: f32,
    depth: f32,
    held: HashSet<Keycode>,
    home_row: Vec<Keycode>,
}

impl KeyboardHands {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            device_state: DeviceState::new(),
            screen_width: screen_width.max(1) as f32,
            screen_height: screen_height.max(1) as f32,
            left_height: 0.5,
            depth: 0.7,
            held: HashSet::new(),
            home_row: vec![
                Keycode::A,
                Keycode::S,
                Keycode::D,
                Keycode::F,
                Keycode::G,
                Keycode::H,
                Keycode::J,
                Keycode::K,
                Keycode::L,
                Keycode::Semicolon,
            ],
        }
    }

    fn control_for(key: &Keycode) -> Option<ControlEvent> {
        let event = match key {
            Keycode::Key1 => ControlEvent::SelectScale(Scale::Major),
            Keycode::Key2 => ControlEvent::SelectScale(Scale::Minor),
            Keycode::Key3 => ControlEvent::SelectScale(Scale::Pentatonic),
            Keycode::Key4 => ControlEvent::SelectScale(Scale::Blues),
            Keycode::Key5 => ControlEvent::SelectScale(Scale::Chromatic),
            Keycode::Left => ControlEvent::NudgeBpm(-5),
            Keycode::Right => ControlEvent::NudgeBpm(5),
            Keycode::Comma => ControlEvent::PreviousInstrument,
            Keycode::Dot => ControlEvent::NextInstrument,
            Keycode::Space => ControlEvent::ToggleAudio,
            Keycode::Escape => ControlEvent::Quit,
            _ => return None,
        };
        Some(event)
    }

    fn left_hand(&self, keys: &[Keycode]) -> Option<HandPose> {
        // With several keys down, the rightmost one wins.
        let last = (self.home_row.len() - 1) as f32;
        self.home_row
            .iter()
            .rposition(|key| keys.contains(key))
            .map(|index| HandPose::new(index as f32 / last, self.left_height, self.depth))
    }

    fn right_hand(&self) -> Option<HandPose> {
        let mouse = self.device_state.get_mouse();
        // index 1 is the primary button
        let pressed = mouse.button_pressed.get(1).copied().unwrap_or(false);
        if !pressed {
            return None;
        }
        let (mx, my) = mouse.coords;
        Some(HandPose::new(
            mx as f32 / self.screen_width,
            1.0 - my as f32 / self.screen_height,
            self.depth,
        ))
    }
}

impl HandSource for KeyboardHands {
    fn poll(&mut self) -> InputPoll {
        let keys: Vec<Keycode> = self.device_state.get_keys();
        let mut controls = Vec::new();

        for key in keys.iter().filter(|key| !self.held.contains(*key)) {
            match key {
                Keycode::Up => self.left_height = (self.left_height + STEP).min(1.0),
                Keycode::Down => self.left_height = (self.left_height - STEP).max(0.0),
                Keycode::PageUp => self.depth = (self.depth + STEP).min(1.0),
                Keycode::PageDown => self.depth = (self.depth - STEP).max(0.0),
                other => {
                    if let Some(event) = Self::control_for(other) {
                        debug!("Key '{:?}' pressed - {:?}", other, event);
                        controls.push(event);
                    }
                }
            }
        }
        self.held = keys.iter().cloned().collect();

        InputPoll {
            hands: HandFrame::new(self.left_hand(&keys), self.right_hand()),
            controls,
        }
    }
}
