//! Parameter timelines evaluated per sample by the renderer.
//!
//! The model follows the familiar audio-param semantics: a value is held
//! after a `Set` event, and a ramp event interpolates from the previous event
//! (time and value) up to its own time and value.

/// Exponential ramps are undefined at zero; targets are floored here.
pub const EXP_FLOOR: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    Set { time: f64, value: f32 },
    Linear { time: f64, value: f32 },
    Exponential { time: f64, value: f32 },
}

impl AutomationEvent {
    pub fn time(&self) -> f64 {
        match *self {
            AutomationEvent::Set { time, .. }
            | AutomationEvent::Linear { time, .. }
            | AutomationEvent::Exponential { time, .. } => time,
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            AutomationEvent::Set { value, .. }
            | AutomationEvent::Linear { value, .. }
            | AutomationEvent::Exponential { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Automation {
    initial: f32,
    events: Vec<AutomationEvent>,
}

impl Automation {
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    pub fn set(mut self, time: f64, value: f32) -> Self {
        self.insert(AutomationEvent::Set { time, value });
        self
    }

    pub fn linear_to(mut self, time: f64, value: f32) -> Self {
        self.insert(AutomationEvent::Linear { time, value });
        self
    }

    pub fn exponential_to(mut self, time: f64, value: f32) -> Self {
        self.insert(AutomationEvent::Exponential {
            time,
            value: value.max(EXP_FLOOR),
        });
        self
    }

    // Stable by time: events at the same instant keep their insertion order.
    fn insert(&mut self, event: AutomationEvent) {
        let at = self
            .events
            .iter()
            .position(|e| e.time() > event.time())
            .unwrap_or(self.events.len());
        self.events.insert(at, event);
    }

    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Re-anchors the timeline at `now` and ramps linearly to `target` by `end`.
    ///
    /// Used for glides on long-lived voices: history before `now` is dropped,
    /// so the event list never grows with the number of retunes.
    pub fn ramp_from_current(&mut self, now: f64, target: f32, end: f64) {
        let current = self.value_at(now);
        self.events.clear();
        self.initial = current;
        self.events.push(AutomationEvent::Set { time: now, value: current });
        self.events.push(AutomationEvent::Linear {
            time: end.max(now),
            value: target,
        });
    }

    pub fn value_at(&self, t: f64) -> f32 {
        let next_index = self
            .events
            .iter()
            .position(|e| e.time() > t)
            .unwrap_or(self.events.len());

        let (prev_time, prev_value) = match next_index.checked_sub(1) {
            Some(i) => (self.events[i].time(), self.events[i].value()),
            None => (0.0, self.initial),
        };

        let next = match self.events.get(next_index) {
            Some(next) => next,
            None => return prev_value,
        };

        let span = next.time() - prev_time;
        let progress = if span > 0.0 {
            ((t - prev_time) / span).clamp(0.0, 1.0) as f32
        } else {
            1.0
        };

        match *next {
            AutomationEvent::Set { .. } => prev_value,
            AutomationEvent::Linear { value, .. } => prev_value + (value - prev_value) * progress,
            AutomationEvent::Exponential { value, .. } => {
                let from = prev_value.max(EXP_FLOOR);
                from * (value / from).powf(progress)
            }
        }
    }

    /// Time of the last scheduled event, or 0 for a constant.
    pub fn end_time(&self) -> f64 {
        self.events.last().map_or(0.0, |e| e.time())
    }
}
