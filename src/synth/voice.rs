use super::automation::Automation;
use super::filter::Biquad;
use super::instrument::ScheduledEnvelope;
use super::note::VoiceId;
use super::waveform::{Oscillator, Waveform};
use crate::input::HandSide;

/// Fade applied on release when the voice was still audible.
const RELEASE_FADE_SECS: f64 = 0.01;

/// A continuous-mode voice: one oscillator held open and retuned while its
/// hand stays in view.
pub struct SustainedVoice {
    pub id: VoiceId,
    pub hand: HandSide,
    oscillator: Oscillator,
    frequency: Automation,
    gain: Automation,
    released: bool,
}

impl SustainedVoice {
    /// Starts silent at `now` and ramps up to `gain`, so the onset never clicks.
    pub fn new(
        id: VoiceId,
        hand: HandSide,
        waveform: Waveform,
        frequency: f32,
        gain: f32,
        now: f64,
        ramp: f64,
    ) -> Self {
        Self {
            id,
            hand,
            oscillator: Oscillator::new(waveform),
            frequency: Automation::new(frequency).set(now, frequency),
            gain: Automation::new(0.0).set(now, 0.0).linear_to(now + ramp, gain),
            released: false,
        }
    }

    pub fn glide(&mut self, now: f64, frequency: f32, gain: f32, ramp: f64) {
        self.frequency.ramp_from_current(now, frequency, now + ramp);
        self.gain.ramp_from_current(now, gain, now + ramp);
    }

    pub fn fade_out(&mut self, now: f64, ramp: f64) {
        self.gain.ramp_from_current(now, 0.0, now + ramp);
    }

    /// Marks the voice for removal once its gain has settled at zero.
    pub fn release(&mut self, now: f64) {
        self.released = true;
        let target = self.gain.value_at(self.gain.end_time().max(now));
        if target > 0.0 {
            self.fade_out(now, RELEASE_FADE_SECS);
        }
    }

    /// True once released and the whole fade has been rendered.
    pub fn is_finished_at(&self, t: f64) -> bool {
        self.released && t >= self.gain.end_time()
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.oscillator.set_waveform(waveform);
    }

    pub fn waveform(&self) -> Waveform {
        self.oscillator.waveform
    }

    pub fn gain_at(&self, t: f64) -> f32 {
        self.gain.value_at(t)
    }

    pub fn frequency_at(&self, t: f64) -> f32 {
        self.frequency.value_at(t)
    }

    /// Adds this voice into `output`, whose first sample sits at `start_time`.
    pub fn process(&mut self, output: &mut [f32], start_time: f64, sample_rate: f32) {
        let dt = 1.0 / sample_rate as f64;
        for (i, sample) in output.iter_mut().enumerate() {
            let t = start_time + i as f64 * dt;
            let frequency = self.frequency.value_at(t);
            *sample += self.oscillator.next_sample(frequency, sample_rate) * self.gain.value_at(t);
        }
    }
}

/// A rhythm-mode note rendering its own schedule until it runs out.
pub struct NoteVoice {
    pub hand: HandSide,
    envelope: ScheduledEnvelope,
    oscillators: Vec<Oscillator>,
    vibrato_lfo: Oscillator,
    filter: Option<Biquad>,
    start: f64,
}

impl NoteVoice {
    pub fn new(hand: HandSide, envelope: ScheduledEnvelope, start: f64, sample_rate: f32) -> Self {
        let oscillators = envelope
            .partials
            .iter()
            .map(|p| Oscillator::new(p.waveform))
            .collect();
        let filter = envelope
            .filter
            .as_ref()
            .map(|sweep| Biquad::new(sweep.filter_type, sweep.cutoff.value_at(0.0), sweep.q, sample_rate));

        Self {
            hand,
            envelope,
            oscillators,
            vibrato_lfo: Oscillator::new(Waveform::Sine),
            filter,
            start,
        }
    }

    pub fn end_time(&self) -> f64 {
        self.start + self.envelope.duration()
    }

    pub fn is_finished_at(&self, t: f64) -> bool {
        t >= self.end_time()
    }

    pub fn process(&mut self, output: &mut [f32], start_time: f64, sample_rate: f32) {
        let dt = 1.0 / sample_rate as f64;
        let duration = self.envelope.duration();
        let base = self.envelope.frequency;

        for (i, sample) in output.iter_mut().enumerate() {
            let local = start_time + i as f64 * dt - self.start;
            if local < 0.0 {
                continue;
            }
            if local >= duration {
                break;
            }

            let bend = match &self.envelope.vibrato {
                Some(vibrato) => {
                    vibrato.depth.value_at(local) * self.vibrato_lfo.next_sample(vibrato.rate_hz, sample_rate)
                }
                None => 0.0,
            };

            let mut mixed = 0.0;
            for (partial, osc) in self.envelope.partials.iter().zip(self.oscillators.iter_mut()) {
                let mut frequency = base * partial.ratio;
                if partial.vibrato {
                    frequency += bend;
                }
                mixed += osc.next_sample(frequency, sample_rate) * partial.level;
            }

            if let (Some(filter), Some(sweep)) = (self.filter.as_mut(), self.envelope.filter.as_ref()) {
                filter.set_cutoff(sweep.cutoff.value_at(local));
                mixed = filter.process(mixed);
            }

            *sample += mixed * self.envelope.gain.value_at(local);
        }
    }
}
