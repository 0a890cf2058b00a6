use std::sync::mpsc::Sender;

use log::{debug, info, trace, warn};

use super::PerformanceConfig;
use crate::input::HandSide;
use crate::music::{note_name, NoteError, NoteName, RhythmClock, Scale, Subdivision};
use crate::synth::instrument::unit_volume;
use crate::synth::{Instrument, VoiceCommand, VoiceId};

/// Continuous voices peak at `volume * SUSTAIN_GAIN`.
pub const SUSTAIN_GAIN: f32 = 0.3;
/// Attack and retune ramp for continuous voices.
pub const GLIDE_SECS: f64 = 0.05;
pub const FADE_OUT_SECS: f64 = 0.1;
/// Delay between the fade-out and asking the renderer to drop the voice; must
/// outlast the fade. The renderer keeps the voice until the fade has played.
pub const RELEASE_GUARD_MS: f64 = 150.0;

/// Continuous-mode state of one hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandState {
    Idle,
    Sustaining(VoiceId),
    /// Fading out; the oscillator is released once the guard delay passes.
    Stopping(VoiceId),
}

#[derive(Debug, Clone, Copy)]
struct DeferredRelease {
    hand: HandSide,
    voice: VoiceId,
    generation: u64,
    due_ms: f64,
}

/// Control half of the synthesizer.
///
/// Decides which voices exist and sends the render timeline what to do with
/// them. The frame loop is the only caller, so nothing here is shared.
///
/// Every new or revived note bumps its hand's generation counter. A deferred
/// release remembers the generation it was queued under and is dropped if the
/// hand has moved on since, so a late release can never cut off a newer note.
pub struct AudioEngine {
    commands: Sender<VoiceCommand>,
    playing: bool,
    scale: Scale,
    instrument: Instrument,
    rhythm: RhythmClock,
    hands: [HandState; 2],
    generations: [u64; 2],
    pending_releases: Vec<DeferredRelease>,
    next_voice: u64,
    now_ms: f64,
    renderer_gone: bool,
}

impl AudioEngine {
    pub fn new(commands: Sender<VoiceCommand>, config: &PerformanceConfig) -> Self {
        Self {
            commands,
            playing: false,
            scale: config.scale,
            instrument: config.instrument,
            rhythm: RhythmClock::new(config.bpm, Subdivision::Quarter),
            hands: [HandState::Idle; 2],
            generations: [0; 2],
            pending_releases: Vec::new(),
            next_voice: 0,
            now_ms: 0.0,
            renderer_gone: false,
        }
    }

    pub fn start(&mut self) {
        if !self.playing {
            info!("audio started ({} scale, {})", self.scale, self.instrument);
        }
        self.playing = true;
    }

    /// Silences both hands. Play requests are ignored until `start` is called again.
    pub fn stop(&mut self) {
        if self.playing {
            info!("audio stopped");
        }
        self.playing = false;
        for hand in HandSide::BOTH.iter() {
            self.stop_hand(*hand);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Moves the engine clock forward and fires any releases that are due.
    pub fn advance(&mut self, now_ms: f64) {
        self.now_ms = now_ms;

        let (due, waiting): (Vec<DeferredRelease>, Vec<DeferredRelease>) =
            std::mem::take(&mut self.pending_releases)
                .into_iter()
                .partition(|release| release.due_ms <= now_ms);
        self.pending_releases = waiting;

        for release in due {
            let i = release.hand.index();
            let still_ours = self.hands[i] == HandState::Stopping(release.voice)
                && self.generations[i] == release.generation;
            if still_ours {
                self.hands[i] = HandState::Idle;
                self.send(VoiceCommand::Release { id: release.voice });
            } else {
                trace!("stale release of {} for {:?} hand skipped", release.voice, release.hand);
            }
        }
    }

    /// Continuous mode: start or retune the held tone for `hand`.
    pub fn play_hand_note(&mut self, hand: HandSide, frequency: f32, volume: f32) {
        if !self.playing || !usable_frequency(frequency) {
            return;
        }
        let gain = unit_volume(volume) * SUSTAIN_GAIN;
        let i = hand.index();

        match self.hands[i] {
            HandState::Idle => {
                let id = self.allocate_voice();
                self.generations[i] += 1;
                self.hands[i] = HandState::Sustaining(id);
                self.send(VoiceCommand::Start {
                    id,
                    hand,
                    waveform: self.instrument.carrier_waveform(),
                    frequency,
                    gain,
                    ramp: GLIDE_SECS,
                });
            }
            HandState::Sustaining(id) => {
                self.send(VoiceCommand::Glide {
                    id,
                    frequency,
                    gain,
                    ramp: GLIDE_SECS,
                });
            }
            HandState::Stopping(id) => {
                // The fade has not finished yet: bring the same voice back
                // instead of stacking a second one on top of it.
                debug!("{} revived for {:?} hand", id, hand);
                self.generations[i] += 1;
                self.hands[i] = HandState::Sustaining(id);
                self.send(VoiceCommand::Glide {
                    id,
                    frequency,
                    gain,
                    ramp: GLIDE_SECS,
                });
            }
        }
    }

    /// Fades the hand out; a no-op unless the hand is sustaining.
    pub fn stop_hand(&mut self, hand: HandSide) {
        let i = hand.index();
        if let HandState::Sustaining(id) = self.hands[i] {
            self.hands[i] = HandState::Stopping(id);
            self.send(VoiceCommand::FadeOut {
                id,
                ramp: FADE_OUT_SECS,
            });
            self.pending_releases.push(DeferredRelease {
                hand,
                voice: id,
                generation: self.generations[i],
                due_ms: self.now_ms + RELEASE_GUARD_MS,
            });
        }
    }

    /// Rhythm mode: schedules one self-terminating note with the current instrument.
    ///
    /// `duration` is in seconds and defaults to the current note interval.
    pub fn play_rhythm_note(&mut self, hand: HandSide, frequency: f32, volume: f32, duration: Option<f64>) {
        if !self.playing || !usable_frequency(frequency) {
            return;
        }
        let duration = duration.unwrap_or_else(|| self.rhythm.note_interval_ms() / 1000.0);
        let note = self.instrument.render(frequency, volume, duration);
        self.send(VoiceCommand::Schedule {
            hand,
            note: Box::new(note),
        });
    }

    pub fn set_scale(&mut self, scale: Scale) {
        debug!("scale set to {}", scale);
        self.scale = scale;
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Switches the instrument; held voices change waveform without restarting.
    pub fn set_instrument(&mut self, instrument: Instrument) {
        debug!("instrument set to {}", instrument);
        self.instrument = instrument;
        let waveform = instrument.carrier_waveform();
        for i in 0..self.hands.len() {
            match self.hands[i] {
                HandState::Sustaining(id) | HandState::Stopping(id) => {
                    self.send(VoiceCommand::SetWaveform { id, waveform });
                }
                HandState::Idle => {}
            }
        }
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn set_bpm(&mut self, bpm: u32) {
        self.rhythm.set_bpm(bpm);
        debug!("tempo {} bpm, note interval {:.1}ms", self.rhythm.bpm(), self.rhythm.note_interval_ms());
    }

    pub fn set_subdivision(&mut self, subdivision: Subdivision) {
        if subdivision != self.rhythm.subdivision() {
            trace!("subdivision {}", subdivision);
            self.rhythm.set_subdivision(subdivision);
        }
    }

    pub fn set_subdivision_denominator(&mut self, n: u32) {
        self.set_subdivision(Subdivision::from_denominator(n));
    }

    pub fn rhythm(&self) -> &RhythmClock {
        &self.rhythm
    }

    pub fn should_trigger_note(&mut self, now_ms: f64) -> bool {
        self.rhythm.should_trigger(now_ms)
    }

    pub fn closest_note_in_scale(&self, x: f32) -> f32 {
        self.scale.closest_note(x)
    }

    pub fn note_name(&self, frequency: f32) -> Result<NoteName, NoteError> {
        note_name(frequency)
    }

    pub fn hand_state(&self, hand: HandSide) -> HandState {
        self.hands[hand.index()]
    }

    pub fn pending_release_count(&self) -> usize {
        self.pending_releases.len()
    }

    fn allocate_voice(&mut self) -> VoiceId {
        self.next_voice += 1;
        VoiceId(self.next_voice)
    }

    fn send(&mut self, command: VoiceCommand) {
        if self.commands.send(command).is_err() && !self.renderer_gone {
            // No output device: keep tracking hands, just without sound.
            warn!("audio renderer unavailable, continuing silently");
            self.renderer_gone = true;
        }
    }
}

fn usable_frequency(frequency: f32) -> bool {
    frequency.is_finite() && frequency > 0.0
}
