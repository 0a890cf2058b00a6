use super::config::SynthConfig;
use super::note::{VoiceCommand, VoiceId};
use super::voice::{NoteVoice, SustainedVoice};
use super::waveform::Waveform;
use crate::input::HandSide;
use log::{debug, trace};
use std::sync::mpsc::{Receiver, Sender};

/// The render timeline: owns every sounding voice and mixes them into the
/// buffers the output device asks for.
///
/// Nothing here decides what to play. Commands arrive over a channel from the
/// control side and are applied at the start of the next buffer.
pub struct SynthEngine {
    pub config: SynthConfig,
    command_receiver: Receiver<VoiceCommand>,
    command_sender: Sender<VoiceCommand>,
    sustained: Vec<SustainedVoice>,
    notes: Vec<NoteVoice>,
    sample_rate: f32,
    time: f64, // seconds rendered so far
}

impl SynthEngine {
    pub fn new(config: SynthConfig) -> Self {
        let (command_sender, command_receiver) = std::sync::mpsc::channel();
        Self {
            sample_rate: config.sample_rate,
            config,
            command_receiver,
            command_sender,
            sustained: Vec::new(),
            notes: Vec::new(),
            time: 0.0,
        }
    }

    /// Get a sender for voice commands that can be handed to the control side
    pub fn command_sender(&self) -> Sender<VoiceCommand> {
        self.command_sender.clone()
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        debug!("Sample rate set to: {}", sample_rate);
        self.sample_rate = sample_rate;
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current position of the render timeline in seconds.
    pub fn now(&self) -> f64 {
        self.time
    }

    /// Render one mono buffer.
    pub fn process(&mut self, output: &mut [f32]) {
        self.process_commands();

        // Released voices leave only once their fade has been rendered.
        let start = self.time;
        self.sustained.retain(|voice| {
            let done = voice.is_finished_at(start);
            if done {
                debug!("{} released", voice.id);
            }
            !done
        });

        output.fill(0.0);
        let sample_rate = self.sample_rate;

        for voice in self.sustained.iter_mut() {
            voice.process(output, start, sample_rate);
        }
        for note in self.notes.iter_mut() {
            note.process(output, start, sample_rate);
        }

        let master = self.config.master_volume;
        for sample in output.iter_mut() {
            *sample *= master;
        }
        self.apply_limiter(output);

        self.time += output.len() as f64 / sample_rate as f64;

        // Bounded notes expire on their own.
        let now = self.time;
        let before = self.notes.len();
        self.notes.retain(|note| !note.is_finished_at(now));
        if self.notes.len() != before {
            trace!("{} rhythm notes expired", before - self.notes.len());
        }
    }

    fn process_commands(&mut self) {
        let now = self.time;
        while let Ok(command) = self.command_receiver.try_recv() {
            match command {
                VoiceCommand::Start {
                    id,
                    hand,
                    waveform,
                    frequency,
                    gain,
                    ramp,
                } => {
                    debug!("{} starts for {:?} hand at {:.2} Hz", id, hand, frequency);
                    self.sustained
                        .push(SustainedVoice::new(id, hand, waveform, frequency, gain, now, ramp));
                }
                VoiceCommand::Glide {
                    id,
                    frequency,
                    gain,
                    ramp,
                } => {
                    if let Some(voice) = self.sustained_mut(id) {
                        voice.glide(now, frequency, gain, ramp);
                    }
                }
                VoiceCommand::SetWaveform { id, waveform } => {
                    if let Some(voice) = self.sustained_mut(id) {
                        voice.set_waveform(waveform);
                    }
                }
                VoiceCommand::FadeOut { id, ramp } => {
                    if let Some(voice) = self.sustained_mut(id) {
                        voice.fade_out(now, ramp);
                    }
                }
                VoiceCommand::Release { id } => match self.sustained_mut(id) {
                    Some(voice) => voice.release(now),
                    // already gone; releasing twice is harmless
                    None => trace!("{} was already released", id),
                },
                VoiceCommand::Schedule { hand, note } => {
                    trace!(
                        "scheduling {:.2} Hz for {:?} hand, {:.3}s",
                        note.frequency,
                        hand,
                        note.duration()
                    );
                    self.notes.push(NoteVoice::new(hand, *note, now, self.sample_rate));
                }
            }
        }
    }

    fn sustained_mut(&mut self, id: VoiceId) -> Option<&mut SustainedVoice> {
        self.sustained.iter_mut().find(|voice| voice.id == id)
    }

    /// Apply a soft knee limiter to prevent clipping
    fn apply_limiter(&self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            if sample.abs() > 0.9 {
                let excess = (sample.abs() - 0.9) / 0.1;
                let scale = 1.0 - excess * 0.1;
                *sample *= scale.max(0.0);
            }
        }
    }

    pub fn sustained_voice_count(&self) -> usize {
        self.sustained.len()
    }

    pub fn sustained_voices_for(&self, hand: HandSide) -> usize {
        self.sustained.iter().filter(|voice| voice.hand == hand).count()
    }

    pub fn sustained_gain(&self, id: VoiceId) -> Option<f32> {
        self.sustained
            .iter()
            .find(|voice| voice.id == id)
            .map(|voice| voice.gain_at(self.time))
    }

    pub fn sustained_frequency(&self, id: VoiceId) -> Option<f32> {
        self.sustained
            .iter()
            .find(|voice| voice.id == id)
            .map(|voice| voice.frequency_at(self.time))
    }

    pub fn sustained_waveform(&self, id: VoiceId) -> Option<Waveform> {
        self.sustained
            .iter()
            .find(|voice| voice.id == id)
            .map(|voice| voice.waveform())
    }

    pub fn active_note_count(&self) -> usize {
        self.notes.len()
    }
}

impl Default for SynthEngine {
    fn default() -> Self {
        Self::new(SynthConfig::default())
    }
}
