use handsynth::input::{HandFrame, HandPose, HandSide};
use handsynth::performance::{AudioEngine, HandState, PerformanceAdapter, PerformanceConfig, PlayMode};
use handsynth::synth::waveform::Waveform;
use handsynth::synth::{Instrument, SynthConfig, SynthEngine};

const SAMPLE_RATE: f32 = 8000.0;
// 10ms per buffer
const BUFFER: usize = 80;

fn rig(mode: PlayMode) -> (AudioEngine, SynthEngine) {
    let synth = SynthEngine::new(SynthConfig {
        sample_rate: SAMPLE_RATE,
        ..SynthConfig::default()
    });
    let config = PerformanceConfig {
        mode,
        ..PerformanceConfig::default()
    };
    let mut engine = AudioEngine::new(synth.command_sender(), &config);
    engine.start();
    (engine, synth)
}

/// Renders `ms` milliseconds and returns the peak absolute sample.
fn render(synth: &mut SynthEngine, ms: usize) -> f32 {
    let mut buffer = vec![0.0; BUFFER];
    let mut peak = 0.0f32;
    for _ in 0..ms / 10 {
        synth.process(&mut buffer);
        peak = buffer.iter().fold(peak, |acc, s| acc.max(s.abs()));
    }
    peak
}

fn voice_of(engine: &AudioEngine, hand: HandSide) -> handsynth::synth::VoiceId {
    match engine.hand_state(hand) {
        HandState::Sustaining(id) | HandState::Stopping(id) => id,
        HandState::Idle => panic!("{:?} hand has no voice", hand),
    }
}

#[test]
fn held_tone_fades_in_and_is_released_after_the_guard() {
    let (mut engine, mut synth) = rig(PlayMode::Continuous);
    engine.advance(0.0);
    engine.play_hand_note(HandSide::Left, 220.0, 1.0);
    let id = voice_of(&engine, HandSide::Left);

    assert!(render(&mut synth, 100) > 0.0);
    assert_eq!(synth.sustained_voices_for(HandSide::Left), 1);
    let gain = synth.sustained_gain(id).unwrap();
    assert!((gain - 0.3).abs() < 1e-4, "gain {}", gain);

    engine.advance(100.0);
    engine.stop_hand(HandSide::Left);
    render(&mut synth, 120);
    assert!(synth.sustained_gain(id).unwrap() < 1e-4);
    assert_eq!(synth.sustained_voice_count(), 1);

    engine.advance(250.0);
    render(&mut synth, 10);
    assert_eq!(synth.sustained_voice_count(), 0);
    assert_eq!(engine.hand_state(HandSide::Left), HandState::Idle);
}

#[test]
fn hand_returning_during_fade_keeps_a_single_voice() {
    let (mut engine, mut synth) = rig(PlayMode::Continuous);
    engine.advance(0.0);
    engine.play_hand_note(HandSide::Right, 330.0, 1.0);
    render(&mut synth, 60);
    let id = voice_of(&engine, HandSide::Right);

    engine.advance(60.0);
    engine.stop_hand(HandSide::Right);
    render(&mut synth, 50);

    engine.advance(110.0);
    engine.play_hand_note(HandSide::Right, 392.0, 1.0);
    render(&mut synth, 100);

    // the release queued by the stop is now due but stale
    engine.advance(400.0);
    render(&mut synth, 10);

    assert_eq!(synth.sustained_voices_for(HandSide::Right), 1);
    assert_eq!(voice_of(&engine, HandSide::Right), id);
    assert!(synth.sustained_gain(id).unwrap() > 0.25);
    assert!((synth.sustained_frequency(id).unwrap() - 392.0).abs() < 1e-3);
}

#[test]
fn each_hand_gets_its_own_voice() {
    let (mut engine, mut synth) = rig(PlayMode::Continuous);
    engine.play_hand_note(HandSide::Left, 220.0, 0.5);
    engine.play_hand_note(HandSide::Right, 440.0, 0.5);
    engine.play_hand_note(HandSide::Right, 494.0, 0.5);
    render(&mut synth, 10);
    assert_eq!(synth.sustained_voices_for(HandSide::Left), 1);
    assert_eq!(synth.sustained_voices_for(HandSide::Right), 1);
}

#[test]
fn instrument_change_swaps_the_waveform_of_held_tones() {
    let (mut engine, mut synth) = rig(PlayMode::Continuous);
    engine.play_hand_note(HandSide::Left, 220.0, 1.0);
    render(&mut synth, 10);
    let id = voice_of(&engine, HandSide::Left);
    assert_eq!(synth.sustained_waveform(id), Some(Waveform::Sine));

    engine.set_instrument(Instrument::Guitar);
    render(&mut synth, 10);
    assert_eq!(synth.sustained_waveform(id), Some(Waveform::Triangle));
    assert_eq!(synth.sustained_voice_count(), 1);
}

#[test]
fn rhythm_notes_sound_then_leave_the_renderer() {
    for instrument in Instrument::ALL.iter().copied() {
        let (mut engine, mut synth) = rig(PlayMode::Rhythm);
        engine.set_instrument(instrument);
        engine.play_rhythm_note(HandSide::Left, 261.63, 1.0, Some(0.2));

        let peak = render(&mut synth, 100);
        assert!(peak > 0.0, "{} was silent", instrument);
        assert_eq!(synth.active_note_count(), 1);

        render(&mut synth, 150);
        assert_eq!(synth.active_note_count(), 0, "{} never expired", instrument);
    }
}

#[test]
fn stopped_engine_renders_silence() {
    let (mut engine, mut synth) = rig(PlayMode::Rhythm);
    engine.stop();
    engine.play_rhythm_note(HandSide::Left, 261.63, 1.0, None);
    engine.play_hand_note(HandSide::Left, 261.63, 1.0);
    assert_eq!(render(&mut synth, 50), 0.0);
    assert_eq!(synth.active_note_count(), 0);
    assert_eq!(synth.sustained_voice_count(), 0);
}

#[test]
fn adapter_drives_the_renderer_on_each_beat() {
    let (mut engine, mut synth) = rig(PlayMode::Rhythm);
    let mut adapter = PerformanceAdapter::new(PlayMode::Rhythm);
    // both hands at mid height: quarter notes, 500ms apart at 120 bpm
    let frame = HandFrame::new(
        Some(HandPose::new(0.2, 0.55, 0.9)),
        Some(HandPose::new(0.8, 0.55, 0.9)),
    );

    let mut triggers = 0;
    for frame_index in 0..=60 {
        let now_ms = frame_index as f64 * 1000.0 / 60.0;
        if adapter.on_frame(&mut engine, &frame, now_ms).triggered {
            triggers += 1;
        }
        render(&mut synth, 10);
        if frame_index == 0 {
            assert_eq!(synth.active_note_count(), 2);
        }
    }
    // t = 0, 500 and 1000ms
    assert_eq!(triggers, 3);
}

#[test]
fn large_device_buffers_never_cut_a_fade_short() {
    // ~93ms per callback at 44.1kHz
    const FRAMES: usize = 4096;
    let mut synth = SynthEngine::new(SynthConfig::default());
    let config = PerformanceConfig {
        mode: PlayMode::Continuous,
        ..PerformanceConfig::default()
    };
    let mut engine = AudioEngine::new(synth.command_sender(), &config);
    let mut buffer = vec![0.0; FRAMES];
    engine.start();

    engine.advance(0.0);
    engine.play_hand_note(HandSide::Left, 220.0, 1.0);
    let id = voice_of(&engine, HandSide::Left);
    synth.process(&mut buffer);
    synth.process(&mut buffer);

    // The frame loop runs ahead of the device: the release is sent before
    // the renderer has even started the fade.
    engine.advance(200.0);
    engine.stop_hand(HandSide::Left);
    engine.advance(350.0);
    assert_eq!(engine.hand_state(HandSide::Left), HandState::Idle);

    let mut last_gain = synth.sustained_gain(id);
    for _ in 0..10 {
        synth.process(&mut buffer);
        match synth.sustained_gain(id) {
            Some(gain) => last_gain = Some(gain),
            None => break,
        }
    }

    assert_eq!(synth.sustained_voice_count(), 0);
    let tail = buffer.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    assert!(last_gain.unwrap() < 1e-4, "cut at gain {:?}", last_gain);
    assert!(tail < 1e-4, "last block peak {}", tail);
}

#[test]
fn release_without_a_fade_still_ramps_down() {
    let (mut engine, mut synth) = rig(PlayMode::Continuous);
    let id = {
        engine.play_hand_note(HandSide::Right, 440.0, 1.0);
        voice_of(&engine, HandSide::Right)
    };
    render(&mut synth, 100);
    synth
        .command_sender()
        .send(handsynth::synth::VoiceCommand::Release { id })
        .unwrap();

    render(&mut synth, 10);
    // still fading on the first block after the release
    assert_eq!(synth.sustained_voice_count(), 1);
    render(&mut synth, 20);
    assert_eq!(synth.sustained_voice_count(), 0);
}
