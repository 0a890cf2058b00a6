use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use handsynth::audio::{AudioBackend, CpalBackend};
use handsynth::input::{ControlEvent, HandSide, HandSource, KeyboardHands};
use handsynth::music::Scale;
use handsynth::performance::{AudioEngine, FrameReport, PerformanceAdapter, PerformanceConfig, PlayMode};
use handsynth::synth::{Instrument, SynthConfig, SynthEngine};
use log::{debug, error, info};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "handsynth", about = "Play music by moving your hands")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// Tempo in beats per minute, clamped to 60..=180.
    #[structopt(long, default_value = "120")]
    bpm: u32,

    /// major, minor, pentatonic, blues or chromatic.
    #[structopt(long, default_value = "major")]
    scale: Scale,

    /// synth, guitar, saxophone or piano.
    #[structopt(long, default_value = "synth")]
    instrument: Instrument,

    /// rhythm (one note per beat subdivision) or continuous (held tones).
    #[structopt(long, default_value = "rhythm")]
    mode: PlayMode,

    /// Hand frames processed per second.
    #[structopt(long, default_value = "60")]
    fps: u32,

    /// Screen size used to normalize the mouse position.
    #[structopt(long, default_value = "1920")]
    screen_width: u32,
    #[structopt(long, default_value = "1080")]
    screen_height: u32,
}

fn main() -> Result<(), log::SetLoggerError> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level)?;

    let config = PerformanceConfig {
        scale: opt.scale,
        instrument: opt.instrument,
        bpm: opt.bpm,
        mode: opt.mode,
    };

    // Shared with the audio callback
    let synth_engine = Arc::new(Mutex::new(SynthEngine::new(SynthConfig::default())));
    let commands = synth_engine
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .command_sender();

    let mut audio_backend = CpalBackend::new(synth_engine);
    let _audio_backend = match audio_backend.start() {
        Ok(()) => Some(audio_backend),
        Err(err) => {
            // Dropping the backend closes the command channel; playback
            // requests are then discarded.
            error!("{}. Continuing without sound.", err);
            None
        }
    };

    let mut engine = AudioEngine::new(commands, &config);
    let mut adapter = PerformanceAdapter::new(config.mode);
    let mut hands = KeyboardHands::new(opt.screen_width, opt.screen_height);
    engine.start();

    info!(
        "{} mode, {} scale, {}, {} bpm. Space toggles audio, Escape quits.",
        adapter.mode(),
        engine.scale(),
        engine.instrument(),
        engine.rhythm().bpm()
    );

    let frame_time = Duration::from_secs_f64(1.0 / opt.fps.max(1) as f64);
    let started = Instant::now();
    let mut last_report: Option<FrameReport> = None;

    'frames: loop {
        let frame_start = Instant::now();
        let now_ms = started.elapsed().as_secs_f64() * 1000.0;
        let poll = hands.poll();

        for control in poll.controls {
            match control {
                ControlEvent::SelectScale(scale) => engine.set_scale(scale),
                ControlEvent::NudgeBpm(delta) => {
                    let bpm = (engine.rhythm().bpm() as i32 + delta).max(0) as u32;
                    engine.set_bpm(bpm);
                    info!("{} bpm", engine.rhythm().bpm());
                }
                ControlEvent::NextInstrument => engine.set_instrument(engine.instrument().next()),
                ControlEvent::PreviousInstrument => engine.set_instrument(engine.instrument().previous()),
                ControlEvent::ToggleAudio => {
                    if engine.is_playing() {
                        engine.stop();
                    } else {
                        engine.start();
                    }
                }
                ControlEvent::Quit => break 'frames,
            }
        }

        let report = adapter.on_frame(&mut engine, &poll.hands, now_ms);
        log_changes(last_report.as_ref(), &report);
        last_report = Some(report);

        if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }

    // Let held tones fade before the stream goes away.
    engine.stop();
    let now_ms = started.elapsed().as_secs_f64() * 1000.0;
    thread::sleep(Duration::from_millis(200));
    engine.advance(now_ms + 200.0);
    info!("bye");
    Ok(())
}

fn log_changes(previous: Option<&FrameReport>, report: &FrameReport) {
    for side in HandSide::BOTH.iter().copied() {
        let before = previous.and_then(|r| r.hand(side)).and_then(|r| r.note);
        let now = report.hand(side).and_then(|r| r.note);
        if before != now {
            match now {
                Some(note) => debug!("{:?} hand: {}", side, note),
                None => debug!("{:?} hand: -", side),
            }
        }
    }
    if previous.map(|r| r.subdivision) != Some(report.subdivision) {
        debug!("subdivision {}", report.subdivision);
    }
}
