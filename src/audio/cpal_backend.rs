use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use log::{debug, error, info};
use std::sync::{Arc, Mutex, PoisonError};

use crate::audio::{AudioBackend, AudioError};
use crate::synth::SynthEngine;

/// Plays a shared [`SynthEngine`] on the default output device.
pub struct CpalBackend {
    stream: Option<Stream>,
    synth_engine: Arc<Mutex<SynthEngine>>,
    running: bool,
}

impl CpalBackend {
    pub fn new(synth_engine: Arc<Mutex<SynthEngine>>) -> Self {
        Self {
            stream: None,
            synth_engine,
            running: false,
        }
    }

    fn build_stream(&mut self) -> Result<Stream, AudioError> {
        let host = cpal::default_host();
        if let Ok(devices) = host.output_devices() {
            for device in devices {
                debug!("Output device: {}", device.name().unwrap_or_default());
            }
        }

        let device = host.default_output_device().ok_or(AudioError::NoOutputDevice)?;
        info!("Selected device: {}", device.name().unwrap_or_default());

        let config = device
            .default_output_config()
            .map_err(|source| AudioError::DefaultConfig { source })?;
        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;

        {
            let mut synth_engine = self.synth_engine.lock().unwrap_or_else(PoisonError::into_inner);
            synth_engine.set_sample_rate(sample_rate as f32);
        }

        let synth_engine = self.synth_engine.clone();
        let mut buffer: Vec<f32> = Vec::new();

        let stream = match config.sample_format() {
            SampleFormat::F32 => device
                .build_output_stream(
                    &config.into(),
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        let frames = data.len() / channels;
                        buffer.resize(frames, 0.0);

                        synth_engine
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .process(&mut buffer);

                        // mono engine, same sample on every channel
                        for (frame, sample) in data.chunks_mut(channels).zip(buffer.iter()) {
                            for out in frame.iter_mut() {
                                *out = *sample;
                            }
                        }
                    },
                    |err| error!("an error occurred on stream: {}", err),
                    None,
                )
                .map_err(|source| AudioError::BuildStream { source })?,
            other => {
                return Err(AudioError::UnsupportedFormat {
                    format: format!("{:?}", other),
                })
            }
        };

        Ok(stream)
    }
}

impl AudioBackend for CpalBackend {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.stream.is_none() {
            self.stream = Some(self.build_stream()?);
        }
        if let Some(stream) = &self.stream {
            stream.play().map_err(|source| AudioError::PlayStream { source })?;
            self.running = true;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(stream) = &self.stream {
            stream.pause().map_err(|source| AudioError::PauseStream { source })?;
        }
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
