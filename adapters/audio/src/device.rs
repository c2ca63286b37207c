use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use prefire_core::{AudioReadiness, SoundEffect, ToneEvent};
use tracing::{info, warn};

use crate::{mixer::Mixer, samples::SampleBank, AudioError, AudioOutput};

/// Sound card output rendering the shared mixer from the device callback.
///
/// The device clock is the number of frames the callback has rendered, so it
/// stops while the stream is paused.
pub struct CpalAudioOutput {
    stream: cpal::Stream,
    mixer: Arc<Mutex<Mixer>>,
    sample_dir: Option<PathBuf>,
    readiness: AudioReadiness,
}

impl CpalAudioOutput {
    /// Opens the default output device.
    pub fn open(sample_dir: Option<PathBuf>) -> Result<Self, AudioError> {
        let device_error = |error: &dyn std::fmt::Display| AudioError::Device(error.to_string());

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| device_error(&"no default output device"))?;
        let supported = device
            .default_output_config()
            .map_err(|error| device_error(&error))?;
        let channels = usize::from(supported.channels()).max(1);
        let config: cpal::StreamConfig = supported.into();
        info!(
            sample_rate = config.sample_rate.0,
            channels,
            "audio device opened"
        );

        let mixer = Arc::new(Mutex::new(Mixer::new(config.sample_rate.0)));
        let shared = Arc::clone(&mixer);
        let mut mono: Vec<f32> = Vec::new();
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    mono.resize(data.len() / channels, 0.0);
                    match shared.lock() {
                        Ok(mut mixer) => mixer.render(&mut mono),
                        Err(_) => mono.fill(0.0),
                    }
                    for (frame, value) in data.chunks_mut(channels).zip(&mono) {
                        frame.fill(*value);
                    }
                },
                |error| warn!(%error, "audio stream error"),
                None,
            )
            .map_err(|error| device_error(&error))?;
        stream.play().map_err(|error| device_error(&error))?;

        Ok(Self {
            stream,
            mixer,
            sample_dir,
            readiness: AudioReadiness::Pending,
        })
    }

    fn with_mixer(&self, action: impl FnOnce(&mut Mixer)) {
        match self.mixer.lock() {
            Ok(mut mixer) => action(&mut mixer),
            Err(_) => warn!("audio mixer poisoned; request dropped"),
        }
    }
}

impl AudioOutput for CpalAudioOutput {
    fn unlock(&mut self) {
        if self.readiness != AudioReadiness::Pending {
            return;
        }
        let bank = self
            .sample_dir
            .as_deref()
            .map(SampleBank::load_dir)
            .unwrap_or_default();
        self.readiness = if bank.is_empty() {
            warn!("no piano sample loaded; cues will be silent");
            AudioReadiness::Unavailable
        } else {
            AudioReadiness::Ready
        };
        let bank = Arc::new(bank);
        self.with_mixer(|mixer| mixer.set_bank(bank));
    }

    fn readiness(&self) -> AudioReadiness {
        self.readiness
    }

    fn current_time(&self) -> f64 {
        self.mixer.lock().map(|mixer| mixer.now()).unwrap_or(0.0)
    }

    fn advance(&mut self, _dt: Duration) {}

    fn schedule_tone(&mut self, tone: ToneEvent) {
        self.with_mixer(|mixer| {
            let _ = mixer.schedule_tone(tone);
        });
    }

    fn play_effect(&mut self, effect: SoundEffect) {
        self.with_mixer(|mixer| mixer.play_effect(effect));
    }

    fn suspend(&mut self) {
        if let Err(error) = self.stream.pause() {
            warn!(%error, "audio stream failed to pause");
        }
        self.with_mixer(Mixer::silence);
    }

    fn resume(&mut self) {
        if let Err(error) = self.stream.play() {
            warn!(%error, "audio stream failed to resume");
        }
    }
}
