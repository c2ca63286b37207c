use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use hound::{SampleFormat, WavSpec, WavWriter};
use prefire_core::{AudioReadiness, SoundEffect, ToneEvent, Voice};
use tracing::{debug, info, warn};

use crate::{clock::DeviceClock, mixer::Mixer, samples::SampleBank, AudioError, AudioOutput};

const CAPTURE_SAMPLE_RATE: u32 = 44_100;

/// Sound handed to the output, kept for inspection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScheduledSound {
    /// A tone scheduled on the device clock.
    Tone(ToneEvent),
    /// An effect started at the recorded device time.
    Effect {
        /// Effect that was requested.
        effect: SoundEffect,
        /// Device time the effect started at.
        at: f64,
    },
}

struct Capture {
    mixer: Mixer,
    writer: WavWriter<BufWriter<File>>,
    scratch: Vec<f32>,
}

/// Audio output driven by frame time instead of a sound card.
///
/// Everything requested is recorded in [`VirtualAudioOutput::history`]; when a
/// capture path is configured the mix is additionally written to a WAV file.
pub struct VirtualAudioOutput {
    clock: DeviceClock,
    sample_dir: Option<PathBuf>,
    bank: Option<Arc<SampleBank>>,
    readiness: AudioReadiness,
    history: Vec<ScheduledSound>,
    capture: Option<Capture>,
}

impl std::fmt::Debug for VirtualAudioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualAudioOutput")
            .field("clock", &self.clock)
            .field("readiness", &self.readiness)
            .field("history", &self.history.len())
            .field("capturing", &self.capture.is_some())
            .finish()
    }
}

impl VirtualAudioOutput {
    /// Creates an output that loads piano samples from `sample_dir` on unlock.
    #[must_use]
    pub fn new(sample_dir: Option<PathBuf>) -> Self {
        Self {
            clock: DeviceClock::new(),
            sample_dir,
            bank: None,
            readiness: AudioReadiness::Pending,
            history: Vec::new(),
            capture: None,
        }
    }

    /// Creates an output with an already loaded bank.
    #[must_use]
    pub fn with_bank(bank: SampleBank) -> Self {
        let mut output = Self::new(None);
        output.install(bank);
        output
    }

    /// Writes the mixed session audio to `path` as 16-bit mono WAV.
    pub fn capture_to(mut self, path: &Path) -> Result<Self, AudioError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: CAPTURE_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec).map_err(AudioError::Capture)?;
        let mut mixer = Mixer::new(CAPTURE_SAMPLE_RATE);
        if let Some(bank) = &self.bank {
            mixer.set_bank(Arc::clone(bank));
        }
        info!(path = %path.display(), "capturing audio");
        self.capture = Some(Capture {
            mixer,
            writer,
            scratch: Vec::new(),
        });
        Ok(self)
    }

    /// Sounds requested so far.
    #[must_use]
    pub fn history(&self) -> &[ScheduledSound] {
        &self.history
    }

    fn install(&mut self, bank: SampleBank) {
        self.readiness = if bank.is_empty() {
            warn!("no piano sample loaded; cues will be silent");
            AudioReadiness::Unavailable
        } else {
            AudioReadiness::Ready
        };
        let bank = Arc::new(bank);
        if let Some(capture) = self.capture.as_mut() {
            capture.mixer.set_bank(Arc::clone(&bank));
        }
        self.bank = Some(bank);
    }

    fn render_capture(&mut self) -> Result<(), AudioError> {
        let Some(capture) = self.capture.as_mut() else {
            return Ok(());
        };
        let rate = f64::from(capture.mixer.sample_rate());
        let target = (self.clock.now() * rate).round();
        let rendered = (capture.mixer.now() * rate).round();
        let pending = (target - rendered).max(0.0) as usize;
        if pending == 0 {
            return Ok(());
        }
        capture.scratch.resize(pending, 0.0);
        capture.mixer.render(&mut capture.scratch);
        for &sample in &capture.scratch {
            let value = (sample * f32::from(i16::MAX)) as i16;
            capture
                .writer
                .write_sample(value)
                .map_err(AudioError::Capture)?;
        }
        Ok(())
    }
}

impl AudioOutput for VirtualAudioOutput {
    fn unlock(&mut self) {
        if self.readiness != AudioReadiness::Pending {
            return;
        }
        match self.sample_dir.as_deref() {
            Some(dir) => {
                let bank = SampleBank::load_dir(dir);
                self.install(bank);
            }
            None => self.install(SampleBank::default()),
        }
    }

    fn readiness(&self) -> AudioReadiness {
        self.readiness
    }

    fn current_time(&self) -> f64 {
        self.clock.now()
    }

    fn advance(&mut self, dt: Duration) {
        self.clock.advance(dt);
        if let Err(error) = self.render_capture() {
            warn!(%error, "audio capture stopped");
            self.capture = None;
        }
    }

    fn schedule_tone(&mut self, tone: ToneEvent) {
        if tone.voice == Voice::Piano && self.readiness != AudioReadiness::Ready {
            warn!(frequency = tone.frequency, "piano not ready; tone skipped");
            return;
        }
        if let Some(capture) = self.capture.as_mut() {
            if !capture.mixer.schedule_tone(tone) {
                warn!(frequency = tone.frequency, "tone not rendered; dropped");
                return;
            }
        }
        debug!(
            frequency = tone.frequency,
            start = tone.start_time,
            voice = ?tone.voice,
            "tone scheduled"
        );
        self.history.push(ScheduledSound::Tone(tone));
    }

    fn play_effect(&mut self, effect: SoundEffect) {
        if !self.clock.is_running() {
            return;
        }
        if let Some(capture) = self.capture.as_mut() {
            capture.mixer.play_effect(effect);
        }
        self.history.push(ScheduledSound::Effect {
            effect,
            at: self.clock.now(),
        });
    }

    fn suspend(&mut self) {
        self.clock.suspend();
    }

    fn resume(&mut self) {
        self.clock.resume();
    }

    fn finish(&mut self) -> Result<(), AudioError> {
        if let Some(capture) = self.capture.take() {
            capture.writer.finalize().map_err(AudioError::Capture)?;
        }
        Ok(())
    }
}
