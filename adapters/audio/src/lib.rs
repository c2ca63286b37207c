#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Audio output collaborator for Prefire.
//!
//! Outputs accept tone emissions scheduled against their own device clock and
//! ad hoc effects that start immediately. Piano samples load lazily when the
//! output is unlocked by the subject's first key press; until then, and when no
//! sample could be loaded, readiness is reported so the experiment can defer or
//! skip cues without blocking.

mod clock;
#[cfg(feature = "device")]
mod device;
mod mixer;
mod samples;
mod virtual_output;

use std::{path::PathBuf, time::Duration};

use prefire_core::{AudioReadiness, SoundEffect, ToneEvent};
use thiserror::Error;

pub use clock::DeviceClock;
#[cfg(feature = "device")]
pub use device::CpalAudioOutput;
pub use mixer::Mixer;
pub use samples::{sample_file_name, Sample, SampleBank, TunedSample, PIANO_SAMPLE_HZ};
pub use virtual_output::{ScheduledSound, VirtualAudioOutput};

/// Errors raised by audio outputs.
#[derive(Debug, Error)]
pub enum AudioError {
    /// A piano sample could not be read or decoded.
    #[error("failed to load sample {}: {source}", path.display())]
    Sample {
        /// File that failed.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: hound::Error,
    },
    /// Writing the captured mix failed.
    #[error("failed to write audio capture: {0}")]
    Capture(#[source] hound::Error),
    /// The sound device could not be opened.
    #[cfg(feature = "device")]
    #[error("audio device unavailable: {0}")]
    Device(String),
}

/// Sink for everything the experiment wants to be heard.
pub trait AudioOutput {
    /// Starts loading samples; called once on the first key press.
    fn unlock(&mut self);

    /// Current readiness of the piano samples.
    fn readiness(&self) -> AudioReadiness;

    /// Device clock reading in seconds.
    fn current_time(&self) -> f64;

    /// Lets frame-driven outputs advance their clock.
    fn advance(&mut self, dt: Duration);

    /// Schedules a tone at its absolute onset on the device clock.
    fn schedule_tone(&mut self, tone: ToneEvent);

    /// Plays an effect immediately.
    fn play_effect(&mut self, effect: SoundEffect);

    /// Suspends output and freezes the device clock.
    fn suspend(&mut self);

    /// Resumes output.
    fn resume(&mut self);

    /// Flushes any pending output.
    fn finish(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

impl<T: AudioOutput + ?Sized> AudioOutput for Box<T> {
    fn unlock(&mut self) {
        (**self).unlock();
    }

    fn readiness(&self) -> AudioReadiness {
        (**self).readiness()
    }

    fn current_time(&self) -> f64 {
        (**self).current_time()
    }

    fn advance(&mut self, dt: Duration) {
        (**self).advance(dt);
    }

    fn schedule_tone(&mut self, tone: ToneEvent) {
        (**self).schedule_tone(tone);
    }

    fn play_effect(&mut self, effect: SoundEffect) {
        (**self).play_effect(effect);
    }

    fn suspend(&mut self) {
        (**self).suspend();
    }

    fn resume(&mut self) {
        (**self).resume();
    }

    fn finish(&mut self) -> Result<(), AudioError> {
        (**self).finish()
    }
}
