#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Audio-cue tone sequencer driven by the audio device clock.
//!
//! The sequencer reacts to [`Event::CueStarted`] and [`Event::CueStopped`]
//! broadcast by the world and produces a stream of [`ToneEvent`]s whose onsets
//! advance by a fixed inter-onset interval on the device clock. Because each
//! onset is derived from the previous onset rather than from the frame that
//! happened to schedule it, frame jitter never accumulates into the spacing.

mod sampler;

pub use sampler::{
    cents_between, sample_pitch, PitchSample, SHIFTS_ABOVE_MIDPOINT, SHIFTS_BELOW_MIDPOINT,
};

use std::time::Duration;

use prefire_core::{AudioReadiness, Event, Quarter, ToneEvent, Voice};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

const MIN_INTER_ONSET: f64 = 0.03;
const CLOUD_MARKER_HZ: f64 = 440.0;
const CLOUD_MARKER_INTERVAL: f64 = 1.0 / 3.0;
const CLOUD_TONE_RATE: f64 = 15.0;
const CLOUD_TONE_DURATION: f64 = 0.1;
const CLOUD_MIN_OCTAVES: f64 = 0.5;
const CLOUD_OCTAVE_SPREAD: f64 = 2.0;

/// Configuration parameters required to construct the tone sequencer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Length of each cue tone in seconds.
    pub note_duration: f64,
    /// Overlap between consecutive cue tones in seconds.
    pub next_note_lead: f64,
    /// Delay between the cue starting and the first onset, in seconds.
    pub first_onset_delay: f64,
    /// How far ahead of an onset the tone is handed to the audio output, in seconds.
    pub schedule_ahead: f64,
    /// Minimum distance between consecutive cue tones, in cents.
    pub min_cents_apart: f64,
    /// Resampling attempts before a candidate is accepted unconditionally.
    pub resample_attempts: u8,
    /// Seed for the sampler's random source.
    pub rng_seed: u64,
}

impl Config {
    /// Inter-onset interval between cue tones, in seconds.
    #[must_use]
    pub fn inter_onset_interval(&self) -> f64 {
        (self.note_duration - self.next_note_lead).max(MIN_INTER_ONSET)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            note_duration: 0.95,
            next_note_lead: 0.35,
            first_onset_delay: 0.02,
            schedule_ahead: 0.01,
            min_cents_apart: 25.0,
            resample_attempts: 8,
            rng_seed: 0x5eed_70e5_0000_0001,
        }
    }
}

/// Reading of the audio collaborator taken once per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioClock {
    /// Current audio device time in seconds.
    pub now: f64,
    /// Readiness of the audio output.
    pub readiness: AudioReadiness,
}

impl AudioClock {
    /// Creates a clock reading.
    #[must_use]
    pub const fn new(now: f64, readiness: AudioReadiness) -> Self {
        Self { now, readiness }
    }
}

/// Outcome of one non-repeating frequency selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Selection {
    /// Accepted frequency in Hz.
    pub frequency: f64,
    /// Number of samples drawn; exceeds the configured attempts only on fallback.
    pub attempts: u8,
}

#[derive(Clone, Copy, Debug)]
struct ActiveCue {
    quarter: Quarter,
    next_onset: f64,
}

/// Pure system that turns cue lifecycle events into scheduled tone emissions.
#[derive(Debug)]
pub struct ToneSequencer {
    config: Config,
    rng: ChaCha8Rng,
    active: Option<ActiveCue>,
    last_frequency: Option<f64>,
}

impl ToneSequencer {
    /// Creates a new sequencer using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            active: None,
            last_frequency: None,
        }
    }

    /// Quarter of the running cue, if any.
    #[must_use]
    pub fn active_quarter(&self) -> Option<Quarter> {
        self.active.map(|cue| cue.quarter)
    }

    /// Frequency of the last cue tone, cleared whenever the sequence stops.
    #[must_use]
    pub fn last_frequency(&self) -> Option<f64> {
        self.last_frequency
    }

    /// Consumes world events and the audio clock to emit due tone events.
    ///
    /// Must be called every frame, including frames without events, so pending
    /// onsets are handed to the audio output `schedule_ahead` seconds early.
    pub fn handle(&mut self, events: &[Event], clock: AudioClock, out: &mut Vec<ToneEvent>) {
        for event in events {
            match event {
                Event::CueStarted { quarter } => self.start(*quarter, clock, out),
                Event::CueStopped => self.stop(),
                Event::ToneCloudRequested { duration } => {
                    let cloud = tone_cloud(clock.now, *duration, &mut self.rng);
                    debug!(tones = cloud.len(), "tone cloud scheduled");
                    out.extend(cloud);
                }
                _ => {}
            }
        }

        self.emit_due(clock, out);
    }

    /// Picks a frequency at least `min_cents_apart` from the previous tone.
    ///
    /// Falls back to an unconditional draw once the configured attempts are
    /// exhausted so a selection always completes in bounded time.
    pub fn pick_non_repeating(&mut self, quarter: Quarter) -> Selection {
        let mut attempts = 0;
        while attempts < self.config.resample_attempts {
            attempts += 1;
            let candidate = sample_pitch(quarter, &mut self.rng).frequency;
            let distinct = self.last_frequency.map_or(true, |last| {
                cents_between(candidate, last) >= self.config.min_cents_apart
            });
            if distinct {
                self.last_frequency = Some(candidate);
                return Selection {
                    frequency: candidate,
                    attempts,
                };
            }
        }

        let fallback = sample_pitch(quarter, &mut self.rng).frequency;
        self.last_frequency = Some(fallback);
        Selection {
            frequency: fallback,
            attempts: attempts.saturating_add(1),
        }
    }

    fn start(&mut self, quarter: Quarter, clock: AudioClock, out: &mut Vec<ToneEvent>) {
        self.stop();
        if clock.readiness != AudioReadiness::Ready {
            warn!(
                %quarter,
                readiness = ?clock.readiness,
                "audio not ready; cue stays silent"
            );
            return;
        }

        let first_onset = clock.now + self.config.first_onset_delay;
        debug!(%quarter, first_onset, "cue sequence started");
        self.active = Some(ActiveCue {
            quarter,
            next_onset: first_onset,
        });
        self.emit_next(clock, out);
    }

    fn stop(&mut self) {
        if let Some(cue) = self.active.take() {
            debug!(quarter = %cue.quarter, "cue sequence stopped");
        }
        self.last_frequency = None;
    }

    fn emit_due(&mut self, clock: AudioClock, out: &mut Vec<ToneEvent>) {
        while let Some(cue) = self.active {
            if cue.next_onset - self.config.schedule_ahead > clock.now {
                break;
            }
            self.emit_next(clock, out);
        }
    }

    fn emit_next(&mut self, clock: AudioClock, out: &mut Vec<ToneEvent>) {
        let Some(cue) = self.active else {
            return;
        };

        let selection = self.pick_non_repeating(cue.quarter);
        if clock.readiness == AudioReadiness::Ready {
            out.push(ToneEvent {
                frequency: selection.frequency,
                start_time: cue.next_onset,
                duration: self.config.note_duration,
                voice: Voice::Piano,
            });
        } else {
            warn!(
                frequency = selection.frequency,
                "audio not ready; tone skipped"
            );
        }

        self.active = Some(ActiveCue {
            quarter: cue.quarter,
            next_onset: cue.next_onset + self.config.inter_onset_interval(),
        });
    }
}

/// Builds a feedback tone cloud starting at `start` on the audio clock.
///
/// A 440 Hz marker repeats every third of a second while fifteen tones per
/// second scatter between half an octave and two and a half octaves above or
/// below it.
pub fn tone_cloud<R: Rng + ?Sized>(start: f64, duration: Duration, rng: &mut R) -> Vec<ToneEvent> {
    let end = start + duration.as_secs_f64();
    let mut tones = Vec::new();

    let mut onset = start;
    while onset < end {
        tones.push(cloud_tone(CLOUD_MARKER_HZ, onset));
        onset += CLOUD_MARKER_INTERVAL;
    }

    let interval = 1.0 / CLOUD_TONE_RATE;
    let mut onset = start;
    while onset < end {
        let sign = if rng.gen_bool(0.5) { -1.0 } else { 1.0 };
        let octaves = CLOUD_MIN_OCTAVES + rng.gen::<f64>() * CLOUD_OCTAVE_SPREAD;
        let frequency = CLOUD_MARKER_HZ * 2f64.powf(sign * octaves);
        tones.push(cloud_tone(frequency, onset));
        onset += interval;
    }

    tones
}

fn cloud_tone(frequency: f64, start_time: f64) -> ToneEvent {
    ToneEvent {
        frequency,
        start_time,
        duration: CLOUD_TONE_DURATION,
        voice: Voice::Cloud,
    }
}
