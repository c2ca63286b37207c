//! Offline mono mixer rendering scheduled tones and effects into frames.

use std::sync::Arc;

use prefire_core::{SoundEffect, ToneEvent, Voice};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use crate::samples::SampleBank;

const PIANO_ATTACK: f64 = 0.006;
const PIANO_DECAY: f64 = 0.08;
const PIANO_RELEASE: f64 = 0.10;
const PIANO_PEAK: f32 = 1.15;
const PIANO_SUSTAIN: f32 = 0.80;
const PIANO_TAIL: f64 = 0.02;
const CLOUD_ATTACK: f64 = 0.005;
const CLOUD_PEAK: f32 = 0.15;
const MASKING_GAIN: f32 = 0.002;
const LASER: (f64, f32) = (0.1, 0.3);
const PEW: (f64, f32) = (0.3, 0.25);
const DECAY_FLOOR: f64 = 0.001;
const NOISE_SEED: u64 = 0x6e6f_6973_6500_0001;

#[derive(Clone, Debug)]
enum Source {
    Sample {
        frames: Arc<[f32]>,
        sample_rate: u32,
        rate: f64,
    },
    Square { frequency: f64 },
    Noise { gain: f32 },
}

#[derive(Clone, Copy, Debug)]
enum Envelope {
    Piano { duration: f64 },
    Cloud { duration: f64 },
    Flat,
    Decay { duration: f64 },
}

impl Envelope {
    fn gain(self, t: f64) -> f32 {
        match self {
            Self::Piano { duration } => piano_gain(t, duration),
            Self::Cloud { duration } => {
                if t < CLOUD_ATTACK {
                    CLOUD_PEAK * (t / CLOUD_ATTACK) as f32
                } else {
                    let remaining = (duration - t) / (duration - CLOUD_ATTACK).max(f64::EPSILON);
                    CLOUD_PEAK * remaining.clamp(0.0, 1.0) as f32
                }
            }
            Self::Flat => 1.0,
            Self::Decay { duration } => DECAY_FLOOR.powf(t / duration) as f32,
        }
    }
}

fn piano_gain(t: f64, duration: f64) -> f32 {
    let sustain_end = (PIANO_ATTACK + PIANO_DECAY + 0.02).max(duration - PIANO_RELEASE);
    if t < PIANO_ATTACK {
        PIANO_PEAK * (t / PIANO_ATTACK) as f32
    } else if t < PIANO_ATTACK + PIANO_DECAY {
        let progress = ((t - PIANO_ATTACK) / PIANO_DECAY) as f32;
        PIANO_PEAK + (PIANO_SUSTAIN - PIANO_PEAK) * progress
    } else if t < sustain_end {
        PIANO_SUSTAIN
    } else if t < duration {
        let progress = ((t - sustain_end) / (duration - sustain_end).max(f64::EPSILON)) as f32;
        PIANO_SUSTAIN * (1.0 - progress)
    } else {
        0.0
    }
}

#[derive(Clone, Debug)]
struct ActiveVoice {
    start_frame: u64,
    frames: u64,
    source: Source,
    envelope: Envelope,
}

/// Renders scheduled voices at a fixed sample rate.
///
/// The mixer keeps its own frame counter; [`Mixer::now`] is the device time of
/// the next frame to be rendered.
#[derive(Debug)]
pub struct Mixer {
    sample_rate: u32,
    frame: u64,
    voices: Vec<ActiveVoice>,
    bank: Option<Arc<SampleBank>>,
    rng: ChaCha8Rng,
}

impl Mixer {
    /// Creates a silent mixer at `sample_rate`.
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            frame: 0,
            voices: Vec::new(),
            bank: None,
            rng: ChaCha8Rng::seed_from_u64(NOISE_SEED),
        }
    }

    /// Output sample rate.
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Device time of the next rendered frame, in seconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.frame as f64 / f64::from(self.sample_rate)
    }

    /// Number of voices still sounding or pending.
    #[must_use]
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Installs the piano sample bank.
    pub fn set_bank(&mut self, bank: Arc<SampleBank>) {
        self.bank = Some(bank);
    }

    /// Schedules a tone; returns `false` when a piano tone has no sample to play.
    pub fn schedule_tone(&mut self, tone: ToneEvent) -> bool {
        let source = match tone.voice {
            Voice::Piano => {
                let Some(tuned) = self.bank.as_ref().and_then(|bank| {
                    bank.closest(tone.frequency).map(|tuned| Source::Sample {
                        frames: Arc::clone(&tuned.sample.frames),
                        sample_rate: tuned.sample.sample_rate,
                        rate: tuned.rate,
                    })
                }) else {
                    warn!(frequency = tone.frequency, "no piano sample; tone skipped");
                    return false;
                };
                tuned
            }
            Voice::Cloud => Source::Square {
                frequency: tone.frequency,
            },
        };
        let (envelope, length) = match tone.voice {
            Voice::Piano => (
                Envelope::Piano {
                    duration: tone.duration,
                },
                tone.duration + PIANO_TAIL,
            ),
            Voice::Cloud => (
                Envelope::Cloud {
                    duration: tone.duration,
                },
                tone.duration,
            ),
        };
        self.push_voice(tone.start_time, length, source, envelope);
        true
    }

    /// Starts an effect at the current device time.
    pub fn play_effect(&mut self, effect: SoundEffect) {
        let now = self.now();
        match effect {
            SoundEffect::MaskingNoise { duration } => self.push_voice(
                now,
                duration.as_secs_f64(),
                Source::Noise { gain: MASKING_GAIN },
                Envelope::Flat,
            ),
            SoundEffect::Laser => self.push_decay(now, LASER),
            SoundEffect::Pew => self.push_decay(now, PEW),
        }
    }

    fn push_decay(&mut self, now: f64, (duration, gain): (f64, f32)) {
        let envelope = Envelope::Decay { duration };
        self.push_voice(now, duration, Source::Noise { gain }, envelope);
    }

    fn push_voice(&mut self, start: f64, length: f64, source: Source, envelope: Envelope) {
        let rate = f64::from(self.sample_rate);
        let start_frame = (start.max(0.0) * rate).round() as u64;
        let frames = (length.max(0.0) * rate).round() as u64;
        self.voices.push(ActiveVoice {
            start_frame: start_frame.max(self.frame),
            frames,
            source,
            envelope,
        });
    }

    /// Renders the next `out.len()` frames and advances the device time.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let rate = f64::from(self.sample_rate);
        let first = self.frame;

        for voice in &self.voices {
            let end = voice.start_frame + voice.frames;
            for (offset, slot) in out.iter_mut().enumerate() {
                let frame = first + offset as u64;
                if frame < voice.start_frame || frame >= end {
                    continue;
                }
                let t = (frame - voice.start_frame) as f64 / rate;
                let value = match &voice.source {
                    Source::Sample {
                        frames,
                        sample_rate,
                        rate: playback,
                    } => read_sample(frames, t * playback * f64::from(*sample_rate)),
                    Source::Square { frequency } => {
                        if (t * frequency).fract() < 0.5 {
                            1.0
                        } else {
                            -1.0
                        }
                    }
                    Source::Noise { gain } => self.rng.gen_range(-1.0f32..1.0) * gain,
                };
                *slot += value * voice.envelope.gain(t);
            }
        }

        for slot in out.iter_mut() {
            *slot = slot.clamp(-1.0, 1.0);
        }
        self.frame = first + out.len() as u64;
        let now = self.frame;
        self.voices
            .retain(|voice| voice.start_frame + voice.frames > now);
    }

    /// Drops every pending voice.
    pub fn silence(&mut self) {
        self.voices.clear();
    }
}

fn read_sample(frames: &[f32], position: f64) -> f32 {
    let index = position.floor();
    if index < 0.0 {
        return 0.0;
    }
    let index = index as usize;
    let Some(&current) = frames.get(index) else {
        return 0.0;
    };
    let next = frames.get(index + 1).copied().unwrap_or(0.0);
    let fraction = (position - position.floor()) as f32;
    current + (next - current) * fraction
}
