//! Piano sample discovery and closest-sample tuning.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use hound::{SampleFormat, WavReader};
use tracing::{info, warn};

use crate::AudioError;

/// Base frequencies of the piano samples, one chromatic octave from C4.
pub const PIANO_SAMPLE_HZ: [f64; 12] = [
    261.63, 277.18, 293.66, 311.13, 329.63, 349.23, 369.99, 392.00, 415.30, 440.00, 466.16, 493.88,
];

/// File name of the sample recorded at `base_hz`.
#[must_use]
pub fn sample_file_name(base_hz: f64) -> String {
    format!("{base_hz:.2}.wav")
}

/// Decoded mono sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Pitch the sample was recorded at.
    pub base_hz: f64,
    /// Sample rate of the decoded frames.
    pub sample_rate: u32,
    /// Mono frames in `[-1, 1]`.
    pub frames: Arc<[f32]>,
}

/// Sample chosen for a target frequency, with its playback rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TunedSample<'a> {
    /// Sample to play.
    pub sample: &'a Sample,
    /// Target folded into the octave range covered by the bank.
    pub tuned_hz: f64,
    /// Playback rate, `tuned_hz / base_hz`.
    pub rate: f64,
}

/// Set of decoded piano samples ordered by base frequency.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleBank {
    samples: Vec<Sample>,
}

impl SampleBank {
    /// Builds a bank from already decoded samples.
    #[must_use]
    pub fn from_samples(mut samples: Vec<Sample>) -> Self {
        samples.retain(|sample| is_playable_pitch(sample.base_hz));
        samples.sort_by(|a, b| a.base_hz.total_cmp(&b.base_hz));
        Self { samples }
    }

    /// Loads every known piano sample from `dir`, skipping files that fail.
    pub fn load_dir(dir: &Path) -> Self {
        let mut samples = Vec::with_capacity(PIANO_SAMPLE_HZ.len());
        for base_hz in PIANO_SAMPLE_HZ {
            let path = dir.join(sample_file_name(base_hz));
            match decode(&path) {
                Ok((sample_rate, frames)) => samples.push(Sample {
                    base_hz,
                    sample_rate,
                    frames: frames.into(),
                }),
                Err(error) => warn!(%error, "piano sample failed to load"),
            }
        }
        info!(
            loaded = samples.len(),
            expected = PIANO_SAMPLE_HZ.len(),
            dir = %dir.display(),
            "piano samples loaded"
        );
        Self::from_samples(samples)
    }

    /// Number of loaded samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Reports whether no sample loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Picks the sample closest to `target_hz` in log-frequency distance.
    ///
    /// The target is first folded by octaves into `[lowest, 2 * highest)` so
    /// out-of-range cue pitches reuse the nearest recorded timbre.
    #[must_use]
    pub fn closest(&self, target_hz: f64) -> Option<TunedSample<'_>> {
        if !is_playable_pitch(target_hz) {
            return None;
        }
        let lowest = self.samples.first()?.base_hz;
        let highest = self.samples.last()?.base_hz;

        let mut tuned_hz = target_hz;
        while tuned_hz < lowest {
            tuned_hz *= 2.0;
        }
        while tuned_hz >= highest * 2.0 {
            tuned_hz /= 2.0;
        }

        let distance = |sample: &Sample| (tuned_hz / sample.base_hz).log2().abs();
        let sample = self
            .samples
            .iter()
            .min_by(|a, b| distance(a).total_cmp(&distance(b)))?;
        Some(TunedSample {
            sample,
            tuned_hz,
            rate: tuned_hz / sample.base_hz,
        })
    }
}

fn is_playable_pitch(hz: f64) -> bool {
    hz.is_finite() && hz > 0.0
}

fn decode(path: &Path) -> Result<(u32, Vec<f32>), AudioError> {
    let wrap = |source| AudioError::Sample {
        path: PathBuf::from(path),
        source,
    };
    let mut reader = WavReader::open(path).map_err(wrap)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(wrap)?,
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << spec.bits_per_sample.saturating_sub(1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(wrap)?
        }
    };

    let frames = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok((spec.sample_rate, frames))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank_of(bases: &[f64]) -> SampleBank {
        SampleBank::from_samples(
            bases
                .iter()
                .map(|&base_hz| Sample {
                    base_hz,
                    sample_rate: 8000,
                    frames: vec![0.0; 8].into(),
                })
                .collect(),
        )
    }

    #[test]
    fn file_names_use_two_decimals() {
        assert_eq!(sample_file_name(261.63), "261.63.wav");
        assert_eq!(sample_file_name(392.0), "392.00.wav");
    }

    #[test]
    fn exact_base_plays_at_unit_rate() {
        let bank = bank_of(&PIANO_SAMPLE_HZ);
        let tuned = bank.closest(440.0).expect("sample chosen");
        assert_eq!(tuned.sample.base_hz, 440.0);
        assert!((tuned.rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn low_targets_fold_up_by_octaves() {
        let bank = bank_of(&PIANO_SAMPLE_HZ);
        let tuned = bank.closest(55.0).expect("sample chosen");
        assert!((tuned.tuned_hz - 440.0).abs() < 1e-9);
        assert_eq!(tuned.sample.base_hz, 440.0);
    }

    #[test]
    fn high_targets_fold_below_twice_the_top_sample() {
        let bank = bank_of(&PIANO_SAMPLE_HZ);
        let tuned = bank.closest(4000.0).expect("sample chosen");
        assert!(tuned.tuned_hz < 493.88 * 2.0);
        assert!((tuned.tuned_hz - 500.0).abs() < 1e-9);
        assert_eq!(tuned.sample.base_hz, 493.88);
        assert!((tuned.rate - 500.0 / 493.88).abs() < 1e-12);
    }

    #[test]
    fn sparse_bank_picks_nearest_in_log_space() {
        let bank = bank_of(&[261.63, 392.0]);
        let tuned = bank.closest(320.0).expect("sample chosen");
        assert_eq!(tuned.sample.base_hz, 261.63);
        let tuned = bank.closest(330.0).expect("sample chosen");
        assert_eq!(tuned.sample.base_hz, 392.0);
    }

    #[test]
    fn empty_bank_and_bad_targets_choose_nothing() {
        assert!(SampleBank::default().closest(440.0).is_none());
        let bank = bank_of(&PIANO_SAMPLE_HZ);
        assert!(bank.closest(0.0).is_none());
        assert!(bank.closest(f64::NAN).is_none());
    }
}
