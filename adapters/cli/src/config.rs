//! TOML configuration for the experiment binary.
//!
//! Every key is optional; omitted keys take the values the experiment was
//! calibrated with. Unknown keys are rejected so typos do not silently fall
//! back to defaults.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use prefire_core::DifficultyTier;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid configuration TOML.
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// A value is outside its accepted range.
    #[error("invalid config value `{key}`: {reason}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// `[experiment]` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentSection {
    /// Trials in one round.
    pub trials_per_round: u32,
    /// Rounds in one session.
    pub rounds: u32,
    /// Masking noise before the cue, in milliseconds.
    pub pre_cue_ms: u64,
    /// Cue phase length, in milliseconds.
    pub cue_window_ms: u64,
    /// Delay before the tone cloud, in milliseconds.
    pub feedback_delay_ms: u64,
    /// Tone cloud length, in milliseconds.
    pub tone_cloud_ms: u64,
    /// Silence after the tone cloud, in milliseconds.
    pub post_cloud_ms: u64,
    /// Longest wait for piano samples, in milliseconds.
    pub audio_ready_timeout_ms: u64,
    /// Readiness polling interval, in milliseconds.
    pub audio_poll_interval_ms: u64,
    /// Difficulty tier.
    pub difficulty: u8,
    /// Seed for quarter selection and cue sampling.
    pub seed: Option<u64>,
}

impl Default for ExperimentSection {
    fn default() -> Self {
        Self {
            trials_per_round: 50,
            rounds: 4,
            pre_cue_ms: 2000,
            cue_window_ms: 4000,
            feedback_delay_ms: 1000,
            tone_cloud_ms: 2000,
            post_cloud_ms: 1000,
            audio_ready_timeout_ms: 20_000,
            audio_poll_interval_ms: 25,
            difficulty: DifficultyTier::EXPERIMENT.get(),
            seed: None,
        }
    }
}

/// `[tones]` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TonesSection {
    /// Cue tone length in seconds.
    pub note_duration: f64,
    /// Overlap with the next cue tone in seconds.
    pub next_note_lead: f64,
    /// Delay of the first onset after the cue starts, in seconds.
    pub first_onset_delay: f64,
    /// Scheduling lead on the audio clock, in seconds.
    pub schedule_ahead: f64,
    /// Minimum distance between consecutive tones, in cents.
    pub min_cents_apart: f64,
    /// Resampling attempts before the fallback draw.
    pub resample_attempts: u8,
}

impl Default for TonesSection {
    fn default() -> Self {
        let defaults = prefire_system_tone_sequencer::Config::default();
        Self {
            note_duration: defaults.note_duration,
            next_note_lead: defaults.next_note_lead,
            first_onset_delay: defaults.first_onset_delay,
            schedule_ahead: defaults.schedule_ahead,
            min_cents_apart: defaults.min_cents_apart,
            resample_attempts: defaults.resample_attempts,
        }
    }
}

/// `[window]` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSection {
    /// Window title.
    pub title: String,
    /// Initial width in pixels.
    pub width: u32,
    /// Initial height in pixels.
    pub height: u32,
    /// Synchronise frames with the display refresh rate.
    pub vsync: bool,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: "Prefire".to_owned(),
            width: 1200,
            height: 900,
            vsync: true,
        }
    }
}

/// Whole configuration document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Session and timing parameters.
    pub experiment: ExperimentSection,
    /// Cue tone parameters.
    pub tones: TonesSection,
    /// Window parameters.
    pub window: WindowSection,
}

impl AppConfig {
    /// Loads `path`, or defaults when no path is given or the file is missing.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using defaults"
                );
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_owned(),
                    source,
                })
            }
        };
        let config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration document.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Rejects values the experiment cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let experiment = &self.experiment;
        if experiment.trials_per_round == 0 {
            return Err(ConfigError::Invalid {
                key: "experiment.trials_per_round",
                reason: "must be at least 1",
            });
        }
        if experiment.rounds == 0 {
            return Err(ConfigError::Invalid {
                key: "experiment.rounds",
                reason: "must be at least 1",
            });
        }
        if experiment.audio_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "experiment.audio_poll_interval_ms",
                reason: "must be at least 1",
            });
        }
        if self.tones.note_duration.is_nan() || self.tones.note_duration <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "tones.note_duration",
                reason: "must be positive",
            });
        }
        Ok(())
    }

    /// Replaces the configured seed.
    pub fn override_seed(&mut self, seed: u64) {
        self.experiment.seed = Some(seed);
    }

    /// World configuration derived from the `[experiment]` table.
    #[must_use]
    pub fn world_config(&self) -> prefire_world::Config {
        let experiment = &self.experiment;
        let defaults = prefire_world::Config::default();
        prefire_world::Config {
            trials_per_round: experiment.trials_per_round,
            rounds: experiment.rounds,
            pre_cue: Duration::from_millis(experiment.pre_cue_ms),
            cue_window: Duration::from_millis(experiment.cue_window_ms),
            feedback_delay: Duration::from_millis(experiment.feedback_delay_ms),
            tone_cloud: Duration::from_millis(experiment.tone_cloud_ms),
            post_cloud: Duration::from_millis(experiment.post_cloud_ms),
            audio_ready_timeout: Duration::from_millis(experiment.audio_ready_timeout_ms),
            audio_poll_interval: Duration::from_millis(experiment.audio_poll_interval_ms),
            difficulty: DifficultyTier::new(experiment.difficulty),
            rng_seed: experiment.seed.unwrap_or(defaults.rng_seed),
            playfield: defaults.playfield,
        }
    }

    /// Tone sequencer configuration derived from the `[tones]` table.
    #[must_use]
    pub fn sequencer_config(&self) -> prefire_system_tone_sequencer::Config {
        let tones = &self.tones;
        let defaults = prefire_system_tone_sequencer::Config::default();
        let base_seed = defaults.rng_seed;
        prefire_system_tone_sequencer::Config {
            note_duration: tones.note_duration,
            next_note_lead: tones.next_note_lead,
            first_onset_delay: tones.first_onset_delay,
            schedule_ahead: tones.schedule_ahead,
            min_cents_apart: tones.min_cents_apart,
            resample_attempts: tones.resample_attempts,
            rng_seed: self
                .experiment
                .seed
                .map_or(base_seed, |seed| seed.rotate_left(17) ^ base_seed),
        }
    }
}
