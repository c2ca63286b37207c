#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Prefire experiment engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing subject input and elapsed time, the world executes those commands
//! via its `apply` entry point, and then broadcasts [`Event`] values for systems
//! to react to deterministically. Systems consume event streams and respond
//! with their own outputs (tone emissions, persistence writes) without ever
//! mutating the world directly.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Prefire.";

/// Number of discrete quarters a trial may target.
pub const QUARTER_COUNT: usize = 4;

/// Number of columns the playfield is divided into.
pub const PLAYFIELD_COLUMNS: u32 = 12;

const QUARTER_PITCH_RANGES: [PitchRange; QUARTER_COUNT] = [
    PitchRange::new(427.65, 508.57, 466.16),
    PitchRange::new(359.61, 427.65, 392.00),
    PitchRange::new(302.40, 359.61, 329.63),
    PitchRange::new(254.29, 302.40, 277.18),
];

const QUARTER_SPAWN_COLUMNS: [u32; QUARTER_COUNT] = [1, 4, 7, 10];

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the experiment clock by the provided delta time.
    Tick {
        /// Duration of wall time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Moves the player onto the provided quarter.
    SelectQuarter {
        /// Quarter the player selected.
        quarter: Quarter,
    },
    /// Fires from the player's current quarter.
    Fire,
    /// Debug action that increments the streak by one.
    IncrementStreak,
    /// Toggles the pause state.
    TogglePause,
    /// Resumes the experiment if it is paused; otherwise ignored.
    Resume,
    /// Starts a fresh session after the experiment was exited.
    Restart,
    /// Acknowledges the summary shown at a round boundary or session end.
    Continue,
    /// Leaves the experiment, committing best statistics.
    Exit,
    /// Reports the readiness of the audio collaborator.
    SetAudioReadiness {
        /// Latest readiness reported by the audio output.
        readiness: AudioReadiness,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the experiment clock advanced.
    TimeAdvanced {
        /// Duration of time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the state machine entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: Phase,
    },
    /// Announces that a new trial opened.
    TrialStarted {
        /// Identifier allocated to the trial.
        trial: TrialId,
        /// Quarter the adversary will appear in.
        quarter: Quarter,
    },
    /// Requests an ad hoc sound effect from the audio collaborator.
    SoundRequested {
        /// Effect that should be played immediately.
        effect: SoundEffect,
    },
    /// Requests that the tone sequence for the quarter start.
    CueStarted {
        /// Quarter whose pitch range drives the cue.
        quarter: Quarter,
    },
    /// Requests that any running tone sequence stop.
    CueStopped,
    /// Confirms the player moved onto a quarter.
    PlayerQuarterSelected {
        /// Quarter the player now occupies.
        quarter: Quarter,
    },
    /// Reports the outcome of a pre-fire during the cue phase.
    PrefireEvaluated {
        /// Trial the pre-fire belonged to.
        trial: TrialId,
        /// Quarter the player fired from.
        player: Quarter,
        /// Whether the pre-fire predicted the adversary's quarter.
        correct: bool,
    },
    /// Reports that the cue window elapsed without a correct pre-fire.
    CueWindowMissed {
        /// Trial whose window elapsed.
        trial: TrialId,
    },
    /// Confirms that the adversary entered the playfield.
    AdversarySpawned {
        /// Quarter the adversary descends in.
        quarter: Quarter,
    },
    /// Confirms that a three-wide shot burst was launched.
    ShotsFired {
        /// Quarter the burst is centred on.
        quarter: Quarter,
    },
    /// Reports that a shot destroyed the adversary.
    AdversaryDestroyed {
        /// Points awarded for the kill.
        points: u64,
    },
    /// Reports that the adversary reached the threshold line.
    AdversaryReachedThreshold,
    /// Requests a feedback tone cloud starting now.
    ToneCloudRequested {
        /// Length of the cloud.
        duration: Duration,
    },
    /// Reports the streak after any change.
    StreakChanged {
        /// Current consecutive correct predictions.
        streak: u32,
        /// Highest streak observed so far.
        best_streak: u32,
    },
    /// Reports the internal score after any change.
    ScoreChanged {
        /// Total points accumulated in the session.
        score: u64,
    },
    /// Confirms that a trial outcome was folded into the session.
    TrialResolved {
        /// Trial that resolved.
        trial: TrialId,
        /// Whether the trial counted as a correct pre-fire.
        hit: bool,
        /// Trials completed in the session after folding.
        total_trials: u32,
        /// Correct pre-fires in the session after folding.
        correct_prefires: u32,
    },
    /// Reports that an unresolved trial was discarded without being counted.
    TrialAbandoned {
        /// Trial that was discarded.
        trial: TrialId,
    },
    /// Presents the summary of a completed round.
    RoundCompleted {
        /// Summary payload for the round menu.
        summary: Summary,
    },
    /// Confirms that the next round began.
    RoundAdvanced {
        /// Zero-based index of the new round.
        round_index: u32,
    },
    /// Presents the final summary of the session.
    SessionCompleted {
        /// Summary payload for the final menu.
        summary: Summary,
    },
    /// Reports a pause state change.
    PauseChanged {
        /// Whether the experiment is now paused.
        paused: bool,
    },
    /// Requests that the audio output suspend.
    AudioSuspended,
    /// Requests that the audio output resume.
    AudioResumed,
    /// Requests that the best statistics be persisted if they improve on stored values.
    BestStatsCommitted {
        /// Statistics to commit.
        stats: BestStats,
    },
    /// Confirms that the experiment was exited.
    Exited,
    /// Confirms that a fresh session began.
    SessionRestarted,
}

/// Logical actions delivered by the input collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicalAction {
    /// Selects one of the four quarters.
    SelectQuarter(Quarter),
    /// Fires from the current quarter.
    Fire,
    /// Debug streak increment.
    DebugStreakIncrement,
    /// Toggles the pause state.
    TogglePause,
    /// Restarts after exit.
    Restart,
}

impl From<LogicalAction> for Command {
    fn from(action: LogicalAction) -> Self {
        match action {
            LogicalAction::SelectQuarter(quarter) => Command::SelectQuarter { quarter },
            LogicalAction::Fire => Command::Fire,
            LogicalAction::DebugStreakIncrement => Command::IncrementStreak,
            LogicalAction::TogglePause => Command::TogglePause,
            LogicalAction::Restart => Command::Restart,
        }
    }
}

/// Phase of the trial state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No trial is open.
    Idle,
    /// Masking noise plays before the cue.
    PreCueNoise,
    /// The cue tone sequence plays and a pre-fire is possible.
    WithinCuePhase,
    /// The adversary descends toward the threshold line.
    ReactionWindow,
    /// The trial outcome is fixed and feedback drains before resolution.
    Resolving,
    /// A round completed and the summary awaits acknowledgement.
    RoundBoundary,
    /// The session completed and only exit is accepted.
    SessionDone,
    /// The experiment was exited.
    Exited,
}

impl Phase {
    /// Reports whether the phase belongs to an open trial.
    #[must_use]
    pub const fn has_open_trial(self) -> bool {
        matches!(
            self,
            Self::PreCueNoise | Self::WithinCuePhase | Self::ReactionWindow | Self::Resolving
        )
    }

    /// Reports whether the phase halts scheduling until an external action arrives.
    #[must_use]
    pub const fn is_halted(self) -> bool {
        matches!(self, Self::RoundBoundary | Self::SessionDone | Self::Exited)
    }
}

/// One of the four discrete spatial zones a trial may target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quarter(u8);

impl Quarter {
    /// All quarters in index order.
    pub const ALL: [Quarter; QUARTER_COUNT] = [Quarter(0), Quarter(1), Quarter(2), Quarter(3)];

    /// Creates a quarter from a zero-based index, rejecting indices above 3.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < QUARTER_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Zero-based index of the quarter.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Pitch range descriptor bound to the quarter.
    #[must_use]
    pub const fn pitch_range(self) -> PitchRange {
        QUARTER_PITCH_RANGES[self.0 as usize]
    }

    /// Middle playfield column of the quarter, where the adversary spawns.
    #[must_use]
    pub const fn spawn_column(self) -> u32 {
        QUARTER_SPAWN_COLUMNS[self.0 as usize]
    }

    /// Label shared by quarters of the same pitch half.
    #[must_use]
    pub const fn group_label(self) -> u8 {
        self.0 / 2
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0 + 1)
    }
}

/// Pitch range descriptor in Hz.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PitchRange {
    min: f64,
    max: f64,
    peak: f64,
}

impl PitchRange {
    /// Creates a new pitch range descriptor.
    #[must_use]
    pub const fn new(min: f64, max: f64, peak: f64) -> Self {
        Self { min, max, peak }
    }

    /// Lower bound of the range.
    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound of the range.
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Centre of the sampling distribution.
    #[must_use]
    pub const fn peak(&self) -> f64 {
        self.peak
    }

    /// Arithmetic midpoint between the bounds.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Reports whether the frequency lies inside the closed range.
    #[must_use]
    pub fn contains(&self, frequency: f64) -> bool {
        (self.min..=self.max).contains(&frequency)
    }
}

/// Difficulty tier controlling whether pre-fires accept grouped quarters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DifficultyTier(u8);

impl DifficultyTier {
    /// Tier the experiment runs at; grouping is disabled.
    pub const EXPERIMENT: DifficultyTier = DifficultyTier(7);

    /// Creates a tier wrapper.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric tier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Reports whether the quarter is grouped with its pitch-half neighbour at this tier.
    #[must_use]
    pub const fn groups_quarter(self, quarter: Quarter) -> bool {
        if self.0 < 4 {
            true
        } else if self.0 < 6 {
            quarter.index() == 1 || quarter.index() == 3
        } else {
            false
        }
    }

    /// Reports whether a pre-fire from `player` counts against the `target` quarter.
    #[must_use]
    pub const fn prefire_matches(self, target: Quarter, player: Quarter) -> bool {
        if self.groups_quarter(target) {
            target.group_label() == player.group_label()
        } else {
            target.index() == player.index()
        }
    }
}

/// Unique identifier assigned to a trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrialId(u64);

impl TrialId {
    /// Creates a new trial identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Readiness reported by the audio collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioReadiness {
    /// Samples are still loading.
    Pending,
    /// Samples are loaded and tones can play.
    Ready,
    /// No sample could be loaded; cues stay silent.
    Unavailable,
}

/// Tone voices the audio collaborator knows how to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Voice {
    /// Sampled piano used for the cue sequence.
    Piano,
    /// Square oscillator used for the feedback tone cloud.
    Cloud,
}

/// Tone emission request scheduled against the audio device clock.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToneEvent {
    /// Frequency of the tone in Hz.
    pub frequency: f64,
    /// Onset on the audio device clock, in seconds.
    pub start_time: f64,
    /// Length of the tone in seconds.
    pub duration: f64,
    /// Voice rendering the tone.
    pub voice: Voice,
}

/// Ad hoc sound effects requested by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Masking noise burst played before the cue.
    MaskingNoise {
        /// Length of the burst.
        duration: Duration,
    },
    /// Confirmation played after a correct pre-fire.
    Pew,
    /// Played when a shot burst launches.
    Laser,
}

/// Summary payload presented at a round boundary or session end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Heading shown above the summary.
    pub title: String,
    /// Correct pre-fires so far.
    pub correct: u32,
    /// Trials completed so far.
    pub total: u32,
    /// Accuracy as a percentage.
    pub accuracy_pct: f64,
    /// Current streak.
    pub streak: u32,
    /// Best streak.
    pub best_streak: u32,
    /// Whether this is the final summary of the session.
    pub is_final: bool,
}

/// State captured when a pause begins and consumed once on resume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PauseSnapshot {
    /// Whether the trial was in the cue phase with no adversary spawned.
    pub within_cue_phase: bool,
    /// Quarter of the open trial, if any.
    pub quarter: Option<Quarter>,
    /// Whether a trial was pending with no adversary spawned.
    pub had_reaction_waiting: bool,
}

/// Best statistics persisted per user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BestStats {
    /// Best accuracy percentage.
    pub accuracy: f64,
    /// Best streak.
    pub best_streak: u32,
}

#[cfg(test)]
mod tests {
    use super::{BestStats, DifficultyTier, Quarter, Summary};

    #[test]
    fn quarter_rejects_out_of_range_index() {
        assert!(Quarter::new(3).is_some());
        assert!(Quarter::new(4).is_none());
    }

    #[test]
    fn pitch_ranges_contain_their_peaks() {
        for quarter in Quarter::ALL {
            let range = quarter.pitch_range();
            assert!(range.contains(range.peak()), "{quarter} peak outside range");
            assert!(range.min() < range.max());
        }
    }

    #[test]
    fn adjacent_quarters_share_range_edges() {
        for pair in Quarter::ALL.windows(2) {
            let upper = pair[0].pitch_range();
            let lower = pair[1].pitch_range();
            assert!((upper.min() - lower.max()).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn spawn_columns_sit_in_quarter_middles() {
        let columns: Vec<u32> = Quarter::ALL.iter().map(|q| q.spawn_column()).collect();
        assert_eq!(columns, vec![1, 4, 7, 10]);
    }

    #[test]
    fn experiment_tier_requires_exact_match() {
        let tier = DifficultyTier::EXPERIMENT;
        for target in Quarter::ALL {
            assert!(!tier.groups_quarter(target));
            for player in Quarter::ALL {
                assert_eq!(tier.prefire_matches(target, player), target == player);
            }
        }
    }

    #[test]
    fn low_tiers_group_pitch_halves() {
        let tier = DifficultyTier::new(2);
        let q = |i| Quarter::new(i).expect("valid quarter");
        assert!(tier.prefire_matches(q(0), q(1)));
        assert!(tier.prefire_matches(q(3), q(2)));
        assert!(!tier.prefire_matches(q(1), q(2)));

        let middle = DifficultyTier::new(5);
        assert!(middle.groups_quarter(q(1)));
        assert!(!middle.groups_quarter(q(0)));
        assert!(!middle.prefire_matches(q(0), q(1)));
    }

    #[test]
    fn summary_round_trips_through_bincode() {
        let summary = Summary {
            title: "Round 1 Complete".to_owned(),
            correct: 12,
            total: 50,
            accuracy_pct: 24.0,
            streak: 2,
            best_streak: 5,
            is_final: false,
        };
        let bytes = bincode::serialize(&summary).expect("serialize");
        let restored: Summary = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, summary);

        let stats = BestStats {
            accuracy: 61.5,
            best_streak: 9,
        };
        let bytes = bincode::serialize(&stats).expect("serialize");
        let restored: BestStats = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, stats);
    }
}
