//! Trial, round and session bookkeeping.

use prefire_core::Summary;

/// Position of the session reached after folding a trial outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Progress {
    /// More trials remain in the current round.
    Continue,
    /// The current round filled up.
    RoundComplete,
    /// Every trial of the session completed.
    SessionComplete,
}

/// Read-only view of the session counters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSnapshot {
    /// Zero-based index of the current round.
    pub round_index: u32,
    /// Trials completed in the current round.
    pub trial_in_round: u32,
    /// Trials completed in the session.
    pub total_trials: u32,
    /// Correct pre-fires in the session.
    pub correct_prefires: u32,
    /// Session accuracy as a percentage.
    pub accuracy_pct: f64,
    /// Best accuracy observed across sessions.
    pub best_accuracy: f64,
}

#[derive(Clone, Debug)]
pub(crate) struct Session {
    trials_per_round: u32,
    rounds: u32,
    round_index: u32,
    trial_in_round: u32,
    total_trials: u32,
    correct_prefires: u32,
    best_accuracy: f64,
}

impl Session {
    pub(crate) fn new(trials_per_round: u32, rounds: u32, best_accuracy: f64) -> Self {
        Self {
            trials_per_round: trials_per_round.max(1),
            rounds: rounds.max(1),
            round_index: 0,
            trial_in_round: 0,
            total_trials: 0,
            correct_prefires: 0,
            best_accuracy,
        }
    }

    /// Starts a fresh session while keeping the cross-session best accuracy.
    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.trials_per_round, self.rounds, self.best_accuracy);
    }

    pub(crate) fn total_trials(&self) -> u32 {
        self.total_trials
    }

    pub(crate) fn correct_prefires(&self) -> u32 {
        self.correct_prefires
    }

    pub(crate) fn best_accuracy(&self) -> f64 {
        self.best_accuracy
    }

    /// Accuracy as a percentage; zero before any trial completes.
    pub(crate) fn accuracy_pct(&self) -> f64 {
        if self.total_trials == 0 {
            0.0
        } else {
            f64::from(self.correct_prefires) / f64::from(self.total_trials) * 100.0
        }
    }

    /// Folds one resolved trial into the counters.
    ///
    /// Session completion takes precedence over round completion when both
    /// boundaries are reached by the same trial.
    pub(crate) fn record(&mut self, hit: bool) -> Progress {
        self.total_trials = self.total_trials.saturating_add(1);
        self.trial_in_round = self.trial_in_round.saturating_add(1);
        if hit {
            self.correct_prefires = self.correct_prefires.saturating_add(1);
        }

        if self.total_trials >= self.trials_per_round.saturating_mul(self.rounds) {
            Progress::SessionComplete
        } else if self.trial_in_round >= self.trials_per_round {
            Progress::RoundComplete
        } else {
            Progress::Continue
        }
    }

    /// Raises the best accuracy to the current accuracy when it improves.
    pub(crate) fn commit_best_accuracy(&mut self) -> f64 {
        self.best_accuracy = self.best_accuracy.max(self.accuracy_pct());
        self.best_accuracy
    }

    pub(crate) fn advance_round(&mut self) -> u32 {
        self.round_index = self.round_index.saturating_add(1);
        self.trial_in_round = 0;
        self.round_index
    }

    /// Builds the summary shown at a boundary.
    pub(crate) fn summary(&self, streak: u32, best_streak: u32, is_final: bool) -> Summary {
        let title = if is_final {
            "Session Complete".to_owned()
        } else {
            format!("Round {} Complete", self.round_index + 1)
        };
        Summary {
            title,
            correct: self.correct_prefires,
            total: self.total_trials,
            accuracy_pct: self.accuracy_pct(),
            streak,
            best_streak,
            is_final,
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            round_index: self.round_index,
            trial_in_round: self.trial_in_round,
            total_trials: self.total_trials,
            correct_prefires: self.correct_prefires,
            accuracy_pct: self.accuracy_pct(),
            best_accuracy: self.best_accuracy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_boundary_follows_trials_per_round() {
        let mut session = Session::new(3, 2, 0.0);
        assert_eq!(session.record(true), Progress::Continue);
        assert_eq!(session.record(false), Progress::Continue);
        assert_eq!(session.record(true), Progress::RoundComplete);

        let summary = session.summary(1, 4, false);
        assert_eq!(summary.title, "Round 1 Complete");
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.total, 3);

        assert_eq!(session.advance_round(), 1);
        assert_eq!(session.snapshot().trial_in_round, 0);
    }

    #[test]
    fn session_completion_takes_precedence_over_round() {
        let mut session = Session::new(2, 2, 0.0);
        for _ in 0..2 {
            let _ = session.record(false);
        }
        let _ = session.advance_round();
        assert_eq!(session.record(true), Progress::Continue);
        assert_eq!(session.record(true), Progress::SessionComplete);
        assert_eq!(session.summary(0, 0, true).title, "Session Complete");
    }

    #[test]
    fn accuracy_is_zero_without_trials() {
        let session = Session::new(50, 4, 0.0);
        assert_eq!(session.accuracy_pct(), 0.0);
    }

    #[test]
    fn best_accuracy_never_decreases() {
        let mut session = Session::new(50, 4, 80.0);
        let _ = session.record(true);
        let _ = session.record(false);
        assert_eq!(session.commit_best_accuracy(), 80.0);

        session.reset();
        let _ = session.record(true);
        assert_eq!(session.commit_best_accuracy(), 100.0);
        assert_eq!(session.best_accuracy(), 100.0);
    }

    #[test]
    fn snapshot_reports_committed_best_accuracy() {
        let mut session = Session::new(50, 4, 40.0);
        assert_eq!(session.snapshot().best_accuracy, 40.0);

        let _ = session.record(true);
        let _ = session.commit_best_accuracy();
        assert_eq!(session.snapshot().best_accuracy, 100.0);
    }
}
