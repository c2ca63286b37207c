//! Single cancellation registry for every phase-transition timer.

use std::time::Duration;

use prefire_core::TrialId;

/// Named timers the state machine can arm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Masking noise finished; enter the cue phase.
    PreCueElapsed,
    /// Re-check audio readiness before entering the cue phase.
    ReadinessPoll,
    /// Cue window deadline; spawn the adversary.
    CueWindowElapsed,
    /// Start the feedback tone cloud.
    ToneCloud,
    /// Feedback drained; resolve the trial.
    TrialDrain,
}

/// Timer armed for a specific trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArmedTimer {
    /// Kind of the timer.
    pub kind: TimerKind,
    /// Absolute experiment time the timer fires at.
    pub deadline: Duration,
    /// Trial that armed the timer.
    pub trial: TrialId,
}

/// Registry holding at most one armed timer per kind.
#[derive(Clone, Debug, Default)]
pub(crate) struct TimerRegistry {
    armed: Vec<ArmedTimer>,
}

impl TimerRegistry {
    /// Arms a timer, superseding any timer of the same kind.
    pub(crate) fn arm(&mut self, kind: TimerKind, deadline: Duration, trial: TrialId) {
        self.cancel(kind);
        self.armed.push(ArmedTimer {
            kind,
            deadline,
            trial,
        });
    }

    pub(crate) fn cancel(&mut self, kind: TimerKind) {
        self.armed.retain(|timer| timer.kind != kind);
    }

    /// Cancels every armed timer at once.
    pub(crate) fn clear_all(&mut self) {
        self.armed.clear();
    }

    /// Removes and returns the earliest timer due at `now`, if any.
    ///
    /// Ties are broken by kind so replays fire timers in a stable order.
    pub(crate) fn pop_due(&mut self, now: Duration) -> Option<ArmedTimer> {
        let index = self
            .armed
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.deadline <= now)
            .min_by_key(|(_, timer)| (timer.deadline, timer.kind))
            .map(|(index, _)| index)?;
        Some(self.armed.swap_remove(index))
    }

    pub(crate) fn snapshot(&self) -> Vec<ArmedTimer> {
        let mut timers = self.armed.clone();
        timers.sort_by_key(|timer| (timer.deadline, timer.kind));
        timers
    }
}
