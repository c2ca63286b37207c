//! Pause state with a snapshot captured on entry and consumed once on resume.

use prefire_core::{PauseSnapshot, Phase, Quarter};

#[derive(Clone, Debug, Default)]
pub(crate) struct PauseManager {
    paused: bool,
    snapshot: Option<PauseSnapshot>,
}

impl PauseManager {
    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    /// Enters the paused state, returning `false` when already paused.
    pub(crate) fn pause(
        &mut self,
        phase: Phase,
        quarter: Option<Quarter>,
        adversary_present: bool,
    ) -> bool {
        if self.paused {
            return false;
        }
        let pending = phase.has_open_trial() && phase != Phase::Resolving;
        self.snapshot = Some(PauseSnapshot {
            within_cue_phase: phase == Phase::WithinCuePhase && !adversary_present,
            quarter,
            had_reaction_waiting: pending && !adversary_present,
        });
        self.paused = true;
        true
    }

    /// Leaves the paused state and hands out the snapshot exactly once.
    pub(crate) fn resume(&mut self) -> Option<PauseSnapshot> {
        if !self.paused {
            return None;
        }
        self.paused = false;
        self.snapshot.take()
    }

    pub(crate) fn snapshot(&self) -> Option<PauseSnapshot> {
        self.snapshot
    }

    pub(crate) fn clear(&mut self) {
        self.paused = false;
        self.snapshot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_pause_is_ignored_and_keeps_first_snapshot() {
        let quarter = Quarter::new(2);
        let mut manager = PauseManager::default();
        assert!(manager.pause(Phase::WithinCuePhase, quarter, false));
        assert!(!manager.pause(Phase::ReactionWindow, quarter, true));

        let snapshot = manager.resume().expect("snapshot captured");
        assert!(snapshot.within_cue_phase);
        assert!(snapshot.had_reaction_waiting);
        assert_eq!(snapshot.quarter, quarter);
    }

    #[test]
    fn snapshot_is_consumed_once() {
        let mut manager = PauseManager::default();
        assert!(manager.pause(Phase::PreCueNoise, Quarter::new(0), false));
        assert!(manager.resume().is_some());
        assert!(manager.resume().is_none());
        assert!(!manager.is_paused());
    }

    #[test]
    fn spawned_adversary_clears_cue_flags() {
        let mut manager = PauseManager::default();
        assert!(manager.pause(Phase::ReactionWindow, Quarter::new(1), true));
        let snapshot = manager.snapshot().expect("snapshot captured");
        assert!(!snapshot.within_cue_phase);
        assert!(!snapshot.had_reaction_waiting);
    }
}
