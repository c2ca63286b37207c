#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scoring and streak bookkeeping for Prefire trials.
//!
//! Score is incidental to the reaction-time measurement: it is never persisted
//! or ranked. The streak, by contrast, is reported in every summary and its best
//! value is persisted per user, so [`StreakCounter`] keeps the best value
//! monotonically non-decreasing.

const KILL_BASE_POINTS: f64 = 100.0;
const KILL_STREAK_MULTIPLIER: f64 = 1.25;

/// Flat bonus awarded for a correct pre-fire.
pub const PREFIRE_BONUS: u64 = 75;

/// Points awarded for destroying the adversary at the provided streak.
///
/// Computes `round(100 * 1.25^streak)`.
#[must_use]
pub fn kill_points(streak: u32) -> u64 {
    let exponent = i32::try_from(streak).unwrap_or(i32::MAX);
    let scale = KILL_STREAK_MULTIPLIER.powi(exponent);
    let points = (KILL_BASE_POINTS * scale).round();
    if points.is_finite() {
        points as u64
    } else {
        u64::MAX
    }
}

/// Consecutive-prediction counter with a monotonic best value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreakCounter {
    current: u32,
    best: u32,
}

impl StreakCounter {
    /// Creates a counter seeded with a previously persisted best streak.
    #[must_use]
    pub const fn seeded(best: u32) -> Self {
        Self { current: 0, best }
    }

    /// Current streak.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Highest streak observed, including the seeded value.
    #[must_use]
    pub const fn best(&self) -> u32 {
        self.best
    }

    /// Increments the streak and raises the best value when exceeded.
    pub fn increment(&mut self) {
        self.current = self.current.saturating_add(1);
        self.best = self.best.max(self.current);
    }

    /// Resets the streak after a miss. The best value is preserved.
    pub fn reset(&mut self) {
        self.current = 0;
    }
}

/// Running score of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scoreboard {
    score: u64,
}

impl Scoreboard {
    /// Creates an empty scoreboard.
    #[must_use]
    pub const fn new() -> Self {
        Self { score: 0 }
    }

    /// Total accumulated points.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Awards the flat pre-fire bonus.
    pub fn award_prefire(&mut self) {
        self.score = self.score.saturating_add(PREFIRE_BONUS);
    }

    /// Awards kill points for the provided streak, returning the amount awarded.
    pub fn award_kill(&mut self, streak: u32) -> u64 {
        let points = kill_points(streak);
        self.score = self.score.saturating_add(points);
        points
    }
}
