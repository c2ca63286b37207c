use std::time::Duration;

/// Monotonic audio device clock that only advances while output runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeviceClock {
    now: f64,
    running: bool,
}

impl DeviceClock {
    /// Creates a running clock at time zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: 0.0,
            running: true,
        }
    }

    /// Current device time in seconds.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.now
    }

    /// Reports whether the clock advances.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Advances the clock by `dt` unless suspended.
    pub fn advance(&mut self, dt: Duration) {
        if self.running {
            self.now += dt.as_secs_f64();
        }
    }

    /// Freezes the clock.
    pub fn suspend(&mut self) {
        self.running = false;
    }

    /// Lets the clock advance again from where it froze.
    pub fn resume(&mut self) {
        self.running = true;
    }
}

impl Default for DeviceClock {
    fn default() -> Self {
        Self::new()
    }
}
