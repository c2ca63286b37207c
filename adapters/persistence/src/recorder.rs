use prefire_core::{BestStats, Event};
use tracing::{info, warn};

use crate::PersistenceGateway;

/// Commits best statistics whenever the world asks for it.
///
/// Failures are logged and dropped so the experiment never stalls on storage.
#[derive(Debug)]
pub struct BestStatsRecorder<G> {
    gateway: G,
    user: String,
    last_stored: Option<BestStats>,
}

impl<G: PersistenceGateway> BestStatsRecorder<G> {
    /// Creates a recorder saving under `user`.
    pub fn new(gateway: G, user: impl Into<String>) -> Self {
        Self {
            gateway,
            user: user.into(),
            last_stored: None,
        }
    }

    /// Loads the user's stored statistics, falling back to zero on failure.
    #[must_use]
    pub fn load(&self) -> BestStats {
        match self.gateway.load_best_stats(&self.user) {
            Ok(stats) => {
                info!(
                    user = %self.user,
                    accuracy = stats.accuracy,
                    best_streak = stats.best_streak,
                    "best stats loaded"
                );
                stats
            }
            Err(error) => {
                warn!(user = %self.user, %error, "failed to load best stats");
                BestStats::default()
            }
        }
    }

    /// Persists every `BestStatsCommitted` event in `events`.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            let Event::BestStatsCommitted { stats } = event else {
                continue;
            };
            match self.gateway.save_best_stats_if_better(&self.user, *stats) {
                Ok(stored) => self.last_stored = Some(stored),
                Err(error) => warn!(user = %self.user, %error, "failed to save best stats"),
            }
        }
    }

    /// Statistics stored by the most recent successful commit.
    #[must_use]
    pub fn last_stored(&self) -> Option<BestStats> {
        self.last_stored
    }

    /// Gateway the recorder writes through.
    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}
