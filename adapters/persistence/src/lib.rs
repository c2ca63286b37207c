#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Persistence gateway for per-user best statistics.
//!
//! Stores only ever improve: a save keeps the larger of the stored and the
//! offered value for each field independently, so a session with a better
//! streak but worse accuracy raises the streak alone.

mod json_store;
mod memory;
mod recorder;

use std::path::PathBuf;

use prefire_core::BestStats;
use thiserror::Error;

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;
pub use recorder::BestStatsRecorder;

/// Errors raised by persistence gateways.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing the backing file failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The backing document could not be parsed or produced.
    #[error("malformed stats document {}: {source}", path.display())]
    Malformed {
        /// File holding the document.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The gateway refused the request.
    #[error("persistence unavailable: {0}")]
    Unavailable(String),
}

/// Storage for the best statistics of each user.
pub trait PersistenceGateway {
    /// Loads the stored statistics, or zeroed statistics for an unknown user.
    fn load_best_stats(&self, user: &str) -> Result<BestStats, PersistenceError>;

    /// Raises each stored field to the offered value when the offer is greater.
    ///
    /// Returns the statistics stored after the update.
    fn save_best_stats_if_better(
        &mut self,
        user: &str,
        offered: BestStats,
    ) -> Result<BestStats, PersistenceError>;
}

impl<G: PersistenceGateway + ?Sized> PersistenceGateway for Box<G> {
    fn load_best_stats(&self, user: &str) -> Result<BestStats, PersistenceError> {
        (**self).load_best_stats(user)
    }

    fn save_best_stats_if_better(
        &mut self,
        user: &str,
        offered: BestStats,
    ) -> Result<BestStats, PersistenceError> {
        (**self).save_best_stats_if_better(user, offered)
    }
}

/// Field-wise maximum of two statistics records.
#[must_use]
pub fn merge_best(stored: BestStats, offered: BestStats) -> BestStats {
    BestStats {
        accuracy: if offered.accuracy > stored.accuracy {
            offered.accuracy
        } else {
            stored.accuracy
        },
        best_streak: stored.best_streak.max(offered.best_streak),
    }
}
