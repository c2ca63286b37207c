use std::collections::BTreeMap;

use prefire_core::BestStats;

use crate::{merge_best, PersistenceError, PersistenceGateway};

/// In-process store, used when no file is configured.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    users: BTreeMap<String, BestStats>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with stored statistics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Reports whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl PersistenceGateway for MemoryStore {
    fn load_best_stats(&self, user: &str) -> Result<BestStats, PersistenceError> {
        Ok(self.users.get(user).copied().unwrap_or_default())
    }

    fn save_best_stats_if_better(
        &mut self,
        user: &str,
        offered: BestStats,
    ) -> Result<BestStats, PersistenceError> {
        let entry = self.users.entry(user.to_owned()).or_default();
        *entry = merge_best(*entry, offered);
        Ok(*entry)
    }
}
