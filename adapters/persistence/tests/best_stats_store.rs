use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use prefire_core::{BestStats, Event};
use prefire_persistence::{
    BestStatsRecorder, JsonFileStore, MemoryStore, PersistenceError, PersistenceGateway,
};

fn scratch_file(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let pid = std::process::id();
    std::env::temp_dir()
        .join(format!("prefire-store-{label}-{pid}-{nanos}"))
        .join("stats.json")
}

fn stats(accuracy: f64, best_streak: u32) -> BestStats {
    BestStats {
        accuracy,
        best_streak,
    }
}

#[derive(Debug, Default)]
struct BrokenGateway {
    attempts: u32,
}

impl PersistenceGateway for BrokenGateway {
    fn load_best_stats(&self, _user: &str) -> Result<BestStats, PersistenceError> {
        Err(PersistenceError::Unavailable("offline".to_owned()))
    }

    fn save_best_stats_if_better(
        &mut self,
        _user: &str,
        _offered: BestStats,
    ) -> Result<BestStats, PersistenceError> {
        self.attempts += 1;
        Err(PersistenceError::Unavailable("offline".to_owned()))
    }
}

#[test]
fn json_store_only_raises_fields_that_improve() {
    let path = scratch_file("raise");
    let mut store = JsonFileStore::new(&path);
    assert_eq!(
        store.load_best_stats("p01").expect("missing file"),
        BestStats::default()
    );

    let first = store
        .save_best_stats_if_better("p01", stats(62.0, 5))
        .expect("first save");
    assert_eq!(first, stats(62.0, 5));

    let second = store
        .save_best_stats_if_better("p01", stats(48.5, 11))
        .expect("second save");
    assert_eq!(second, stats(62.0, 11));

    let reopened = JsonFileStore::new(&path);
    assert_eq!(
        reopened.load_best_stats("p01").expect("reload"),
        stats(62.0, 11)
    );
    assert_eq!(
        reopened.load_best_stats("p02").expect("other user"),
        BestStats::default()
    );

    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[test]
fn json_store_reports_malformed_documents() {
    let path = scratch_file("malformed");
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).expect("create dir");
    }
    std::fs::write(&path, "{ not json").expect("write junk");

    let mut store = JsonFileStore::new(&path);
    assert!(matches!(
        store.load_best_stats("p01"),
        Err(PersistenceError::Malformed { .. })
    ));
    assert!(store
        .save_best_stats_if_better("p01", stats(1.0, 1))
        .is_err());
    assert_eq!(
        std::fs::read_to_string(&path).expect("file untouched"),
        "{ not json"
    );

    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[test]
fn recorder_commits_only_on_best_stats_events() {
    let mut recorder = BestStatsRecorder::new(MemoryStore::new(), "p07");
    recorder.handle(&[Event::CueStopped, Event::Exited]);
    assert!(recorder.gateway().is_empty());
    assert_eq!(recorder.last_stored(), None);

    recorder.handle(&[Event::BestStatsCommitted {
        stats: stats(33.0, 4),
    }]);
    recorder.handle(&[Event::BestStatsCommitted {
        stats: stats(20.0, 2),
    }]);
    assert_eq!(recorder.last_stored(), Some(stats(33.0, 4)));
    assert_eq!(recorder.load(), stats(33.0, 4));
}

#[test]
fn recorder_swallows_gateway_failures() {
    let mut recorder = BestStatsRecorder::new(BrokenGateway::default(), "p09");
    assert_eq!(recorder.load(), BestStats::default());

    recorder.handle(&[
        Event::BestStatsCommitted {
            stats: stats(90.0, 20),
        },
        Event::BestStatsCommitted {
            stats: stats(91.0, 21),
        },
    ]);
    assert_eq!(recorder.gateway().attempts, 2);
    assert_eq!(recorder.last_stored(), None);
}
