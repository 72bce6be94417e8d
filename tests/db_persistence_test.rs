//! History and leaderboard survive an engine restart on the RocksDB store

use aviator::config::{StorageBackend, StorageConfig};
use aviator::game::RandomCrashGenerator;
use aviator::storage::{self, KeyValueStore, RocksStore, HISTORY_KEY, LEADERBOARD_KEY};
use aviator::{GameConfig, Player, RoundEngine};
use std::sync::Arc;
use tempfile::TempDir;

fn engine_on(store: Arc<dyn KeyValueStore>, crash_point: f64) -> RoundEngine {
    let config = GameConfig::default();
    let mut engine = RoundEngine::with_generator(
        &config,
        Player::register("linus", "pw").unwrap(),
        store,
        RandomCrashGenerator::seeded(1, 1.0, 20.0),
    );
    engine.set_admin_override("aviatoradmin", crash_point).unwrap();
    engine
}

fn play(engine: &mut RoundEngine, wager: f64, auto_cashout: f64) {
    engine.start_round(wager, auto_cashout).unwrap();
    while !engine.tick().unwrap().is_terminal() {}
}

#[test]
fn test_ledgers_persist_across_restarts() {
    let dir = TempDir::new().unwrap();

    {
        let store: Arc<dyn KeyValueStore> = Arc::new(RocksStore::open(dir.path()).unwrap());
        let mut engine = engine_on(store, 1.8);
        play(&mut engine, 100.0, 1.5); // cash out
        play(&mut engine, 100.0, 5.0); // crash
        assert_eq!(engine.leaderboard().len(), 1);
        assert_eq!(engine.history().len(), 1);
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(RocksStore::open(dir.path()).unwrap());
    let engine = engine_on(store, 1.8);

    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.history()[0].crash_point, 1.8);
    assert_eq!(engine.leaderboard().len(), 1);
    assert_eq!(engine.leaderboard()[0].username, "linus");
    assert_eq!(engine.leaderboard()[0].win_amount, 150.0);

    // Balance is session state and starts fresh
    assert_eq!(engine.balance(), 10_000.0);
}

#[test]
fn test_stored_json_matches_browser_format() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(RocksStore::open(dir.path()).unwrap());
    let mut engine = engine_on(store.clone(), 1.2);
    play(&mut engine, 10.0, 1.1);
    play(&mut engine, 10.0, 5.0);

    let leaderboard: serde_json::Value =
        serde_json::from_str(&store.get(LEADERBOARD_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(leaderboard[0]["username"], "linus");
    assert_eq!(leaderboard[0]["cashout"], 1.1);
    assert_eq!(leaderboard[0]["win"], 11.0);

    let history: serde_json::Value =
        serde_json::from_str(&store.get(HISTORY_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(history[0]["crash"], 1.2);
    assert!(history[0]["time"].is_i64());
}

#[test]
fn test_corrupt_records_start_empty() {
    let dir = TempDir::new().unwrap();
    {
        let store = RocksStore::open(dir.path()).unwrap();
        store.put(HISTORY_KEY, "not json").unwrap();
        store.put(LEADERBOARD_KEY, "{\"oops\":1}").unwrap();
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(RocksStore::open(dir.path()).unwrap());
    let mut engine = engine_on(store.clone(), 1.3);
    assert!(engine.history().is_empty());
    assert!(engine.leaderboard().is_empty());
    assert_eq!(store.get(LEADERBOARD_KEY).unwrap(), None);

    play(&mut engine, 10.0, 5.0);
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn test_open_store_selects_backend() {
    let dir = TempDir::new().unwrap();
    let rocks_config = StorageConfig {
        backend: StorageBackend::Rocksdb,
        data_dir: dir.path().join("ledgers").to_string_lossy().to_string(),
    };
    {
        let store = storage::open_store(&rocks_config).unwrap();
        store.put("marker", "[]").unwrap();
    }
    assert!(dir.path().join("ledgers").join("CURRENT").exists());
    let reopened = storage::open_store(&rocks_config).unwrap();
    assert_eq!(reopened.get("marker").unwrap().as_deref(), Some("[]"));

    let memory = storage::open_store(&StorageConfig {
        backend: StorageBackend::Memory,
        data_dir: String::new(),
    })
    .unwrap();
    memory.put("marker", "[]").unwrap();
    assert_eq!(memory.get("marker").unwrap().as_deref(), Some("[]"));
}
