//! Recovery Tests
//!
//! Reopen a disk database and check that replay restores exactly what
//! was committed: deletes, versions, expiries and torn log tails.

use std::fs::OpenOptions;
use std::io::Write;
use std::time::Duration;

use genesis_core::{Key, Timestamp};
use genesis_engine::{Database, GenesisConfig};
use tempfile::TempDir;

/// Route `tracing` output to the test harness; level from `GENESIS_LOG`
fn init_tracing() {
    let level = std::env::var("GENESIS_LOG")
        .ok()
        .and_then(|l| l.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::WARN);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_test_writer()
        .try_init();
}

fn always() -> GenesisConfig {
    GenesisConfig {
        durability: "always".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_committed_writes_survive_reopen() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    {
        let db = Database::open_with_config(dir.path(), always()).unwrap();
        db.transaction(|txn| {
            txn.put(Key::new_account("alice"), b"a".to_vec())?;
            txn.put(Key::new_data("alice", "theme"), b"\"dark\"".to_vec())
        })
        .unwrap();
        db.transaction(|txn| txn.put(Key::new_account("bob"), b"b".to_vec()))
            .unwrap();
    }

    let db = Database::open_with_config(dir.path(), always()).unwrap();
    assert_eq!(db.recovery_stats().records_replayed, 2);
    assert_eq!(db.current_version(), 2);
    assert_eq!(
        db.get(&Key::new_data("alice", "theme")).unwrap().unwrap().value,
        b"\"dark\"".to_vec()
    );
    assert!(db.get(&Key::new_account("bob")).unwrap().is_some());
}

#[test]
fn test_deletes_survive_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let db = Database::open_with_config(dir.path(), always()).unwrap();
        db.transaction(|txn| txn.put(Key::new_data("o", "k"), b"1".to_vec()))
            .unwrap();
        db.transaction(|txn| txn.delete(Key::new_data("o", "k")))
            .unwrap();
    }

    let db = Database::open_with_config(dir.path(), always()).unwrap();
    assert!(db.get(&Key::new_data("o", "k")).unwrap().is_none());
}

#[test]
fn test_versions_continue_after_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let db = Database::open_with_config(dir.path(), always()).unwrap();
        for i in 0..3 {
            db.transaction(|txn| txn.put(Key::new_data("o", &format!("k{}", i)), b"1".to_vec()))
                .unwrap();
        }
    }

    let db = Database::open_with_config(dir.path(), always()).unwrap();
    let mut txn = db.begin_transaction();
    txn.put(Key::new_data("o", "next"), b"1".to_vec()).unwrap();
    assert_eq!(db.commit_transaction(&mut txn).unwrap(), 4);
}

#[test]
fn test_torn_tail_is_truncated() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    {
        let db = Database::open_with_config(dir.path(), always()).unwrap();
        db.transaction(|txn| txn.put(Key::new_account("alice"), b"a".to_vec()))
            .unwrap();
    }

    // An interrupted append leaves a partial record behind.
    let wal_path = dir.path().join(genesis_durability::WAL_FILE_NAME);
    let clean_len = std::fs::metadata(&wal_path).unwrap().len();
    {
        let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
        file.write_all(&[0x40, 0x00, 0x00, 0x00, 0x01, 0x02]).unwrap();
    }

    {
        let db = Database::open_with_config(dir.path(), always()).unwrap();
        assert_eq!(db.recovery_stats().records_replayed, 1);
        assert_eq!(db.recovery_stats().truncated_bytes, 6);
        assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), clean_len);

        db.transaction(|txn| txn.put(Key::new_account("bob"), b"b".to_vec()))
            .unwrap();
    }

    // Records appended after truncation replay normally.
    let db = Database::open_with_config(dir.path(), always()).unwrap();
    assert_eq!(db.recovery_stats().truncated_bytes, 0);
    assert!(db.get(&Key::new_account("alice")).unwrap().is_some());
    assert!(db.get(&Key::new_account("bob")).unwrap().is_some());
}

#[test]
fn test_expired_entries_are_skipped_at_replay() {
    let dir = TempDir::new().unwrap();
    let marker = Key::new_revoked("token-id");

    {
        let db = Database::open_with_config(dir.path(), always()).unwrap();
        let deadline = Timestamp::now().saturating_add(Duration::from_millis(50));
        db.transaction(|txn| txn.put_expiring(marker.clone(), Vec::new(), Some(deadline)))
            .unwrap();
        db.transaction(|txn| {
            let far = Timestamp::now().saturating_add(Duration::from_secs(3600));
            txn.put_expiring(Key::new_revoked("live"), Vec::new(), Some(far))
        })
        .unwrap();
    }

    std::thread::sleep(Duration::from_millis(80));

    let db = Database::open_with_config(dir.path(), always()).unwrap();
    assert_eq!(db.recovery_stats().expired_skipped, 1);
    assert!(db.get(&marker).unwrap().is_none());
    assert!(db.get(&Key::new_revoked("live")).unwrap().is_some());
}

#[test]
fn test_default_open_uses_config_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(genesis_engine::CONFIG_FILE_NAME),
        "durability = \"always\"\nkeys_per_user = 5\n",
    )
    .unwrap();

    let db = Database::open(dir.path()).unwrap();
    assert_eq!(db.limits().keys_per_user, 5);
    assert_eq!(
        db.durability_mode(),
        genesis_durability::DurabilityMode::Always
    );
}

#[test]
fn test_compaction_drops_expired_revocations_from_log() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let wal_path = dir.path().join(genesis_durability::WAL_FILE_NAME);

    {
        let db = Database::open_with_config(dir.path(), always()).unwrap();
        db.transaction(|txn| txn.put(Key::new_account("alice"), b"a".to_vec()))
            .unwrap();
        let deadline = Timestamp::now().saturating_add(Duration::from_millis(50));
        for i in 0..500 {
            db.transaction(|txn| {
                txn.put_expiring(Key::new_revoked(&format!("t{}", i)), Vec::new(), Some(deadline))
            })
            .unwrap();
        }
        std::thread::sleep(Duration::from_millis(80));

        let before = std::fs::metadata(&wal_path).unwrap().len();
        let info = db.compact().unwrap();
        assert_eq!(info.bytes_before, before);
        assert_eq!(info.live_entries, 1);
        assert!(std::fs::metadata(&wal_path).unwrap().len() < before / 10);
    }

    let db = Database::open_with_config(dir.path(), always()).unwrap();
    assert_eq!(db.recovery_stats().records_replayed, 1);
    assert_eq!(db.recovery_stats().expired_skipped, 0);
    assert_eq!(db.storage().len(), 1);
    assert!(db.get(&Key::new_account("alice")).unwrap().is_some());
}

#[test]
fn test_versions_continue_after_compaction() {
    let dir = TempDir::new().unwrap();

    {
        let db = Database::open_with_config(dir.path(), always()).unwrap();
        for _ in 0..5 {
            db.transaction(|txn| txn.put(Key::new_data("o", "k"), b"1".to_vec()))
                .unwrap();
        }
        db.compact().unwrap();
    }

    let db = Database::open_with_config(dir.path(), always()).unwrap();
    assert_eq!(db.current_version(), 5);
    let mut txn = db.begin_transaction();
    txn.put(Key::new_data("o", "next"), b"1".to_vec()).unwrap();
    assert_eq!(db.commit_transaction(&mut txn).unwrap(), 6);
}

#[test]
fn test_log_stays_bounded_past_threshold() {
    let dir = TempDir::new().unwrap();
    let cfg = GenesisConfig {
        wal_compact_kib: 1,
        ..always()
    };

    {
        let db = Database::open_with_config(dir.path(), cfg.clone()).unwrap();
        for i in 0..400u32 {
            db.transaction(|txn| txn.put(Key::new_data("o", "k"), i.to_string().into_bytes()))
                .unwrap();
            assert!(db.wal_len() < 2048);
        }
    }

    let db = Database::open_with_config(dir.path(), cfg).unwrap();
    assert!(db.recovery_stats().records_replayed < 100);
    assert_eq!(
        db.get(&Key::new_data("o", "k")).unwrap().unwrap().value,
        b"399".to_vec()
    );
}

#[test]
fn test_oversized_log_is_compacted_at_open() {
    let dir = TempDir::new().unwrap();

    {
        let db = Database::open_with_config(dir.path(), always()).unwrap();
        for i in 0..200u32 {
            db.transaction(|txn| txn.put(Key::new_data("o", "k"), i.to_string().into_bytes()))
                .unwrap();
        }
    }

    let cfg = GenesisConfig {
        wal_compact_kib: 1,
        ..always()
    };
    let db = Database::open_with_config(dir.path(), cfg).unwrap();
    assert_eq!(db.recovery_stats().records_replayed, 200);
    assert!(db.wal_len() < 1024);
}
