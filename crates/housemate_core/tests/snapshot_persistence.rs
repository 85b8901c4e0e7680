use housemate_core::{
    decode_state, encode_state, load_state, CommandError, HouseholdStore, MemorySnapshotRepository, SeededStampSource,
    SnapshotRepository, SqliteSnapshotRepository, StorageError, StorageResult, StoreConfig,
    DEFAULT_SNAPSHOT_KEY,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const T0: i64 = 1_700_000_000_000;

/// Reads like an empty repository and fails every write.
struct ReadOnlyRepository;

impl SnapshotRepository for ReadOnlyRepository {
    fn load_snapshot(&self, _key: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }

    fn save_snapshot(&mut self, _key: &str, _payload: &str, _saved_at_ms: i64) -> StorageResult<()> {
        Err(StorageError::Corrupt("read-only".to_string()))
    }
}

#[test]
fn sqlite_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("housemate.db");

    let mut store = HouseholdStore::open_sqlite(StoreConfig::with_db_path(&path)).unwrap();
    let code = store.create_house("Maple Street", "Mila").unwrap();
    store.add_grocery("milk").unwrap();
    store.add_bill("Rent", 900.0, &[]).unwrap();
    let before = store.snapshot();
    drop(store);

    let reopened = HouseholdStore::open_sqlite(StoreConfig::with_db_path(&path)).unwrap();
    assert_eq!(*reopened.snapshot(), *before);
    assert_eq!(reopened.active_house().map(|house| house.code.as_str()), Some(code.as_str()));
    assert!(reopened.last_storage_error().is_none());
}

#[test]
fn every_change_is_written_under_the_snapshot_key() {
    let mut store = HouseholdStore::open(
        MemorySnapshotRepository::new(),
        SeededStampSource::new(3, T0),
        StoreConfig::default(),
    )
    .unwrap();
    assert!(store.repository().raw(DEFAULT_SNAPSHOT_KEY).is_none());

    store.create_house("Maple Street", "Mila").unwrap();
    store.add_note("Quiet hours after 10").unwrap();

    let raw = store.repository().raw(DEFAULT_SNAPSHOT_KEY).unwrap();
    assert_eq!(decode_state(raw).unwrap(), *store.snapshot());
}

#[test]
fn custom_snapshot_key_is_respected() {
    let config = StoreConfig {
        snapshot_key: "tenant-a".to_string(),
        ..StoreConfig::default()
    };
    let mut store = HouseholdStore::open(
        MemorySnapshotRepository::new(),
        SeededStampSource::new(3, T0),
        config,
    )
    .unwrap();
    store.create_house("Maple Street", "Mila").unwrap();

    assert!(store.repository().raw("tenant-a").is_some());
    assert!(store.repository().raw(DEFAULT_SNAPSHOT_KEY).is_none());
}

#[test]
fn corrupt_snapshot_opens_as_empty_state() {
    let repo = MemorySnapshotRepository::with_snapshot(DEFAULT_SNAPSHOT_KEY, "{\"houses\": [");
    let store = HouseholdStore::open(repo, SeededStampSource::new(1, T0), StoreConfig::default())
        .unwrap();

    assert!(store.state().houses.is_empty());
    assert!(store.notifications().is_empty());
    assert!(store.active_house().is_none());
}

#[test]
fn corrupt_sqlite_row_loads_default_state() {
    let repo = SqliteSnapshotRepository::open_in_memory().unwrap();
    repo.connection()
        .execute(
            "INSERT INTO snapshots (key, payload, updated_at) VALUES (?1, 'not json', 0);",
            [DEFAULT_SNAPSHOT_KEY],
        )
        .unwrap();

    let state = load_state(&repo, DEFAULT_SNAPSHOT_KEY);
    assert!(state.houses.is_empty());
}

#[test]
fn failed_save_keeps_command_result_and_reports_error() {
    let mut store = HouseholdStore::open(
        ReadOnlyRepository,
        SeededStampSource::new(5, T0),
        StoreConfig::default(),
    )
    .unwrap();

    let code = store.create_house("Maple Street", "Mila").unwrap();
    assert_eq!(store.state().houses.len(), 1);
    assert_eq!(store.state().houses[0].code, code);
    assert!(matches!(
        store.last_storage_error(),
        Some(StorageError::Corrupt(_))
    ));

    store.add_grocery("bread").unwrap();
    assert_eq!(store.state().houses[0].groceries.len(), 1);
}

#[test]
fn sqlite_repository_upserts_by_key() {
    let mut repo = SqliteSnapshotRepository::open_in_memory().unwrap();
    repo.save_snapshot("k", "{}", 1).unwrap();
    assert_eq!(repo.load_snapshot("k").unwrap().as_deref(), Some("{}"));
    repo.save_snapshot("k", "{\"houses\":[]}", 2).unwrap();
    assert_eq!(
        repo.load_snapshot("k").unwrap().as_deref(),
        Some("{\"houses\":[]}")
    );
    assert_eq!(repo.load_snapshot("missing").unwrap(), None);
}

#[test]
fn store_built_state_with_arbitrary_amounts_round_trips() {
    let mut store = HouseholdStore::open(
        MemorySnapshotRepository::new(),
        SeededStampSource::new(31, T0),
        StoreConfig::default(),
    )
    .unwrap();
    let code = store.create_house("Maple Street", "Mila").unwrap();
    store.join_house(&code, "Roy").unwrap();
    store.join_house(&code, "Ella").unwrap();

    let mut rng = StdRng::seed_from_u64(2718);
    for round in 0..400 {
        let total: f64 = rng.gen_range(0.0..1_000.0) + f64::MIN_POSITIVE;
        store.add_bill(&format!("Bill {round}"), total, &[]).unwrap();
        if round % 25 == 0 {
            store.add_message("split posted").unwrap();
            store.add_grocery("soap").unwrap();
        }
    }

    let state = store.snapshot();
    let decoded = decode_state(&encode_state(&state).unwrap()).unwrap();
    assert_eq!(decoded, *state);

    let raw = store.repository().raw(DEFAULT_SNAPSHOT_KEY).unwrap();
    assert_eq!(decode_state(raw).unwrap(), *state);
}

#[test]
fn overflowing_bill_total_never_reaches_storage() {
    let mut store = HouseholdStore::open(
        MemorySnapshotRepository::new(),
        SeededStampSource::new(41, T0),
        StoreConfig::default(),
    )
    .unwrap();
    store.create_house("Maple Street", "Mila").unwrap();
    store.add_grocery("milk").unwrap();

    let err = store.add_bill("Huge", 1e307, &[]).unwrap_err();
    assert_eq!(err, CommandError::InvalidAmount(1e307));
    assert!(store.last_storage_error().is_none());

    let reopened = HouseholdStore::open(
        store.repository().clone(),
        SeededStampSource::new(42, T0 + 60_000),
        StoreConfig::default(),
    )
    .unwrap();
    assert_eq!(reopened.state().houses.len(), 1);
    assert_eq!(reopened.state().houses[0].groceries.len(), 1);
    assert!(reopened.state().houses[0].bills.is_empty());
}
