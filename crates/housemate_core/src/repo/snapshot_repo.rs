//! Snapshot repository contracts and implementations.
//!
//! # Responsibility
//! - Store one serialized full-state snapshot per key (last writer wins).
//! - Encode/decode `HouseholdState` and fall back to the default state when
//!   the stored snapshot is missing or unreadable.
//!
//! # Invariants
//! - Loading never fails outward: absent or corrupt data yields the default.
//! - Fields missing from older snapshots decode to their empty value.
//! - Log events carry keys, sizes and error codes, never snapshot content.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::state::HouseholdState;
use log::{debug, error, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type StorageResult<T> = Result<T, StorageError>;

/// Snapshot load/save failure.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    Serialize(serde_json::Error),
    /// Stored payload could not be decoded.
    Corrupt(String),
    /// State holds an amount JSON cannot represent; names the offending field.
    NonFiniteAmount(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "snapshot storage error: {err}"),
            Self::Serialize(err) => write!(f, "failed to serialize snapshot: {err}"),
            Self::Corrupt(details) => write!(f, "stored snapshot is corrupt: {details}"),
            Self::NonFiniteAmount(field) => {
                write!(f, "refusing to store non-finite amount in {field}")
            }
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::Corrupt(_) | Self::NonFiniteAmount(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Key/blob storage for serialized snapshots.
pub trait SnapshotRepository {
    fn load_snapshot(&self, key: &str) -> StorageResult<Option<String>>;
    fn save_snapshot(&mut self, key: &str, payload: &str, saved_at_ms: i64) -> StorageResult<()>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository {
    conn: Connection,
}

impl SqliteSnapshotRepository {
    /// Opens (or creates) a snapshot database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps an already-migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl SnapshotRepository for SqliteSnapshotRepository {
    fn load_snapshot(&self, key: &str) -> StorageResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM snapshots WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn save_snapshot(&mut self, key: &str, payload: &str, saved_at_ms: i64) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO snapshots (key, payload, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![key, payload, saved_at_ms],
        )?;
        Ok(())
    }
}

/// Volatile snapshot repository for tests and throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct MemorySnapshotRepository {
    entries: HashMap<String, String>,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the repository with a raw payload under `key`.
    pub fn with_snapshot(key: impl Into<String>, payload: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), payload.into());
        Self { entries }
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl SnapshotRepository for MemorySnapshotRepository {
    fn load_snapshot(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save_snapshot(&mut self, key: &str, payload: &str, _saved_at_ms: i64) -> StorageResult<()> {
        self.entries.insert(key.to_string(), payload.to_string());
        Ok(())
    }
}

/// Serializes `state`.
///
/// # Errors
/// `NonFiniteAmount` when a bill carries NaN or infinity; serde_json would
/// write `null` and the snapshot could not be read back.
pub fn encode_state(state: &HouseholdState) -> StorageResult<String> {
    if let Some(field) = first_non_finite_amount(state) {
        return Err(StorageError::NonFiniteAmount(field));
    }
    Ok(serde_json::to_string(state)?)
}

fn first_non_finite_amount(state: &HouseholdState) -> Option<String> {
    state
        .houses
        .iter()
        .flat_map(|house| &house.bills)
        .find_map(|bill| {
            if !bill.total.is_finite() {
                return Some(format!("bill {} total", bill.id));
            }
            bill.splits
                .iter()
                .find(|split| !split.amount.is_finite())
                .map(|split| format!("bill {} split for {}", bill.id, split.member_id))
        })
}

pub fn decode_state(payload: &str) -> StorageResult<HouseholdState> {
    serde_json::from_str(payload).map_err(|err| StorageError::Corrupt(err.to_string()))
}

/// Loads the snapshot under `key`, defaulting on absence or any failure.
pub fn load_state<R: SnapshotRepository + ?Sized>(repo: &R, key: &str) -> HouseholdState {
    let payload = match repo.load_snapshot(key) {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            info!("event=snapshot_load module=repo status=ok key={key} found=false");
            return HouseholdState::default();
        }
        Err(err) => {
            error!(
                "event=snapshot_load module=repo status=error key={key} error_code=snapshot_read_failed error={err}"
            );
            return HouseholdState::default();
        }
    };

    match decode_state(&payload) {
        Ok(state) => {
            info!(
                "event=snapshot_load module=repo status=ok key={key} found=true bytes={} houses={} notifications={}",
                payload.len(),
                state.houses.len(),
                state.notifications.len()
            );
            state
        }
        Err(err) => {
            error!(
                "event=snapshot_load module=repo status=error key={key} bytes={} error_code=snapshot_corrupt error={err}",
                payload.len()
            );
            HouseholdState::default()
        }
    }
}

/// Serializes `state` and overwrites the snapshot under `key`.
pub fn save_state<R: SnapshotRepository + ?Sized>(
    repo: &mut R,
    key: &str,
    state: &HouseholdState,
    saved_at_ms: i64,
) -> StorageResult<()> {
    let payload = match encode_state(state) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(
                "event=snapshot_save module=repo status=error key={key} error_code=snapshot_encode_failed error={err}"
            );
            return Err(err);
        }
    };
    match repo.save_snapshot(key, &payload, saved_at_ms) {
        Ok(()) => {
            debug!(
                "event=snapshot_save module=repo status=ok key={key} bytes={}",
                payload.len()
            );
            Ok(())
        }
        Err(err) => {
            warn!(
                "event=snapshot_save module=repo status=error key={key} error_code=snapshot_write_failed error={err}"
            );
            Err(err)
        }
    }
}
