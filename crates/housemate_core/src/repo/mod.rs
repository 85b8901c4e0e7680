//! Persistence adapters for household snapshots.
//!
//! # Responsibility
//! - Define the key/blob storage contract used by the store façade.
//! - Keep SQLite and JSON details out of the reducer and service layers.
//!
//! # Invariants
//! - One key holds one complete snapshot; saves overwrite it.

pub mod snapshot_repo;
