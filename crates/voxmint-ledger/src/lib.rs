//! Voxmint Version Ledger
//!
//! Owns the DAG of audio versions produced from one recording session and
//! snapshots it to a [`PersistenceStore`] after every mutation, so the
//! session survives reloads.

pub mod ledger;
pub mod persistence;

pub use ledger::{LedgerError, LedgerSnapshot, VersionLedger, LEDGER_SNAPSHOT_KEY};
pub use persistence::{
    FileStore, MemoryStore, PersistenceError, PersistenceStore, PersistenceStoreExt,
};
