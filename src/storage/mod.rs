// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Key/Value Storage
//!
//! The backend persists everything (roles, backend configuration) through
//! the narrow [`Storage`] trait: string keys, opaque byte values.
//!
//! ## Key Layout
//!
//! ```text
//! config          # BackendConfig (JSON)
//! role/{name}     # RoleEntry (JSON), name lower-cased
//! ```
//!
//! ## Implementations
//!
//! - [`MemoryStorage`] - process-local map, used in tests and development
//! - [`RedbStorage`] - embedded ACID database (redb) used by the server
//!
//! Serialization of concurrent writes to the same key is left to the
//! implementation; the backend itself holds no locks.

pub mod database;
pub mod memory;

pub use database::RedbStorage;
pub use memory::MemoryStorage;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The in-memory store's lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Generic key/value store consumed by the backend.
///
/// | Method | Description |
/// |--------|-------------|
/// | [`get`](Storage::get) | Value for a key, `None` when absent |
/// | [`put`](Storage::put) | Insert or overwrite a key |
/// | [`delete`](Storage::delete) | Remove a key; absent keys are not an error |
/// | [`list`](Storage::list) | Key suffixes under a prefix, in key order |
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    fn delete(&self, key: &str) -> StorageResult<()>;

    /// Returns the keys starting with `prefix`, with the prefix stripped.
    fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;
}
