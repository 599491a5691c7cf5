// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistent key/value storage backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `entries`: storage key → value bytes (JSON documents in practice)

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::{Storage, StorageResult};

/// Single table holding every backend entry, ordered by key.
const ENTRIES: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");

/// Embedded ACID key/value store.
///
/// Every write runs in its own redb write transaction, so concurrent writers
/// to the same key are serialized by the database.
pub struct RedbStorage {
    db: Database,
}

impl RedbStorage {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ENTRIES)?;
        }
        write_txn.commit()?;

        tracing::debug!(path = %path.display(), "Opened storage database");
        Ok(Self { db })
    }
}

impl Storage for RedbStorage {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES)?;
        match table.get(key)? {
            Some(value) => Ok(Some(value.value().to_vec())),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTRIES)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTRIES)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES)?;

        let mut keys = Vec::new();
        for entry in table.range(prefix..)? {
            let (key, _) = entry?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key[prefix.len()..].to_string());
        }
        Ok(keys)
    }
}
