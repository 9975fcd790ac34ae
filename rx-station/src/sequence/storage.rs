//! redb-based prescription counter storage
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `rx_counters` | counter name (`rxCounter`, `crxCounter`) | `u64` | next number to issue |
//!
//! Every operation is a single write transaction. redb serializes write
//! transactions, so a read-increment-write inside one is atomic across
//! threads and across handles to the same `Database`.

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::CounterKind;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::allocator::{AllocationError, CounterSeeds, CounterStore};

/// Table for prescription counters: key = counter name, value = next value
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("rx_counters");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Counter does not exist: {0}")]
    CounterMissing(String),

    #[error("Counter overflow: {0}")]
    Overflow(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Counter storage backed by redb
#[derive(Clone)]
pub struct RedbCounterStore {
    db: Arc<Database>,
}

impl RedbCounterStore {
    /// Open or create the database at the given path
    ///
    /// Counters are not seeded here; see [`RedbCounterStore::init_counter`].
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(db)
    }

    fn init_tables(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Create a counter at `seed` if it does not exist yet
    ///
    /// Returns whether this call created it. An existing counter is never
    /// overwritten.
    pub fn init_counter(&self, key: &str, seed: u64) -> StorageResult<bool> {
        let txn = self.db.begin_write()?;
        let created = {
            let mut table = txn.open_table(COUNTERS_TABLE)?;
            if table.get(key)?.is_some() {
                false
            } else {
                table.insert(key, seed)?;
                true
            }
        };
        txn.commit()?;

        if created {
            info!(counter = key, seed, "Counter initialized");
        }
        Ok(created)
    }

    /// Atomically read the counter, store value + 1 and return the prior value
    pub fn increment(&self, key: &str) -> StorageResult<u64> {
        let txn = self.db.begin_write()?;
        let current = {
            let mut table = txn.open_table(COUNTERS_TABLE)?;
            let current = table
                .get(key)?
                .map(|g| g.value())
                .ok_or_else(|| StorageError::CounterMissing(key.to_string()))?;
            let next = current
                .checked_add(1)
                .ok_or_else(|| StorageError::Overflow(key.to_string()))?;
            table.insert(key, next)?;
            current
        };
        txn.commit()?;

        debug!(counter = key, value = current, "Counter incremented");
        Ok(current)
    }

    /// Current value (the next number to be issued), without incrementing
    pub fn get(&self, key: &str) -> StorageResult<Option<u64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table.get(key)?.map(|g| g.value()))
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, AllocationError>
    where
        T: Send + 'static,
        F: FnOnce(RedbCounterStore) -> Result<T, AllocationError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(store))
            .await
            .map_err(|e| AllocationError::Unavailable(format!("Task join failed: {}", e)))?
    }
}

fn allocation_error(kind: CounterKind, e: StorageError) -> AllocationError {
    match e {
        StorageError::CounterMissing(_) => AllocationError::CounterMissing(kind),
        StorageError::Overflow(_) => AllocationError::Exhausted(kind),
        other => AllocationError::Storage(other),
    }
}

#[async_trait]
impl CounterStore for RedbCounterStore {
    async fn initialize(&self, seeds: &CounterSeeds) -> Result<(), AllocationError> {
        let seeds = *seeds;
        self.blocking(move |store| {
            for kind in CounterKind::ALL {
                store
                    .init_counter(kind.key(), seeds.get(kind))
                    .map_err(|e| allocation_error(kind, e))?;
            }
            Ok(())
        })
        .await
    }

    async fn fetch_increment(&self, kind: CounterKind) -> Result<u64, AllocationError> {
        self.blocking(move |store| {
            store
                .increment(kind.key())
                .map_err(|e| allocation_error(kind, e))
        })
        .await
    }

    async fn peek(&self, kind: CounterKind) -> Result<Option<u64>, AllocationError> {
        self.blocking(move |store| store.get(kind.key()).map_err(|e| allocation_error(kind, e)))
            .await
    }
}
