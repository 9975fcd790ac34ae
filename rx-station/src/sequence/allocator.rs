//! Sequence allocator

use async_trait::async_trait;
use shared::{CounterKind, PrescriptionNumber};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info, instrument};

use super::storage::StorageError;

/// Prescription number could not be issued
///
/// Fatal to the current request and never retried with a fresh allocation.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("Counter does not exist: {0}")]
    CounterMissing(CounterKind),

    #[error("Counter exhausted: {0}")]
    Exhausted(CounterKind),

    #[error("Counter store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// First value of each counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSeeds {
    pub standard: u64,
    pub controlled: u64,
}

impl CounterSeeds {
    pub fn get(&self, kind: CounterKind) -> u64 {
        match kind {
            CounterKind::Standard => self.standard,
            CounterKind::Controlled => self.controlled,
        }
    }
}

impl Default for CounterSeeds {
    fn default() -> Self {
        Self {
            standard: CounterKind::Standard.default_seed(),
            controlled: CounterKind::Controlled.default_seed(),
        }
    }
}

/// Transactional counter resource
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Create every absent counter at its seed; existing counters are untouched
    async fn initialize(&self, seeds: &CounterSeeds) -> Result<(), AllocationError>;

    /// Atomically store value + 1 and return the prior value
    ///
    /// Fails with [`AllocationError::CounterMissing`] when the counter was
    /// never initialized.
    async fn fetch_increment(&self, kind: CounterKind) -> Result<u64, AllocationError>;

    /// Next value to be issued, if the counter exists
    async fn peek(&self, kind: CounterKind) -> Result<Option<u64>, AllocationError>;
}

/// Issues prescription numbers from a [`CounterStore`]
#[derive(Clone)]
pub struct SequenceAllocator {
    store: Arc<dyn CounterStore>,
    seeds: CounterSeeds,
    /// Set once the counters are known to exist; shared by clones
    seeded: Arc<OnceCell<()>>,
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn CounterStore>, seeds: CounterSeeds) -> Self {
        Self {
            store,
            seeds,
            seeded: Arc::new(OnceCell::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }

    /// Create absent counters at their seeds, once per allocator
    ///
    /// Concurrent first callers wait on the same initialization. Existing
    /// counters are never overwritten.
    pub async fn ensure_seeded(&self) -> Result<(), AllocationError> {
        self.seeded
            .get_or_try_init(|| self.store.initialize(&self.seeds))
            .await
            .map(|_| ())
    }

    /// Issue the next number of a counter
    ///
    /// Seeds absent counters on first use, then performs exactly one
    /// increment. Standard numbers are plain decimal; controlled numbers carry
    /// the `C` prefix.
    #[instrument(skip(self))]
    pub async fn allocate(&self, kind: CounterKind) -> Result<PrescriptionNumber, AllocationError> {
        let result = match self.ensure_seeded().await {
            Ok(()) => self.store.fetch_increment(kind).await,
            Err(e) => Err(e),
        };
        let value = result.inspect_err(|e| error!(error = %e, "Allocation failed"))?;

        let number = PrescriptionNumber::issue(kind, value);
        info!(rx_number = %number, "Prescription number allocated");
        Ok(number)
    }

    /// Next values of both counters, without incrementing
    pub async fn snapshot(&self) -> Result<Vec<(CounterKind, Option<u64>)>, AllocationError> {
        let mut values = Vec::with_capacity(CounterKind::ALL.len());
        for kind in CounterKind::ALL {
            values.push((kind, self.store.peek(kind).await?));
        }
        Ok(values)
    }
}
