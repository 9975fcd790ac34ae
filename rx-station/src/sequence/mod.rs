//! Prescription numbering
//!
//! Two independent counters (standard / controlled) behind a transactional
//! [`CounterStore`]. Each allocation is one atomic read-increment-write that
//! returns the prior value; numbers are never handed back.

pub mod allocator;
pub mod storage;

pub use allocator::{AllocationError, CounterSeeds, CounterStore, SequenceAllocator};
pub use storage::{RedbCounterStore, StorageError, StorageResult};
