//! Executor layer for in-memory query execution.
//!
//! This module implements the Volcano-style iterator model over entity
//! records. Each executor produces records one at a time via `next()`,
//! so scans, filters, sorts and limits compose into a pipeline.

use crate::access::Record;
use anyhow::Result;

pub mod filter;
pub mod limit;
pub mod predicate;
pub mod seq_scan;
pub mod sort;

// Re-export executors
pub use filter::FilterExecutor;
pub use limit::LimitExecutor;
pub use predicate::{LikePattern, MemoryPredicateBuilder, RecordPredicate};
pub use seq_scan::SeqScanExecutor;
pub use sort::{NullOrder, SortCriteria, SortExecutor, SortOrder};

/// Trait for all query executors
pub trait Executor: Send {
    /// Initialize the executor. This must be called before `next()`.
    fn init(&mut self) -> Result<()>;

    /// Get the next record from the executor.
    /// Returns None when there are no more records.
    fn next(&mut self) -> Result<Option<Record>>;
}

/// Initialize `executor` and drain it into a vector
pub fn collect(executor: &mut dyn Executor) -> Result<Vec<Record>> {
    executor.init()?;
    let mut records = Vec::new();
    while let Some(record) = executor.next()? {
        records.push(record);
    }
    Ok(records)
}
