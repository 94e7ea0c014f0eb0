//! Filter executor implementation.
//!
//! This executor filters records from a child executor based on a compiled
//! [`RecordPredicate`]. It implements the volcano-style iterator model,
//! producing one matching record at a time.

use crate::access::Record;
use crate::executor::{Executor, RecordPredicate};
use anyhow::{bail, Result};

/// Executor that filters records based on a predicate
pub struct FilterExecutor {
    /// Child executor that produces records
    child: Box<dyn Executor>,
    /// Compiled filter predicate
    predicate: RecordPredicate,
    /// Records pulled from the child so far
    scanned: usize,
    /// Records that passed the predicate so far
    matched: usize,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl FilterExecutor {
    /// Create a new filter executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces records
    /// * `predicate` - The predicate every returned record satisfies
    pub fn new(child: Box<dyn Executor>, predicate: RecordPredicate) -> Self {
        Self {
            child,
            predicate,
            scanned: 0,
            matched: 0,
            initialized: false,
        }
    }

    pub fn scanned(&self) -> usize {
        self.scanned
    }

    pub fn matched(&self) -> usize {
        self.matched
    }
}

impl Executor for FilterExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        // Initialize child executor
        self.child.init()?;
        self.scanned = 0;
        self.matched = 0;

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Record>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        // Keep pulling records from the child until one matches
        while let Some(record) = self.child.next()? {
            self.scanned += 1;
            if self.predicate.evaluate(&record) {
                self.matched += 1;
                return Ok(Some(record));
            }
        }

        log::trace!(
            "filter exhausted: {} scanned, {} matched",
            self.scanned,
            self.matched
        );
        Ok(None)
    }
}
