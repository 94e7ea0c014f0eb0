//! Sequential scan executor implementation.

use crate::access::Record;
use crate::executor::Executor;
use anyhow::{bail, Result};
use std::sync::Arc;

/// Executor for sequential scans over a table snapshot
pub struct SeqScanExecutor {
    records: Arc<Vec<Record>>,
    position: usize,
    initialized: bool,
}

impl SeqScanExecutor {
    /// Create a new sequential scan over `records`.
    ///
    /// The snapshot is shared, so later inserts into the table are not seen.
    pub fn new(records: Arc<Vec<Record>>) -> Self {
        Self {
            records,
            position: 0,
            initialized: false,
        }
    }
}

impl Executor for SeqScanExecutor {
    fn init(&mut self) -> Result<()> {
        self.position = 0;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Record>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        let record = self.records.get(self.position).cloned();
        if record.is_some() {
            self.position += 1;
        }
        Ok(record)
    }
}
