//! Limit executor implementation.
//!
//! This executor limits the number of records returned from a child executor.
//! It supports both LIMIT and OFFSET functionality for pagination.

use crate::access::Record;
use crate::executor::Executor;
use anyhow::{bail, Result};

/// Executor that limits the number of records returned
pub struct LimitExecutor {
    /// Child executor that produces records
    child: Box<dyn Executor>,
    /// Maximum number of records to return
    limit: usize,
    /// Number of records to skip before returning
    offset: usize,
    /// Number of records skipped so far
    skipped: usize,
    /// Number of records returned so far
    returned: usize,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl LimitExecutor {
    /// Create a new limit executor with limit and offset
    ///
    /// # Arguments
    /// * `child` - The child executor that produces records
    /// * `limit` - The maximum number of records to return
    /// * `offset` - The number of records to skip before returning
    pub fn with_offset(child: Box<dyn Executor>, limit: usize, offset: usize) -> Self {
        Self {
            child,
            limit,
            offset,
            skipped: 0,
            returned: 0,
            initialized: false,
        }
    }
}

impl Executor for LimitExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        // Initialize child executor
        self.child.init()?;

        // Reset counters
        self.skipped = 0;
        self.returned = 0;

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Record>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        // If we've already returned the limit number of records, we're done
        if self.returned >= self.limit {
            return Ok(None);
        }

        // Skip offset number of records if we haven't already
        while self.skipped < self.offset {
            match self.child.next()? {
                Some(_) => self.skipped += 1,
                None => return Ok(None),
            }
        }

        match self.child.next()? {
            Some(record) => {
                self.returned += 1;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}
