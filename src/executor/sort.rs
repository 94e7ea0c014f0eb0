//! Sort executor implementation.
//!
//! This executor sorts records from a child executor based on one or more
//! sort criteria. It materializes all records from the child executor into
//! memory before sorting, then returns them in the sorted order.
//!
//! Supports:
//! - Multi-field sorting, including dotted paths into nested entities
//! - NULL handling (NULLs first or last)
//! - ASC/DESC ordering per field

use crate::access::{Record, Value};
use crate::executor::Executor;
use anyhow::{bail, Result};
use std::cmp::Ordering;

/// Sort order for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// NULL ordering preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrder {
    First,
    Last,
}

/// Sort criteria for a single field
#[derive(Debug, Clone)]
pub struct SortCriteria {
    /// Field names leading from the record to the sort key
    pub path: Vec<String>,
    /// Sort order (ASC/DESC)
    pub order: SortOrder,
    /// NULL ordering (FIRST/LAST)
    pub null_order: NullOrder,
}

impl SortCriteria {
    /// Create new sort criteria with default NULL ordering
    /// (NULLs first for ASC, NULLs last for DESC)
    pub fn new(path: Vec<String>, order: SortOrder) -> Self {
        let null_order = match order {
            SortOrder::Asc => NullOrder::First,
            SortOrder::Desc => NullOrder::Last,
        };
        Self {
            path,
            order,
            null_order,
        }
    }
}

/// Executor that sorts records based on multiple criteria
pub struct SortExecutor {
    /// Child executor that produces records
    child: Box<dyn Executor>,
    /// Sort criteria (in order of precedence)
    criteria: Vec<SortCriteria>,
    /// Materialized and sorted records
    sorted_records: Vec<Record>,
    /// Current position in sorted_records
    current_position: usize,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl SortExecutor {
    /// Create a new sort executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces records
    /// * `criteria` - Sort criteria in order of precedence
    pub fn new(child: Box<dyn Executor>, criteria: Vec<SortCriteria>) -> Self {
        Self {
            child,
            criteria,
            sorted_records: Vec::new(),
            current_position: 0,
            initialized: false,
        }
    }

    /// Compare two values according to sort order and null handling
    fn compare_values(v1: &Value, v2: &Value, order: SortOrder, null_order: NullOrder) -> Ordering {
        match (v1, v2) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => match null_order {
                NullOrder::First => Ordering::Less,
                NullOrder::Last => Ordering::Greater,
            },
            (_, Value::Null) => match null_order {
                NullOrder::First => Ordering::Greater,
                NullOrder::Last => Ordering::Less,
            },
            // Values without a mutual ordering keep their input order
            (v1, v2) => {
                let cmp = v1.compare(v2).unwrap_or(Ordering::Equal);
                match order {
                    SortOrder::Asc => cmp,
                    SortOrder::Desc => cmp.reverse(),
                }
            }
        }
    }

    /// Sort the records based on the criteria
    fn sort_records(&mut self) {
        let criteria = &self.criteria;
        let mut keyed: Vec<(Vec<Value>, Record)> = self
            .sorted_records
            .drain(..)
            .map(|record| {
                let keys = criteria.iter().map(|c| record.lookup(&c.path)).collect();
                (keys, record)
            })
            .collect();

        // Stable sort, so ties keep scan order
        keyed.sort_by(|a, b| {
            for (i, criteria) in criteria.iter().enumerate() {
                let cmp = Self::compare_values(&a.0[i], &b.0[i], criteria.order, criteria.null_order);
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            Ordering::Equal
        });

        self.sorted_records = keyed.into_iter().map(|(_, record)| record).collect();
    }
}

impl Executor for SortExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        // Initialize child executor
        self.child.init()?;

        // Validate sort criteria
        if let Some(criteria) = self.criteria.iter().find(|c| c.path.is_empty()) {
            bail!("Sort criteria {:?} has an empty field path", criteria);
        }

        // Materialize all records from child
        self.sorted_records.clear();
        while let Some(record) = self.child.next()? {
            self.sorted_records.push(record);
        }

        self.sort_records();

        // Reset position
        self.current_position = 0;

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Record>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        if self.current_position >= self.sorted_records.len() {
            return Ok(None);
        }

        let record = self.sorted_records[self.current_position].clone();
        self.current_position += 1;
        Ok(Some(record))
    }
}
