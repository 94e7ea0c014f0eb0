//! Relational rendering of compiled expression trees.
//!
//! Produces parameterized `SELECT` statements for PostgreSQL or MySQL; the
//! statements are handed to an external driver, never executed here.

pub mod builder;
pub mod dialect;
pub mod query;

pub use builder::{Join, SqlPredicateBuilder};
pub use dialect::{Dialect, DialectKind, MySql, Postgres};
pub use query::SelectQuery;
