pub mod access;
pub mod catalog;
pub mod compiler;
pub mod database;
pub mod executor;
pub mod expression;
pub mod paging;
pub mod sql;
