//! Filter expression model.
//!
//! This module provides:
//! - The operator table and its arity rules
//! - Leaf and AND/OR composite nodes, and the root `Expressions` tree
//! - The JSON wire format
//! - Coercion of raw operands to native field values

pub mod coerce;
pub mod error;
pub mod expr;
pub mod operator;
pub mod tree;
pub mod wire;

pub use coerce::{coerce, coerce_to};
pub use error::{ExpressionError, ExpressionResult};
pub use expr::{Composite, Connective, Expression, Leaf, Operand};
pub use operator::{Arity, Operator};
pub use tree::Expressions;
