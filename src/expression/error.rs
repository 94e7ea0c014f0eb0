//! Error types for expression parsing and compilation.

use crate::access::DataType;
use crate::expression::Operator;
use thiserror::Error;

/// Errors raised while building, parsing or compiling expressions.
///
/// Every variant is a caller-input error; none of them is retryable.
#[derive(Error, Debug)]
pub enum ExpressionError {
    #[error("Unsupported operator: {token}")]
    UnsupportedOperator { token: String },

    #[error("Operator {operator} does not accept {got} operand(s)")]
    ArityMismatch { operator: Operator, got: usize },

    #[error("Composite expression requires at least one child")]
    EmptyComposite,

    #[error("Unknown field: [{path}]")]
    UnknownField { path: String },

    #[error("Unknown entity: {name}")]
    UnknownEntity { name: String },

    #[error("Ordering operators are not supported for {data_type} fields")]
    NotComparable { data_type: DataType },

    #[error("Operator {operator} cannot be applied to {data_type} fields")]
    TypeMismatch {
        operator: Operator,
        data_type: DataType,
    },

    #[error("Cannot convert {raw} to {target_type}")]
    CoercionError { raw: String, target_type: DataType },

    #[error("Malformed expression: {reason}")]
    MalformedExpression { reason: String },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExpressionError {
    pub(crate) fn unknown_field(path: impl Into<String>) -> Self {
        ExpressionError::UnknownField { path: path.into() }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ExpressionError::MalformedExpression {
            reason: reason.into(),
        }
    }
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
