//! Operator table for leaf expressions.

use crate::expression::{ExpressionError, ExpressionResult};
use std::fmt;
use std::str::FromStr;

/// How many operands an operator takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one operand
    Unary,
    /// One or more operands
    Variadic,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Unary => count == 1,
            Arity::Variadic => count >= 1,
        }
    }
}

/// Comparison operators supported in leaf expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Equality
    Eq,
    Ne,

    // Ordering
    Gt,
    Gte,
    Lt,
    Lte,

    // Membership
    In,

    // String matching
    Contains,
    IContains,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::In,
        Operator::Contains,
        Operator::IContains,
    ];

    /// Resolve a wire token (e.g. `$eq`) to an operator. Tokens are case-sensitive.
    pub fn resolve(token: &str) -> ExpressionResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == token)
            .ok_or_else(|| ExpressionError::UnsupportedOperator {
                token: token.to_string(),
            })
    }

    /// Get the wire token for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::In => "$in",
            Operator::Contains => "$contains",
            Operator::IContains => "$icontains",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operator::In => Arity::Variadic,
            _ => Arity::Unary,
        }
    }

    /// Whether the target field must have an ordering
    pub fn requires_ordering(&self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte
        )
    }

    /// Whether a NULL operand is meaningful (compiles to a null test)
    pub fn accepts_null(&self) -> bool {
        matches!(self, Operator::Eq | Operator::Ne)
    }

    /// Whether the operator matches substrings of string fields
    pub fn is_textual(&self) -> bool {
        matches!(self, Operator::Contains | Operator::IContains)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}
