//! Expression node definitions: leaves, composites and their raw operands.

use crate::expression::{ExpressionError, ExpressionResult, Operator};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::fmt;

/// A loosely-typed operand token, as it arrives from the wire or the builder
/// API, before it is coerced to the target field's native type.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    /// A nested sequence; never valid for coercion, kept so that bad input
    /// is reported instead of silently flattened.
    List(Vec<Operand>),
}

impl Operand {
    pub fn is_null(&self) -> bool {
        matches!(self, Operand::Null)
    }

    /// Convert a JSON scalar (or array) into an operand.
    pub fn from_json(value: &serde_json::Value) -> ExpressionResult<Self> {
        match value {
            serde_json::Value::Null => Ok(Operand::Null),
            serde_json::Value::Bool(b) => Ok(Operand::Boolean(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Operand::Integer(i)),
                None => n
                    .as_f64()
                    .map(Operand::Decimal)
                    .ok_or_else(|| ExpressionError::malformed(format!("unrepresentable number {n}"))),
            },
            serde_json::Value::String(s) => Ok(Operand::String(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Operand::from_json)
                .collect::<ExpressionResult<Vec<_>>>()
                .map(Operand::List),
            serde_json::Value::Object(_) => Err(ExpressionError::malformed(format!(
                "operand must be a scalar, got {value}"
            ))),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Operand::Null => serde_json::Value::Null,
            Operand::Boolean(b) => serde_json::Value::Bool(*b),
            Operand::Integer(i) => serde_json::Value::from(*i),
            Operand::Decimal(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Operand::String(s) => serde_json::Value::String(s.clone()),
            Operand::List(items) => {
                serde_json::Value::Array(items.iter().map(Operand::to_json).collect())
            }
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::String(value.to_string())
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Operand::String(value)
    }
}

impl From<bool> for Operand {
    fn from(value: bool) -> Self {
        Operand::Boolean(value)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Integer(value.into())
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Integer(value)
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Decimal(value)
    }
}

impl From<NaiveDate> for Operand {
    fn from(value: NaiveDate) -> Self {
        Operand::String(value.format("%Y-%m-%d").to_string())
    }
}

impl From<DateTime<Utc>> for Operand {
    fn from(value: DateTime<Utc>) -> Self {
        Operand::String(value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl<T: Into<Operand>> From<Option<T>> for Operand {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Operand::Null)
    }
}

/// A single `field <operator> operand(s)` comparison. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    field: String,
    operator: Operator,
    values: Vec<Operand>,
}

impl Leaf {
    /// Create a leaf, validating the operand count against the operator's arity
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        values: Vec<Operand>,
    ) -> ExpressionResult<Self> {
        if !operator.arity().accepts(values.len()) {
            return Err(ExpressionError::ArityMismatch {
                operator,
                got: values.len(),
            });
        }
        Ok(Self {
            field: field.into(),
            operator,
            values,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn values(&self) -> &[Operand] {
        &self.values
    }
}

/// Boolean connective of a composite node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    /// Reserved wire key for this connective
    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => "$and",
            Connective::Or => "$or",
        }
    }
}

/// An ordered AND/OR group of child expressions
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    connective: Connective,
    children: Vec<Expression>,
}

impl Composite {
    pub fn new(connective: Connective, children: Vec<Expression>) -> ExpressionResult<Self> {
        if children.is_empty() {
            return Err(ExpressionError::EmptyComposite);
        }
        Ok(Self {
            connective,
            children,
        })
    }

    pub(crate) fn from_non_empty(connective: Connective, children: Vec<Expression>) -> Self {
        debug_assert!(!children.is_empty());
        Self {
            connective,
            children,
        }
    }

    pub fn connective(&self) -> Connective {
        self.connective
    }

    pub fn children(&self) -> &[Expression] {
        &self.children
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Single field comparison
    Leaf(Leaf),

    /// AND/OR group of nested expressions
    Composite(Composite),
}

impl Expression {
    /// Create a leaf expression, e.g. `Expression::of("age", Operator::In, [10, 20])`
    pub fn of<I, V>(field: impl Into<String>, operator: Operator, values: I) -> ExpressionResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Operand>,
    {
        let values = values.into_iter().map(Into::into).collect();
        Leaf::new(field, operator, values).map(Expression::Leaf)
    }

    /// Create an AND composite of the given children
    pub fn and(children: impl IntoIterator<Item = Expression>) -> ExpressionResult<Self> {
        Composite::new(Connective::And, children.into_iter().collect()).map(Expression::Composite)
    }

    /// Create an OR composite of the given children
    pub fn or(children: impl IntoIterator<Item = Expression>) -> ExpressionResult<Self> {
        Composite::new(Connective::Or, children.into_iter().collect()).map(Expression::Composite)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Expression::Leaf(_))
    }

    /// Number of leaf comparisons in this subtree
    pub fn leaf_count(&self) -> usize {
        match self {
            Expression::Leaf(_) => 1,
            Expression::Composite(composite) => {
                composite.children().iter().map(Expression::leaf_count).sum()
            }
        }
    }
}
