//! Root expression container.

use crate::expression::{Connective, Expression, ExpressionResult, Operator};
use crate::expression::expr::{Composite, Operand};

/// The top-level filter: an ordered list of expressions that are implicitly
/// AND-ed together. An empty tree matches every record.
///
/// The builder mutators are not synchronized; share a tree across threads
/// only behind external locking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expressions {
    nodes: Vec<Expression>,
}

impl Expressions {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_nodes(nodes: Vec<Expression>) -> Self {
        Self { nodes }
    }

    /// Append `expr` as an additional top-level conjunct
    pub fn and(&mut self, expr: Expression) -> &mut Self {
        self.nodes.push(expr);
        self
    }

    /// OR `expr` with the whole accumulated conjunction, so the tree becomes
    /// `(existing...) OR expr`. An empty tree matches everything and stays empty.
    pub fn or(&mut self, expr: Expression) -> &mut Self {
        let existing = std::mem::take(&mut self.nodes);
        self.nodes = or_with_existing(existing, expr);
        self
    }

    /// Shorthand for `and(Expression::of(..)?)`
    pub fn and_where<I, V>(
        &mut self,
        field: impl Into<String>,
        operator: Operator,
        values: I,
    ) -> ExpressionResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Operand>,
    {
        let expr = Expression::of(field, operator, values)?;
        Ok(self.and(expr))
    }

    /// Top-level conjuncts, in insertion order
    pub fn nodes(&self) -> &[Expression] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaf comparisons in the whole tree
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().map(Expression::leaf_count).sum()
    }
}

impl From<Expression> for Expressions {
    fn from(expr: Expression) -> Self {
        Self { nodes: vec![expr] }
    }
}

/// Rewrite a conjunct list into `(all existing) OR expr`.
///
/// A single existing node is OR-ed directly; several are first wrapped in an
/// AND composite. An empty conjunction already matches everything, so
/// `TRUE OR expr` leaves the tree empty.
fn or_with_existing(mut existing: Vec<Expression>, expr: Expression) -> Vec<Expression> {
    let base = match existing.len() {
        0 => return existing,
        1 => existing.remove(0),
        _ => Expression::Composite(Composite::from_non_empty(Connective::And, existing)),
    };
    vec![Expression::Composite(Composite::from_non_empty(
        Connective::Or,
        vec![base, expr],
    ))]
}
