//! Predicate compiler.
//!
//! Walks an [`Expressions`] tree, resolves and coerces every leaf against the
//! schema, and emits backend predicates through a [`PredicateBuilder`].
//! Compilation is all-or-nothing: the first failing leaf aborts the call.

use crate::access::{DataType, Value};
use crate::catalog::{FieldDescriptor, FieldResolver};
use crate::expression::{
    coerce, Connective, Expression, ExpressionError, ExpressionResult, Expressions, Leaf, Operand,
    Operator,
};
use std::cmp::Ordering;
use std::fmt;

/// Binary comparison emitted for equality and ordering operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn from_operator(operator: Operator) -> Option<Self> {
        match operator {
            Operator::Eq => Some(Comparison::Eq),
            Operator::Ne => Some(Comparison::Ne),
            Operator::Lt => Some(Comparison::Lt),
            Operator::Lte => Some(Comparison::Le),
            Operator::Gt => Some(Comparison::Gt),
            Operator::Gte => Some(Comparison::Ge),
            Operator::In | Operator::Contains | Operator::IContains => None,
        }
    }

    /// `<`, `<=`, `>` or `>=`
    pub fn is_ordering(&self) -> bool {
        !matches!(self, Comparison::Eq | Comparison::Ne)
    }

    /// SQL spelling of the comparison
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }

    /// Whether `left.cmp(right) == ordering` satisfies this comparison
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::Ne => ordering != Ordering::Equal,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Le => ordering != Ordering::Greater,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Ge => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend collaborator that assembles compiled predicates.
///
/// Methods take `&mut self` so that builders can accumulate state such as
/// bind parameters or joins while a tree is compiled.
pub trait PredicateBuilder {
    /// The backend's predicate type
    type Predicate;

    /// Predicate matching every record
    fn always(&mut self) -> Self::Predicate;

    /// Conjunction of two or more predicates
    fn and(&mut self, children: Vec<Self::Predicate>) -> Self::Predicate;

    /// Disjunction of two or more predicates
    fn or(&mut self, children: Vec<Self::Predicate>) -> Self::Predicate;

    /// `IS NULL`, or `IS NOT NULL` when `negated`
    fn is_null(&mut self, field: &FieldDescriptor, negated: bool) -> Self::Predicate;

    fn compare(
        &mut self,
        field: &FieldDescriptor,
        comparison: Comparison,
        value: Value,
    ) -> Self::Predicate;

    fn in_list(&mut self, field: &FieldDescriptor, values: Vec<Value>) -> Self::Predicate;

    /// Pattern match. With `ignore_case` the pattern is already lower-cased
    /// and the attribute must be lower-cased before matching.
    fn like(&mut self, field: &FieldDescriptor, pattern: String, ignore_case: bool)
        -> Self::Predicate;

    /// Wrap a substring in wildcard markers, escaping the marker characters
    fn contains_pattern(&self, needle: &str) -> String {
        let mut pattern = String::with_capacity(needle.len() + 2);
        pattern.push('%');
        for c in needle.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }
}

/// Compiles expression trees rooted at one entity
pub struct PredicateCompiler<'a, R: FieldResolver + ?Sized> {
    resolver: &'a R,
    entity: &'a str,
}

impl<'a, R: FieldResolver + ?Sized> PredicateCompiler<'a, R> {
    pub fn new(resolver: &'a R, entity: &'a str) -> Self {
        Self { resolver, entity }
    }

    /// Compile `tree` into a single backend predicate.
    ///
    /// An empty tree yields `builder.always()`; top-level nodes are AND-ed.
    pub fn compile<B: PredicateBuilder>(
        &self,
        tree: &Expressions,
        builder: &mut B,
    ) -> ExpressionResult<B::Predicate> {
        log::debug!(
            "compiling {} top-level node(s) for {}",
            tree.len(),
            self.entity
        );
        self.fold(Connective::And, tree.nodes(), builder)
    }

    fn fold<B: PredicateBuilder>(
        &self,
        connective: Connective,
        nodes: &[Expression],
        builder: &mut B,
    ) -> ExpressionResult<B::Predicate> {
        match nodes {
            [] => Ok(builder.always()),
            [single] => self.compile_node(single, builder),
            _ => {
                let children = nodes
                    .iter()
                    .map(|node| self.compile_node(node, builder))
                    .collect::<ExpressionResult<Vec<_>>>()?;
                Ok(match connective {
                    Connective::And => builder.and(children),
                    Connective::Or => builder.or(children),
                })
            }
        }
    }

    fn compile_node<B: PredicateBuilder>(
        &self,
        node: &Expression,
        builder: &mut B,
    ) -> ExpressionResult<B::Predicate> {
        match node {
            Expression::Leaf(leaf) => self.compile_leaf(leaf, builder),
            Expression::Composite(composite) => {
                self.fold(composite.connective(), composite.children(), builder)
            }
        }
    }

    fn compile_leaf<B: PredicateBuilder>(
        &self,
        leaf: &Leaf,
        builder: &mut B,
    ) -> ExpressionResult<B::Predicate> {
        let field = self.resolver.resolve(self.entity, leaf.field())?;
        let operator = leaf.operator();
        log::trace!(
            "leaf {} {} with {} operand(s)",
            field.path(),
            operator,
            leaf.values().len()
        );

        match (operator, Comparison::from_operator(operator)) {
            (_, Some(comparison)) => {
                let raw = single_operand(leaf);
                if raw.is_null() && !comparison.is_ordering() {
                    return Ok(builder.is_null(&field, comparison == Comparison::Ne));
                }
                if comparison.is_ordering() && !field.is_comparable() {
                    return Err(ExpressionError::NotComparable {
                        data_type: field.data_type(),
                    });
                }
                let value = coerce(raw, &field)?;
                Ok(builder.compare(&field, comparison, value))
            }
            (Operator::In, None) => {
                let values = leaf
                    .values()
                    .iter()
                    .map(|raw| coerce(raw, &field))
                    .collect::<ExpressionResult<Vec<_>>>()?;
                Ok(builder.in_list(&field, values))
            }
            (_, None) => {
                if field.data_type() != DataType::Varchar {
                    return Err(ExpressionError::TypeMismatch {
                        operator,
                        data_type: field.data_type(),
                    });
                }
                let ignore_case = operator == Operator::IContains;
                let needle = match coerce(single_operand(leaf), &field)? {
                    Value::String(s) if ignore_case => s.to_lowercase(),
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                let pattern = builder.contains_pattern(&needle);
                Ok(builder.like(&field, pattern, ignore_case))
            }
        }
    }
}

/// Operand of a unary leaf; arity is checked when the leaf is built
fn single_operand(leaf: &Leaf) -> &Operand {
    &leaf.values()[0]
}
