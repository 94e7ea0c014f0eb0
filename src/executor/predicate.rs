//! In-memory predicate backend.
//!
//! [`MemoryPredicateBuilder`] turns compiled leaves into [`RecordPredicate`]
//! trees that the filter executor evaluates against records. Comparisons
//! with a NULL attribute are false, as in a SQL `WHERE` clause.

use crate::access::{Record, Value};
use crate::catalog::FieldDescriptor;
use crate::compiler::{Comparison, PredicateBuilder};

/// Predicate evaluated against a single record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPredicate {
    True,
    And(Vec<RecordPredicate>),
    Or(Vec<RecordPredicate>),
    IsNull(Vec<String>),
    IsNotNull(Vec<String>),
    Compare {
        path: Vec<String>,
        comparison: Comparison,
        value: Value,
    },
    In {
        path: Vec<String>,
        values: Vec<Value>,
    },
    Like {
        path: Vec<String>,
        pattern: LikePattern,
        ignore_case: bool,
    },
}

impl RecordPredicate {
    pub fn evaluate(&self, record: &Record) -> bool {
        match self {
            RecordPredicate::True => true,
            RecordPredicate::And(children) => children.iter().all(|p| p.evaluate(record)),
            RecordPredicate::Or(children) => children.iter().any(|p| p.evaluate(record)),
            RecordPredicate::IsNull(path) => record.lookup(path).is_null(),
            RecordPredicate::IsNotNull(path) => !record.lookup(path).is_null(),
            RecordPredicate::Compare {
                path,
                comparison,
                value,
            } => record
                .lookup(path)
                .compare(value)
                .is_some_and(|ordering| comparison.holds(ordering)),
            RecordPredicate::In { path, values } => {
                let actual = record.lookup(path);
                values.iter().any(|v| actual.matches(v))
            }
            RecordPredicate::Like {
                path,
                pattern,
                ignore_case,
            } => match record.lookup(path).as_str() {
                Some(text) if *ignore_case => pattern.matches(&text.to_lowercase()),
                Some(text) => pattern.matches(text),
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LikeToken {
    Literal(char),
    /// `_`
    AnyOne,
    /// `%`
    AnyRun,
}

/// A parsed LIKE pattern: `%` matches any run, `_` one character, and `\`
/// escapes the next character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikePattern {
    source: String,
    tokens: Vec<LikeToken>,
}

impl LikePattern {
    pub fn parse(source: &str) -> Self {
        let mut tokens = Vec::with_capacity(source.len());
        let mut chars = source.chars();
        while let Some(c) = chars.next() {
            tokens.push(match c {
                '%' => LikeToken::AnyRun,
                '_' => LikeToken::AnyOne,
                // a trailing backslash is literal
                '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
                c => LikeToken::Literal(c),
            });
        }
        Self {
            source: source.to_string(),
            tokens,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        let (mut t, mut p) = (0, 0);
        // (token index of the last %, text index it currently absorbs up to)
        let mut backtrack: Option<(usize, usize)> = None;

        while t < text.len() {
            match self.tokens.get(p) {
                Some(LikeToken::AnyOne) => {
                    t += 1;
                    p += 1;
                }
                Some(LikeToken::Literal(c)) if *c == text[t] => {
                    t += 1;
                    p += 1;
                }
                Some(LikeToken::AnyRun) => {
                    backtrack = Some((p, t));
                    p += 1;
                }
                _ => match backtrack {
                    Some((run, absorbed)) => {
                        p = run + 1;
                        t = absorbed + 1;
                        backtrack = Some((run, absorbed + 1));
                    }
                    None => return false,
                },
            }
        }

        self.tokens[p..]
            .iter()
            .all(|token| *token == LikeToken::AnyRun)
    }
}

/// [`PredicateBuilder`] producing [`RecordPredicate`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryPredicateBuilder;

fn path_of(field: &FieldDescriptor) -> Vec<String> {
    field.field_names().into_iter().map(String::from).collect()
}

impl PredicateBuilder for MemoryPredicateBuilder {
    type Predicate = RecordPredicate;

    fn always(&mut self) -> RecordPredicate {
        RecordPredicate::True
    }

    fn and(&mut self, children: Vec<RecordPredicate>) -> RecordPredicate {
        RecordPredicate::And(children)
    }

    fn or(&mut self, children: Vec<RecordPredicate>) -> RecordPredicate {
        RecordPredicate::Or(children)
    }

    fn is_null(&mut self, field: &FieldDescriptor, negated: bool) -> RecordPredicate {
        if negated {
            RecordPredicate::IsNotNull(path_of(field))
        } else {
            RecordPredicate::IsNull(path_of(field))
        }
    }

    fn compare(
        &mut self,
        field: &FieldDescriptor,
        comparison: Comparison,
        value: Value,
    ) -> RecordPredicate {
        RecordPredicate::Compare {
            path: path_of(field),
            comparison,
            value,
        }
    }

    fn in_list(&mut self, field: &FieldDescriptor, values: Vec<Value>) -> RecordPredicate {
        RecordPredicate::In {
            path: path_of(field),
            values,
        }
    }

    fn like(&mut self, field: &FieldDescriptor, pattern: String, ignore_case: bool) -> RecordPredicate {
        RecordPredicate::Like {
            path: path_of(field),
            pattern: LikePattern::parse(&pattern),
            ignore_case,
        }
    }
}
