//! Parameterized WHERE-clause builder.

use crate::access::Value;
use crate::catalog::{FieldDescriptor, Schema};
use crate::compiler::{Comparison, PredicateBuilder};
use crate::sql::Dialect;

/// Alias of the queried entity's table
pub const ROOT_ALIAS: &str = "t";

/// A LEFT JOIN registered while compiling a dotted path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Field names leading from the root to the joined entity
    pub path: Vec<String>,
    /// `t_<n>`, numbered in registration order
    pub alias: String,
    pub table: String,
    pub parent_alias: String,
    /// Foreign key column on the parent, `<field>_id`
    pub foreign_key: String,
    /// Identifier column on the joined table
    pub identifier: String,
}

/// [`PredicateBuilder`] rendering SQL text with bind placeholders.
///
/// Every navigation step of a dotted path registers one join per distinct
/// path prefix, keyed by the prefix's field names. Paths ending on an entity reference read the foreign key
/// column directly.
pub struct SqlPredicateBuilder<'a> {
    schema: &'a Schema,
    dialect: &'a dyn Dialect,
    joins: Vec<Join>,
    params: Vec<Value>,
}

impl<'a> SqlPredicateBuilder<'a> {
    pub fn new(schema: &'a Schema, dialect: &'a dyn Dialect) -> Self {
        Self {
            schema,
            dialect,
            joins: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    /// Qualified column for `field`, registering the joins it needs
    pub fn column(&mut self, field: &FieldDescriptor) -> String {
        let names = field.field_names();
        let segments = field.segments();
        let hops = match field.reference() {
            Some(_) => segments.len().saturating_sub(2),
            None => segments.len().saturating_sub(1),
        };

        let mut alias = ROOT_ALIAS.to_string();
        for i in 0..hops {
            alias = self.join(&names[..=i], &alias, &segments[i + 1].entity);
        }

        let column = match field.reference() {
            Some(_) => format!("{}_id", names[hops]),
            None => names[hops].to_string(),
        };
        format!(
            "{}.{}",
            self.dialect.quote_identifier(&alias),
            self.dialect.quote_identifier(&column)
        )
    }

    fn join(&mut self, prefix: &[&str], parent_alias: &str, target: &str) -> String {
        if let Some(join) = self.joins.iter().find(|join| join.path == prefix) {
            return join.alias.clone();
        }
        let alias = format!("{}_{}", ROOT_ALIAS, self.joins.len() + 1);

        let target = self.schema.get(target);
        let table = target.map_or_else(|| prefix.join("_"), |entity| entity.table());
        // identifiers are only mandatory for referenced-by-id entities
        let identifier = target
            .and_then(|entity| entity.identifier.clone())
            .unwrap_or_else(|| "id".to_string());
        let field = prefix.last().copied().unwrap_or_default();

        log::trace!("join {table} as {alias} via {parent_alias}.{field}_id");
        self.joins.push(Join {
            path: prefix.iter().map(|name| name.to_string()).collect(),
            alias: alias.clone(),
            table,
            parent_alias: parent_alias.to_string(),
            foreign_key: format!("{field}_id"),
            identifier,
        });
        alias
    }

    fn bind(&mut self, value: Value) -> String {
        let placeholder = self.dialect.placeholder(self.params.len());
        self.params.push(value);
        placeholder
    }

    /// Render the registered joins as `LEFT JOIN` clauses
    pub fn render_joins(&self) -> String {
        let q = |ident: &str| self.dialect.quote_identifier(ident);
        self.joins
            .iter()
            .map(|join| {
                format!(
                    " LEFT JOIN {} AS {} ON {}.{} = {}.{}",
                    q(&join.table),
                    q(&join.alias),
                    q(&join.alias),
                    q(&join.identifier),
                    q(&join.parent_alias),
                    q(&join.foreign_key)
                )
            })
            .collect()
    }
}

impl PredicateBuilder for SqlPredicateBuilder<'_> {
    type Predicate = String;

    fn always(&mut self) -> String {
        "1 = 1".to_string()
    }

    fn and(&mut self, children: Vec<String>) -> String {
        format!("({})", children.join(" AND "))
    }

    fn or(&mut self, children: Vec<String>) -> String {
        format!("({})", children.join(" OR "))
    }

    fn is_null(&mut self, field: &FieldDescriptor, negated: bool) -> String {
        let column = self.column(field);
        if negated {
            format!("{column} IS NOT NULL")
        } else {
            format!("{column} IS NULL")
        }
    }

    fn compare(&mut self, field: &FieldDescriptor, comparison: Comparison, value: Value) -> String {
        let column = self.column(field);
        let placeholder = self.bind(value);
        format!("{column} {comparison} {placeholder}")
    }

    fn in_list(&mut self, field: &FieldDescriptor, values: Vec<Value>) -> String {
        let column = self.column(field);
        let placeholders: Vec<String> = values.into_iter().map(|v| self.bind(v)).collect();
        format!("{column} IN ({})", placeholders.join(", "))
    }

    fn like(&mut self, field: &FieldDescriptor, pattern: String, ignore_case: bool) -> String {
        let column = self.column(field);
        let placeholder = self.bind(Value::String(pattern));
        if ignore_case {
            format!("LOWER({column}) LIKE {placeholder}")
        } else {
            format!("{column} LIKE {placeholder}")
        }
    }
}
