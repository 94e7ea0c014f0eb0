use crate::access::Value;
use crate::catalog::{FieldResolver, Schema};
use crate::compiler::PredicateCompiler;
use crate::expression::Expressions;
use crate::paging::{Direction, PageRequest};
use crate::sql::builder::ROOT_ALIAS;
use crate::sql::{Dialect, SqlPredicateBuilder};
use anyhow::Result;
use std::fmt;

/// A rendered SELECT statement and its bind parameters, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SelectQuery {
    /// Render the query selecting the records of `entity` matching `tree`,
    /// optionally sorted and windowed by `page`.
    pub fn render(
        schema: &Schema,
        entity: &str,
        tree: &Expressions,
        page: Option<&PageRequest>,
        dialect: &dyn Dialect,
    ) -> Result<Self> {
        let table = schema.entity(entity)?.table();
        let mut builder = SqlPredicateBuilder::new(schema, dialect);
        let predicate = PredicateCompiler::new(schema, entity).compile(tree, &mut builder)?;

        let mut order_by = Vec::new();
        if let Some(page) = page {
            page.validate()?;
            for order in page.sort.orders() {
                let field = schema.resolve(entity, &order.property)?;
                let direction = match order.direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                order_by.push(format!("{} {}", builder.column(&field), direction));
            }
        }

        let mut sql = format!(
            "SELECT {alias}.* FROM {table} AS {alias}{joins} WHERE {predicate}",
            alias = dialect.quote_identifier(ROOT_ALIAS),
            table = dialect.quote_identifier(&table),
            joins = builder.render_joins(),
        );
        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by.join(", "));
        }
        if let Some(page) = page {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", page.size, page.offset()));
        }

        log::debug!("rendered {} query for {}: {}", dialect.name(), entity, sql);
        Ok(Self {
            sql,
            params: builder.into_params(),
        })
    }

    /// Bind parameters as JSON values
    pub fn params_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.params.iter().map(Value::to_json).collect())
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::employee_schema;
    use crate::catalog::{EntitySchema, FieldType};
    use crate::expression::ExpressionError;
    use crate::paging::Sort;
    use crate::sql::{MySql, Postgres};
    use serde_json::json;

    fn tree(document: serde_json::Value) -> Expressions {
        Expressions::from_json(&document).unwrap()
    }

    #[test]
    fn test_empty_tree_matches_everything() -> Result<()> {
        let schema = employee_schema();
        let query = SelectQuery::render(&schema, "Employee", &Expressions::new(), None, &Postgres)?;
        assert_eq!(query.sql, r#"SELECT "t".* FROM "employee" AS "t" WHERE 1 = 1"#);
        assert!(query.params.is_empty());
        Ok(())
    }

    #[test]
    fn test_render_with_join_sort_and_window() -> Result<()> {
        let schema = employee_schema();
        let filter = tree(json!({
            "lastName": {"$eq": "ibrahim"},
            "department.name": {"$eq": "sales"}
        }));
        let page = PageRequest::of(1, 3).with_sort(Sort::by("firstName").descending());
        let query = SelectQuery::render(&schema, "Employee", &filter, Some(&page), &Postgres)?;

        assert_eq!(
            query.sql,
            concat!(
                r#"SELECT "t".* FROM "employee" AS "t""#,
                r#" LEFT JOIN "department" AS "t_1" ON "t_1"."id" = "t"."department_id""#,
                r#" WHERE ("t"."lastName" = $1 AND "t_1"."name" = $2)"#,
                r#" ORDER BY "t"."firstName" DESC LIMIT 3 OFFSET 3"#
            )
        );
        assert_eq!(query.params_json(), json!(["ibrahim", "sales"]));
        Ok(())
    }

    #[test]
    fn test_render_mysql() -> Result<()> {
        let schema = employee_schema();
        let filter = tree(json!({
            "$or": [
                {"firstName": {"$icontains": "MO"}},
                {"department": {"$eq": null}},
                {"birthDate": {"$lt": "1980-01-01"}}
            ]
        }));
        let query = SelectQuery::render(&schema, "Employee", &filter, None, &MySql)?;
        assert_eq!(
            query.sql,
            "SELECT `t`.* FROM `employee` AS `t` WHERE \
             (LOWER(`t`.`firstName`) LIKE ? OR `t`.`department_id` IS NULL OR `t`.`birthDate` < ?)"
        );
        assert_eq!(query.params_json(), json!(["%mo%", "1980-01-01"]));
        Ok(())
    }

    #[test]
    fn test_sort_by_joined_field_registers_join() -> Result<()> {
        let schema = employee_schema();
        let page = PageRequest::of(0, 10).with_sort(Sort::by("department.name"));
        let query =
            SelectQuery::render(&schema, "Employee", &Expressions::new(), Some(&page), &Postgres)?;
        assert!(query.sql.contains(r#"LEFT JOIN "department" AS "t_1""#));
        assert!(query.sql.ends_with(r#"ORDER BY "t_1"."name" ASC LIMIT 10 OFFSET 0"#));
        Ok(())
    }

    #[test]
    fn test_similar_paths_read_their_own_tables() -> Result<()> {
        let schema = Schema::new()
            .with_entity(
                EntitySchema::new("X")
                    .with_identifier("id")
                    .field("id", FieldType::Integer)
                    .field("name", FieldType::String),
            )
            .with_entity(
                EntitySchema::new("Y")
                    .with_identifier("id")
                    .field("id", FieldType::Integer)
                    .field("b", FieldType::Entity("X".to_string())),
            )
            .with_entity(
                EntitySchema::new("Z")
                    .field("a", FieldType::Entity("Y".to_string()))
                    .field("a_b", FieldType::Entity("X".to_string())),
            );
        let filter = tree(json!({
            "a_b.name": {"$eq": "direct"},
            "a.b.name": {"$eq": "nested"}
        }));
        let query = SelectQuery::render(&schema, "Z", &filter, None, &Postgres)?;
        assert_eq!(
            query.sql,
            concat!(
                r#"SELECT "t".* FROM "z" AS "t""#,
                r#" LEFT JOIN "x" AS "t_1" ON "t_1"."id" = "t"."a_b_id""#,
                r#" LEFT JOIN "y" AS "t_2" ON "t_2"."id" = "t"."a_id""#,
                r#" LEFT JOIN "x" AS "t_3" ON "t_3"."id" = "t_2"."b_id""#,
                r#" WHERE ("t_1"."name" = $1 AND "t_3"."name" = $2)"#
            )
        );
        Ok(())
    }

    #[test]
    fn test_render_errors() {
        let schema = employee_schema();
        let filter = tree(json!({"invalidFieldName": {"$eq": 1}}));
        let err = SelectQuery::render(&schema, "Employee", &filter, None, &Postgres).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExpressionError>(),
            Some(ExpressionError::UnknownField { .. })
        ));

        assert!(
            SelectQuery::render(&schema, "Manager", &Expressions::new(), None, &Postgres).is_err()
        );
        assert!(SelectQuery::render(
            &schema,
            "Employee",
            &Expressions::new(),
            Some(&PageRequest::of(0, 0)),
            &Postgres
        )
        .is_err());
    }
}
