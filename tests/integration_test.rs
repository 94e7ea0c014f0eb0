use anyhow::Result;
use dynexpr::access::{Record, Value};
use dynexpr::database::Database;
use dynexpr::expression::{Expression, ExpressionError, Expressions, Operand, Operator};
use dynexpr::paging::{PageRequest, Sort};
use dynexpr::sql::{Postgres, SelectQuery};
use serde_json::json;

fn employees() -> Result<Database> {
    Database::from_dataset(&json!({
        "schema": {
            "entities": [
                {
                    "name": "Department",
                    "identifier": "id",
                    "fields": [
                        {"name": "id", "type": "integer"},
                        {"name": "name", "type": "string"}
                    ]
                },
                {
                    "name": "Employee",
                    "identifier": "id",
                    "fields": [
                        {"name": "id", "type": "integer"},
                        {"name": "firstName", "type": "string"},
                        {"name": "lastName", "type": "string"},
                        {"name": "birthDate", "type": "date"},
                        {"name": "age", "type": "integer"},
                        {"name": "hireDate", "type": "datetime"},
                        {"name": "status", "type": {"enum": ["ACTIVE", "RETIRED"], "name": "Status"}},
                        {"name": "department", "type": {"entity": "Department"}}
                    ]
                }
            ]
        },
        "records": {
            "Department": [
                {"id": 1, "name": "engineering"},
                {"id": 2, "name": "sales"}
            ],
            "Employee": [
                {"id": 1, "firstName": "ahmed", "lastName": "ibrahim", "birthDate": "1980-10-10",
                 "age": 10, "hireDate": "2007-12-03T10:15:30Z", "status": "ACTIVE", "department": 1},
                {"id": 2, "firstName": "mohammad", "lastName": "ibrahim", "birthDate": "1985-10-10",
                 "age": 20, "hireDate": "2009-01-01T00:00:00Z", "status": "ACTIVE", "department": 1},
                {"id": 3, "firstName": "mostafa", "lastName": "ahmed", "birthDate": "1988-10-10",
                 "age": 30, "hireDate": "2011-06-01T00:00:00Z", "status": "ACTIVE", "department": 2},
                {"id": 4, "firstName": "wael", "lastName": "ibrahim", "birthDate": "1990-10-10",
                 "age": 40, "hireDate": "2015-03-01T00:00:00Z", "status": "ACTIVE", "department": null},
                {"id": 5, "firstName": "farida", "lastName": "abdullah", "birthDate": "1979-10-10",
                 "age": 50, "hireDate": "2017-01-01T00:00:00Z", "status": "RETIRED", "department": 2}
            ]
        }
    }))
}

fn find(db: &Database, filter: serde_json::Value) -> Result<Vec<Record>> {
    let tree = Expressions::from_json(&filter)?;
    db.find_all("Employee", &tree)
}

fn first_names(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.get("firstName").and_then(Value::as_str).map(String::from))
        .collect()
}

fn expression_error(err: &anyhow::Error) -> Option<&ExpressionError> {
    err.downcast_ref::<ExpressionError>()
}

#[test]
fn test_implicit_and_with_range() -> Result<()> {
    let db = employees()?;
    let found = find(
        &db,
        json!({
            "lastName": {"$eq": "ibrahim"},
            "birthDate": {"$gt": "1981-01-01", "$lte": "1985-10-10"}
        }),
    )?;
    assert_eq!(first_names(&found), vec!["mohammad"]);
    Ok(())
}

#[test]
fn test_paged_and_sorted() -> Result<()> {
    let db = employees()?;
    let request = PageRequest::of(0, 3).with_sort(Sort::by("firstName").descending());
    let page = db.find_page("Employee", &Expressions::new(), &request)?;

    assert_eq!(page.total_elements, 5);
    assert_eq!(page.total_pages(), 2);
    assert!(page.has_next());
    assert_eq!(first_names(&page.content), vec!["wael", "mostafa", "mohammad"]);

    let last = db.find_page("Employee", &Expressions::new(), &PageRequest::of(1, 3).with_sort(
        Sort::by("firstName").descending(),
    ))?;
    assert_eq!(first_names(&last.content), vec!["farida", "ahmed"]);
    assert!(!last.has_next());
    Ok(())
}

#[test]
fn test_or_with_nested_and() -> Result<()> {
    let db = employees()?;
    let found = find(
        &db,
        json!({
            "$or": [
                {"lastName": {"$eq": "ibrahim"}},
                {"$and": [
                    {"firstName": {"$eq": "mostafa"}},
                    {"birthDate": {"$gt": "2000-01-01"}}
                ]}
            ]
        }),
    )?;
    assert_eq!(found.len(), 3);
    Ok(())
}

#[test]
fn test_and_with_nested_or() -> Result<()> {
    let db = employees()?;
    let found = find(
        &db,
        json!({
            "lastName": {"$eq": "ibrahim"},
            "$or": [
                {"firstName": {"$eq": "mohammad"}},
                {"age": {"$in": [10, 30]}}
            ]
        }),
    )?;
    assert_eq!(first_names(&found), vec!["ahmed", "mohammad"]);
    Ok(())
}

#[test]
fn test_or_over_accumulated_conjunction() -> Result<()> {
    let db = employees()?;
    let mut tree = Expressions::new();
    tree.and(Expression::of("hireDate", Operator::Lt, ["2012-01-01T00:00:00Z"])?)
        .or(Expression::and([
            Expression::of("lastName", Operator::Eq, ["ibrahim"])?,
            Expression::of("age", Operator::Eq, [10])?,
        ])?);

    assert_eq!(db.count("Employee", &tree)?, 3);
    Ok(())
}

#[test]
fn test_empty_filter_matches_all() -> Result<()> {
    let db = employees()?;
    assert_eq!(find(&db, json!({}))?.len(), 5);
    Ok(())
}

#[test]
fn test_date_and_timestamp_equality() -> Result<()> {
    let db = employees()?;
    let found = find(
        &db,
        json!({
            "birthDate": {"$eq": "1980-10-10"},
            "hireDate": {"$lte": "2007-12-03T10:15:30.00Z"}
        }),
    )?;
    assert_eq!(first_names(&found), vec!["ahmed"]);
    Ok(())
}

#[test]
fn test_null_checks() -> Result<()> {
    let db = employees()?;
    let mut tree = Expressions::new();
    tree.and(Expression::of("firstName", Operator::Eq, [Operand::Null])?)
        .or(Expression::of("lastName", Operator::Ne, [Operand::Null])?);
    assert_eq!(db.count("Employee", &tree)?, 5);

    let found = find(&db, json!({"firstName": {"$eq": null}}))?;
    assert!(found.is_empty());
    Ok(())
}

#[test]
fn test_contains() -> Result<()> {
    let db = employees()?;
    assert_eq!(find(&db, json!({"lastName": {"$contains": "ibr"}}))?.len(), 3);
    assert_eq!(find(&db, json!({"lastName": {"$contains": "IBR"}}))?.len(), 0);
    assert_eq!(find(&db, json!({"lastName": {"$icontains": "IBR"}}))?.len(), 3);
    Ok(())
}

#[test]
fn test_unsupported_operator() {
    let err = Expressions::from_json(&json!({"lastName": {"$not_supported_operator": "x"}}))
        .unwrap_err();
    assert!(matches!(err, ExpressionError::UnsupportedOperator { .. }));
    assert!(err.to_string().contains("$not_supported_operator"));
}

#[test]
fn test_unknown_field() -> Result<()> {
    let db = employees()?;
    let err = find(&db, json!({"invalidFieldName": {"$eq": 1}})).unwrap_err();
    assert!(matches!(
        expression_error(&err),
        Some(ExpressionError::UnknownField { .. })
    ));
    assert!(err.to_string().contains("invalidFieldName"));

    let err = find(&db, json!({"department.unknown": {"$eq": 1}})).unwrap_err();
    assert!(matches!(
        expression_error(&err),
        Some(ExpressionError::UnknownField { .. })
    ));
    Ok(())
}

#[test]
fn test_builder_api() -> Result<()> {
    let db = employees()?;
    let mut tree = Expressions::new();
    tree.and_where("lastName", Operator::Eq, ["ibrahim"])?
        .and(Expression::or([
            Expression::of("age", Operator::In, [10, 20])?,
            Expression::of("birthDate", Operator::Lt, ["1980-01-01"])?,
        ])?);

    let found = db.find_all("Employee", &tree)?;
    assert_eq!(first_names(&found), vec!["ahmed", "mohammad"]);
    Ok(())
}

#[test]
fn test_nested_entity_paths() -> Result<()> {
    let db = employees()?;
    let sales = find(&db, json!({"department.name": {"$eq": "sales"}}))?;
    assert_eq!(first_names(&sales), vec!["mostafa", "farida"]);

    let engineering = find(&db, json!({"department": {"$in": [1]}}))?;
    assert_eq!(first_names(&engineering), vec!["ahmed", "mohammad"]);

    let unassigned = find(&db, json!({"department": {"$eq": null}}))?;
    assert_eq!(first_names(&unassigned), vec!["wael"]);
    Ok(())
}

#[test]
fn test_enum_fields() -> Result<()> {
    let db = employees()?;
    assert_eq!(first_names(&find(&db, json!({"status": {"$eq": "RETIRED"}}))?), vec!["farida"]);

    let err = find(&db, json!({"status": {"$eq": "FIRED"}})).unwrap_err();
    assert!(matches!(
        expression_error(&err),
        Some(ExpressionError::CoercionError { .. })
    ));
    Ok(())
}

#[test]
fn test_wire_form_survives_round_trip() -> Result<()> {
    let db = employees()?;
    let filter = json!({
        "lastName": {"$eq": "ibrahim"},
        "$or": [
            {"firstName": {"$eq": "mohammad"}},
            {"age": {"$in": [10, 30]}}
        ]
    });
    let tree = Expressions::from_json(&filter)?;
    let reparsed = Expressions::from_json(&tree.to_json())?;
    assert_eq!(
        db.count("Employee", &tree)?,
        db.count("Employee", &reparsed)?
    );
    Ok(())
}

#[test]
fn test_same_tree_renders_sql() -> Result<()> {
    let db = employees()?;
    let tree = Expressions::from_json(&json!({
        "lastName": {"$eq": "ibrahim"},
        "department.name": {"$ne": "sales"}
    }))?;
    let query = SelectQuery::render(db.schema(), "Employee", &tree, None, &Postgres)?;
    assert_eq!(
        query.sql,
        concat!(
            r#"SELECT "t".* FROM "employee" AS "t""#,
            r#" LEFT JOIN "department" AS "t_1" ON "t_1"."id" = "t"."department_id""#,
            r#" WHERE ("t"."lastName" = $1 AND "t_1"."name" <> $2)"#
        )
    );
    assert_eq!(query.params_json(), json!(["ibrahim", "sales"]));
    Ok(())
}
