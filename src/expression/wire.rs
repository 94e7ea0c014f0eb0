//! JSON wire format for expression trees.
//!
//! ```json
//! {
//!   "lastName": { "$eq": "ibrahim" },
//!   "birthDate": { "$gt": "1981-01-01", "$lte": "1985-10-10" },
//!   "$or": [ { "firstName": { "$eq": "mohammad" } }, { "age": { "$in": [10, 30] } } ]
//! }
//! ```
//!
//! Top-level keys are AND-ed in document order. Several operators under one
//! field are separate conjuncts. `$and` / `$or` take an array of objects of
//! the same shape. Unary operators take a scalar; `$in` takes an array.

use crate::expression::expr::{Composite, Leaf, Operand};
use crate::expression::{
    Arity, Connective, Expression, ExpressionError, ExpressionResult, Expressions, Operator,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::str::FromStr;

impl Expressions {
    /// Parse a filter document from JSON text
    pub fn from_json_str(text: &str) -> ExpressionResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }

    /// Parse a filter document. `{}` yields an empty tree.
    pub fn from_json(value: &Value) -> ExpressionResult<Self> {
        let document = value
            .as_object()
            .ok_or_else(|| ExpressionError::malformed("filter must be a JSON object"))?;
        parse_conjuncts(document).map(Expressions::from_nodes)
    }

    /// Render the tree back to an equivalent filter document
    pub fn to_json(&self) -> Value {
        Value::Object(conjuncts_to_json(self.nodes()))
    }
}

fn parse_conjuncts(document: &Map<String, Value>) -> ExpressionResult<Vec<Expression>> {
    let mut nodes = Vec::with_capacity(document.len());
    for (key, value) in document {
        match key.as_str() {
            "$and" => nodes.push(parse_group(Connective::And, value)?),
            "$or" => nodes.push(parse_group(Connective::Or, value)?),
            token if token.starts_with('$') => {
                return Err(ExpressionError::UnsupportedOperator {
                    token: token.to_string(),
                })
            }
            field => nodes.extend(parse_field(field, value)?),
        }
    }
    Ok(nodes)
}

fn parse_group(connective: Connective, value: &Value) -> ExpressionResult<Expression> {
    let members = value.as_array().ok_or_else(|| {
        ExpressionError::malformed(format!(
            "{} expects an array of objects",
            connective.as_str()
        ))
    })?;
    let children = members
        .iter()
        .map(|member| parse_group_member(connective, member))
        .collect::<ExpressionResult<Vec<_>>>()?;
    Composite::new(connective, children).map(Expression::Composite)
}

/// One object inside a `$and`/`$or` array is itself a conjunction
fn parse_group_member(connective: Connective, member: &Value) -> ExpressionResult<Expression> {
    let document = member.as_object().ok_or_else(|| {
        ExpressionError::malformed(format!(
            "{} members must be objects, got {member}",
            connective.as_str()
        ))
    })?;
    let mut nodes = parse_conjuncts(document)?;
    match nodes.len() {
        0 => Err(ExpressionError::EmptyComposite),
        1 => Ok(nodes.remove(0)),
        _ => Ok(Expression::Composite(Composite::from_non_empty(
            Connective::And,
            nodes,
        ))),
    }
}

fn parse_field(field: &str, value: &Value) -> ExpressionResult<Vec<Expression>> {
    let entries = value.as_object().ok_or_else(|| {
        ExpressionError::malformed(format!(
            "field {field} must map operators to values, got {value}"
        ))
    })?;
    if entries.is_empty() {
        return Err(ExpressionError::malformed(format!(
            "field {field} has no operator"
        )));
    }

    entries
        .iter()
        .map(|(token, operand)| {
            let operator = Operator::resolve(token)?;
            let values = match operand {
                Value::Array(_) if operator.arity() == Arity::Unary => {
                    return Err(ExpressionError::malformed(format!(
                        "{operator} on {field} expects a single value, got {operand}"
                    )))
                }
                Value::Array(items) => items
                    .iter()
                    .map(Operand::from_json)
                    .collect::<ExpressionResult<Vec<_>>>()?,
                scalar => vec![Operand::from_json(scalar)?],
            };
            Leaf::new(field, operator, values).map(Expression::Leaf)
        })
        .collect()
}

fn conjuncts_to_json(nodes: &[Expression]) -> Map<String, Value> {
    let mut document = Map::new();
    let mut colliding = Vec::new();
    for node in nodes {
        if !insert_node(&mut document, node) {
            colliding.push(node_to_json(node));
        }
    }

    if !colliding.is_empty() {
        match document.get_mut("$and") {
            Some(Value::Array(members)) => members.extend(colliding),
            _ => {
                document.insert("$and".to_string(), Value::Array(colliding));
            }
        }
    }
    document
}

/// Insert `node` under its key; false if the key (or operator) is taken
fn insert_node(document: &mut Map<String, Value>, node: &Expression) -> bool {
    match node {
        Expression::Leaf(leaf) => {
            let entry = document
                .entry(leaf.field().to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            let Value::Object(operators) = entry else {
                return false;
            };
            let token = leaf.operator().as_str();
            if operators.contains_key(token) {
                return false;
            }
            operators.insert(token.to_string(), operands_to_json(leaf));
            true
        }
        Expression::Composite(composite) => {
            let key = composite.connective().as_str();
            if document.contains_key(key) {
                return false;
            }
            let members = composite.children().iter().map(node_to_json).collect();
            document.insert(key.to_string(), Value::Array(members));
            true
        }
    }
}

fn node_to_json(node: &Expression) -> Value {
    Value::Object(conjuncts_to_json(std::slice::from_ref(node)))
}

fn operands_to_json(leaf: &Leaf) -> Value {
    match (leaf.operator(), leaf.values()) {
        (Operator::In, values) => Value::Array(values.iter().map(Operand::to_json).collect()),
        (_, [single]) => single.to_json(),
        (_, values) => Value::Array(values.iter().map(Operand::to_json).collect()),
    }
}

impl FromStr for Expressions {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json_str(s)
    }
}

impl Serialize for Expressions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expressions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Expressions::from_json(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf<V: Into<Operand>>(field: &str, operator: Operator, value: V) -> Expression {
        Expression::of(field, operator, [value]).unwrap()
    }

    #[test]
    fn test_empty_document() {
        let tree = Expressions::from_json_str("{}").unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.to_json(), json!({}));
    }

    #[test]
    fn test_fields_and_operators_are_conjuncts_in_document_order() {
        let tree = Expressions::from_json(&json!({
            "lastName": {"$eq": "ibrahim"},
            "birthDate": {"$gt": "1981-01-01", "$lte": "1985-10-10"}
        }))
        .unwrap();

        assert_eq!(
            tree.nodes(),
            &[
                leaf("lastName", Operator::Eq, "ibrahim"),
                leaf("birthDate", Operator::Gt, "1981-01-01"),
                leaf("birthDate", Operator::Lte, "1985-10-10"),
            ]
        );
    }

    #[test]
    fn test_nested_groups() -> ExpressionResult<()> {
        let tree = Expressions::from_json(&json!({
            "$or": [
                {"lastName": {"$eq": "ibrahim"}},
                {"$and": [
                    {"firstName": {"$eq": "mostafa"}},
                    {"birthDate": {"$gt": "2000-01-01"}}
                ]}
            ]
        }))?;

        let expected = Expression::or([
            leaf("lastName", Operator::Eq, "ibrahim"),
            Expression::and([
                leaf("firstName", Operator::Eq, "mostafa"),
                leaf("birthDate", Operator::Gt, "2000-01-01"),
            ])?,
        ])?;
        assert_eq!(tree.nodes(), &[expected]);
        Ok(())
    }

    #[test]
    fn test_group_member_with_several_keys_is_a_conjunction() -> ExpressionResult<()> {
        let tree = Expressions::from_json(&json!({
            "$or": [
                {"firstName": {"$eq": "mostafa"}, "age": {"$gte": 30}},
                {"age": {"$in": [10]}}
            ]
        }))?;

        let expected = Expression::or([
            Expression::and([
                leaf("firstName", Operator::Eq, "mostafa"),
                leaf("age", Operator::Gte, 30),
            ])?,
            leaf("age", Operator::In, 10),
        ])?;
        assert_eq!(tree.nodes(), &[expected]);
        Ok(())
    }

    #[test]
    fn test_operand_shapes() {
        let tree = Expressions::from_json(&json!({
            "age": {"$in": [10, 30]},
            "firstName": {"$eq": null},
            "department": {"$in": 1}
        }))
        .unwrap();

        let Expression::Leaf(ages) = &tree.nodes()[0] else {
            panic!("expected leaf")
        };
        assert_eq!(ages.values(), &[Operand::Integer(10), Operand::Integer(30)]);

        let Expression::Leaf(name) = &tree.nodes()[1] else {
            panic!("expected leaf")
        };
        assert_eq!(name.values(), &[Operand::Null]);

        let Expression::Leaf(department) = &tree.nodes()[2] else {
            panic!("expected leaf")
        };
        assert_eq!(department.values(), &[Operand::Integer(1)]);
    }

    #[test]
    fn test_unsupported_operator() {
        let err = Expressions::from_json_str(
            r#"{"lastName": {"$not_supported_operator": "ibrahim"}}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported operator: $not_supported_operator");

        assert!(matches!(
            Expressions::from_json(&json!({"$nor": []})),
            Err(ExpressionError::UnsupportedOperator { token }) if token == "$nor"
        ));
    }

    #[test]
    fn test_arity_is_validated() {
        assert!(matches!(
            Expressions::from_json(&json!({"age": {"$in": []}})),
            Err(ExpressionError::ArityMismatch { operator: Operator::In, got: 0 })
        ));
    }

    #[test]
    fn test_unary_operators_reject_arrays() {
        for document in [
            json!({"age": {"$eq": [10]}}),
            json!({"age": {"$gt": [10, 20]}}),
            json!({"lastName": {"$contains": []}}),
        ] {
            assert!(
                matches!(
                    Expressions::from_json(&document),
                    Err(ExpressionError::MalformedExpression { .. })
                ),
                "{document} should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_groups() {
        assert!(matches!(
            Expressions::from_json(&json!({"$or": []})),
            Err(ExpressionError::EmptyComposite)
        ));
        assert!(matches!(
            Expressions::from_json(&json!({"$and": [{}]})),
            Err(ExpressionError::EmptyComposite)
        ));
    }

    #[test]
    fn test_malformed_documents() {
        for document in [
            json!([]),
            json!({"lastName": "ibrahim"}),
            json!({"lastName": {}}),
            json!({"$or": {"lastName": {"$eq": "x"}}}),
            json!({"$or": ["lastName"]}),
            json!({"lastName": {"$eq": {"nested": true}}}),
        ] {
            assert!(
                matches!(
                    Expressions::from_json(&document),
                    Err(ExpressionError::MalformedExpression { .. })
                ),
                "{document}"
            );
        }
        assert!(matches!(
            Expressions::from_json_str("{not json"),
            Err(ExpressionError::Json(_))
        ));
    }

    #[test]
    fn test_to_json_reparses_to_same_tree() {
        let document = json!({
            "lastName": {"$eq": "ibrahim"},
            "age": {"$in": [10, 20]},
            "$or": [
                {"firstName": {"$icontains": "MO"}},
                {"$and": [{"age": {"$gt": 5}}, {"age": {"$lt": 15}}]}
            ]
        });
        let tree = Expressions::from_json(&document).unwrap();
        assert_eq!(tree.to_json(), document);
        assert_eq!(Expressions::from_json(&tree.to_json()).unwrap(), tree);
    }

    #[test]
    fn test_colliding_conjuncts_move_under_and() {
        let mut tree = Expressions::new();
        tree.and(leaf("age", Operator::Gt, 10))
            .and(leaf("age", Operator::Gt, 20));
        assert_eq!(
            tree.to_json(),
            json!({"age": {"$gt": 10}, "$and": [{"age": {"$gt": 20}}]})
        );
    }

    #[test]
    fn test_serde_impls() {
        let tree: Expressions =
            serde_json::from_str(r#"{"status": {"$eq": "RETIRED"}}"#).unwrap();
        assert_eq!(tree.nodes(), &[leaf("status", Operator::Eq, "RETIRED")]);
        assert_eq!(
            serde_json::to_string(&tree).unwrap(),
            r#"{"status":{"$eq":"RETIRED"}}"#
        );

        let err = serde_json::from_str::<Expressions>(r#"{"a": {"$bad": 1}}"#).unwrap_err();
        assert!(err.to_string().contains("$bad"));

        let parsed: Expressions = r#"{"a": {"$ne": 1}}"#.parse().unwrap();
        assert_eq!(parsed.len(), 1);
    }
}
