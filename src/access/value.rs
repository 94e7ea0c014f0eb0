use crate::access::Record;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::cmp::Ordering;
use std::fmt;

/// Semantic type tags for resolved fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Integer,
    Decimal,
    Varchar,
    Date,
    Timestamp,
    Enum,
    Entity,
}

impl DataType {
    /// Whether ordering operators (`$gt`, `$lt`, ...) make sense for this type
    pub fn is_comparable(&self) -> bool {
        matches!(
            self,
            DataType::Integer
                | DataType::Decimal
                | DataType::Varchar
                | DataType::Date
                | DataType::Timestamp
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Decimal => "decimal",
            DataType::Varchar => "string",
            DataType::Date => "date",
            DataType::Timestamp => "datetime",
            DataType::Enum => "enum",
            DataType::Entity => "entity",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native values, produced by coercion and stored in records
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Enum(String),
    Entity(Box<Record>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Compare two non-NULL values of compatible types.
    ///
    /// Integers and decimals compare numerically with each other. Returns
    /// `None` for NULLs, mismatched types and values without an ordering.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Decimal(a), Value::Decimal(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Decimal(b)) => (*a as f64).partial_cmp(b),
            (Value::Decimal(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Enum(a), Value::Enum(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Equality as used by filters: numeric types compare across
    /// representations, NULL never equals anything.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Entity(a), Value::Entity(b)) => a == b,
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }

    /// Render the value back into its wire representation
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Decimal(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) | Value::Enum(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Value::Timestamp(t) => {
                serde_json::Value::String(t.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Entity(record) => record.to_json(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::String(s) | Value::Enum(s) => write!(f, "'{}'", s),
            Value::Date(_) | Value::Timestamp(_) => match self.to_json() {
                serde_json::Value::String(s) => write!(f, "'{}'", s),
                other => write!(f, "{}", other),
            },
            Value::Entity(_) => f.write_str("<entity>"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparable_types() {
        assert!(DataType::Integer.is_comparable());
        assert!(DataType::Varchar.is_comparable());
        assert!(DataType::Date.is_comparable());
        assert!(DataType::Timestamp.is_comparable());
        assert!(!DataType::Boolean.is_comparable());
        assert!(!DataType::Enum.is_comparable());
        assert!(!DataType::Entity.is_comparable());
    }

    #[test]
    fn test_numeric_comparison_across_representations() {
        assert_eq!(
            Value::Integer(10).compare(&Value::Decimal(10.5)),
            Some(Ordering::Less)
        );
        assert!(Value::Decimal(20.0).matches(&Value::Integer(20)));
        assert_eq!(Value::Integer(1).compare(&Value::String("1".into())), None);
    }

    #[test]
    fn test_null_never_matches() {
        assert!(!Value::Null.matches(&Value::Null));
        assert!(!Value::Integer(1).matches(&Value::Null));
        assert_eq!(Value::Null.compare(&Value::Integer(1)), None);
    }

    #[test]
    fn test_to_json() {
        let date = NaiveDate::from_ymd_opt(1980, 10, 10).unwrap();
        assert_eq!(Value::Date(date).to_json(), serde_json::json!("1980-10-10"));

        let instant = DateTime::parse_from_rfc3339("2007-12-03T10:15:30Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            Value::Timestamp(instant).to_json(),
            serde_json::json!("2007-12-03T10:15:30.000Z")
        );
        assert_eq!(Value::Integer(42).to_json(), serde_json::json!(42));
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_display_quotes_textual_values() {
        let date = NaiveDate::from_ymd_opt(1981, 1, 1).unwrap();
        assert_eq!(Value::Date(date).to_string(), "'1981-01-01'");
        assert_eq!(Value::String("ibrahim".into()).to_string(), "'ibrahim'");
        assert_eq!(Value::Enum("RETIRED".into()).to_string(), "'RETIRED'");
        assert_eq!(Value::Integer(10).to_string(), "10");
        assert_eq!(Value::Null.to_string(), "NULL");
    }
}
