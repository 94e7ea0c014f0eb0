//! Coercion of raw operands to the native type of their target field.

use crate::access::Value;
use crate::catalog::{FieldDescriptor, FieldType};
use crate::expression::{ExpressionError, ExpressionResult, Operand};
use chrono::{DateTime, NaiveDate, Utc};

/// Wire format for date fields
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Coerce `raw` to the type of a resolved field.
///
/// Fields ending on an entity reference are coerced to the referenced
/// entity's identifier type.
pub fn coerce(raw: &Operand, field: &FieldDescriptor) -> ExpressionResult<Value> {
    coerce_to(raw, field.field_type())
}

/// Coerce `raw` to a declared field type. Null and nested lists never coerce.
pub fn coerce_to(raw: &Operand, target: &FieldType) -> ExpressionResult<Value> {
    let fail = || ExpressionError::CoercionError {
        raw: raw.to_string(),
        target_type: target.data_type(),
    };

    let value = match (target, raw) {
        (_, Operand::Null) | (_, Operand::List(_)) => return Err(fail()),

        (FieldType::Integer, Operand::Integer(i)) => Value::Integer(*i),
        (FieldType::Integer, Operand::Decimal(d)) if is_integral(*d) => Value::Integer(*d as i64),
        (FieldType::Integer, Operand::String(s)) => {
            Value::Integer(s.trim().parse::<i64>().map_err(|_| fail())?)
        }

        (FieldType::Decimal, Operand::Integer(i)) => Value::Decimal(*i as f64),
        (FieldType::Decimal, Operand::Decimal(d)) => Value::Decimal(*d),
        (FieldType::Decimal, Operand::String(s)) => match s.trim().parse::<f64>() {
            Ok(d) if d.is_finite() => Value::Decimal(d),
            _ => return Err(fail()),
        },

        (FieldType::Boolean, Operand::Boolean(b)) => Value::Boolean(*b),
        (FieldType::Boolean, Operand::String(s)) => match s.as_str() {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => return Err(fail()),
        },

        (FieldType::String, Operand::String(s)) => Value::String(s.clone()),
        (FieldType::String, Operand::Integer(i)) => Value::String(i.to_string()),
        (FieldType::String, Operand::Decimal(d)) => Value::String(d.to_string()),
        (FieldType::String, Operand::Boolean(b)) => Value::String(b.to_string()),

        (FieldType::Date, Operand::String(s)) => {
            Value::Date(NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| fail())?)
        }

        (FieldType::DateTime, Operand::String(s)) => Value::Timestamp(
            DateTime::parse_from_rfc3339(s)
                .map_err(|_| fail())?
                .with_timezone(&Utc),
        ),
        // epoch milliseconds
        (FieldType::DateTime, Operand::Integer(millis)) => {
            Value::Timestamp(DateTime::<Utc>::from_timestamp_millis(*millis).ok_or_else(fail)?)
        }

        (FieldType::Enum(enum_type), Operand::String(s)) if enum_type.contains(s) => {
            Value::Enum(s.clone())
        }

        _ => return Err(fail()),
    };

    log::trace!("coerced {raw} to {value}");
    Ok(value)
}

fn is_integral(d: f64) -> bool {
    d.is_finite() && d.fract() == 0.0 && d >= i64::MIN as f64 && d < i64::MAX as f64
}
