//! Built-in numeric actions
//!
//! `AbsoluteValue` carries one overload per integral/floating family so the
//! resolver can pick the nearest declared type for a sample value; the
//! rounding actions take the widest floating reading and return a Long.
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use super::{ActionDetail, ActionRegistry, Params};
use crate::error::{Error, Result};
use crate::value::{FieldType, Value};

/// Register the numeric actions in their fixed order
pub(super) fn register(registry: &mut ActionRegistry) {
    use FieldType::{Double, Integer, Long};
    registry.register(ActionDetail::scalar(
        "AbsoluteValue",
        Integer,
        Integer,
        abs_integer,
    ));
    registry.register(ActionDetail::scalar("AbsoluteValue", Long, Long, abs_long));
    registry.register(ActionDetail::scalar(
        "AbsoluteValue",
        Double,
        Double,
        abs_double,
    ));
    registry.register(ActionDetail::scalar("Ceiling", Double, Long, ceiling));
    registry.register(ActionDetail::scalar("Floor", Double, Long, floor));
    registry.register(ActionDetail::scalar("Round", Double, Long, round));
}

fn not_numeric(value: &Value, target: FieldType) -> Error {
    Error::Conversion {
        message: "numeric action applied to a non-numeric value".to_string(),
        source_type: value.field_type(),
        target_type: target,
    }
}

fn abs_integer(value: &Value, _: &Params) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        _ => value
            .as_long()
            .map(|v| Value::Integer(v.saturating_abs().clamp(0, i64::from(i32::MAX)) as i32))
            .ok_or_else(|| not_numeric(value, FieldType::Integer)),
    }
}

fn abs_long(value: &Value, _: &Params) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        _ => value
            .as_long()
            .map(|v| Value::Long(v.saturating_abs()))
            .ok_or_else(|| not_numeric(value, FieldType::Long)),
    }
}

fn abs_double(value: &Value, _: &Params) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        _ => value
            .as_double()
            .map(|v| Value::Double(v.abs()))
            .ok_or_else(|| not_numeric(value, FieldType::Double)),
    }
}

fn ceiling(value: &Value, _: &Params) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        _ => value
            .as_double()
            .map(|v| Value::Long(v.ceil() as i64))
            .ok_or_else(|| not_numeric(value, FieldType::Long)),
    }
}

fn floor(value: &Value, _: &Params) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        _ => value
            .as_double()
            .map(|v| Value::Long(v.floor() as i64))
            .ok_or_else(|| not_numeric(value, FieldType::Long)),
    }
}

fn round(value: &Value, _: &Params) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        _ => value
            .as_double()
            .map(|v| Value::Long(v.round() as i64))
            .ok_or_else(|| not_numeric(value, FieldType::Long)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::ActionCall;
    use super::*;

    fn run(name: &str, value: Value) -> Result<Value> {
        ActionRegistry::with_builtins().apply(&ActionCall::named(name), &value)
    }

    #[test]
    fn test_absolute_value_overloads() {
        assert_eq!(
            run("AbsoluteValue", Value::Integer(-4)).unwrap(),
            Value::Integer(4)
        );
        assert_eq!(
            run("AbsoluteValue", Value::Long(-4)).unwrap(),
            Value::Long(4)
        );
        assert_eq!(
            run("AbsoluteValue", Value::Double(-4.5)).unwrap(),
            Value::Double(4.5)
        );
        // Short widens to the Integer overload
        assert_eq!(
            run("AbsoluteValue", Value::Short(-4)).unwrap(),
            Value::Integer(4)
        );
    }

    #[test]
    fn test_rounding_actions() {
        assert_eq!(run("Ceiling", Value::Double(1.2)).unwrap(), Value::Long(2));
        assert_eq!(run("Floor", Value::Double(1.8)).unwrap(), Value::Long(1));
        assert_eq!(run("Round", Value::Double(1.5)).unwrap(), Value::Long(2));
        // Float widens to the Double overload
        assert_eq!(run("Ceiling", Value::Float(1.2)).unwrap(), Value::Long(2));
    }

    #[test]
    fn test_null_passes_through() {
        assert_eq!(run("AbsoluteValue", Value::Null).unwrap(), Value::Null);
        assert_eq!(run("Round", Value::Null).unwrap(), Value::Null);
    }
}
