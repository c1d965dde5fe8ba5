//! Type conversion service
//!
//! The conversion matrix between declared field types. Numeric conversions
//! preserve sign and saturate at the narrower target's bounds. Converting a
//! null value yields null in the target type for every pair - a universal
//! invariant, never an error. Boolean to numeric types is `true=1, false=0`,
//! and Boolean to Character is the numeric `'\u{1}'/'\u{0}'` form.
//!
//! Hosts may register custom converters per `(source, target)` pair before
//! the registry is shared; the registry is read-only afterwards.
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::value::{FieldType, Value};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;

/// A registered conversion function
pub type ConverterFn = Box<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// A converter resolved for one `(source, target)` pair
pub enum Converter<'a> {
    /// Served by the built-in matrix
    Builtin(FieldType),
    /// Served by a host-registered function
    Custom(&'a ConverterFn),
}

impl Converter<'_> {
    /// Apply the converter; null always passes through as null
    pub fn convert(&self, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            Converter::Builtin(target) => builtin_convert(value, *target),
            Converter::Custom(f) => f(value),
        }
    }
}

/// Registry of converters between declared field types
#[derive(Default)]
pub struct ConverterRegistry {
    custom: HashMap<(FieldType, FieldType), ConverterFn>,
}

impl ConverterRegistry {
    /// A registry serving the built-in matrix
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom converter for one pair, overriding the built-in one
    pub fn register<F>(&mut self, source: FieldType, target: FieldType, converter: F)
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.custom.insert((source, target), Box::new(converter));
    }

    /// Resolve the converter for a pair, if one exists
    pub fn find_converter(&self, source: FieldType, target: FieldType) -> Option<Converter<'_>> {
        if let Some(f) = self.custom.get(&(source, target)) {
            return Some(Converter::Custom(f));
        }
        if builtin_supports(source, target) {
            return Some(Converter::Builtin(target));
        }
        None
    }

    /// Convert a value declared as `source` into `target`
    ///
    /// # Errors
    ///
    /// [`Error::Conversion`] when the runtime value does not match the
    /// declared source type, or when no converter exists for the pair.
    pub fn convert(&self, value: &Value, source: FieldType, target: FieldType) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let runtime = value.field_type();
        if source != FieldType::Any && runtime != source {
            return Err(Error::Conversion {
                message: format!("runtime value is {}, not the declared source type", runtime),
                source_type: source,
                target_type: target,
            });
        }
        self.convert_to(value, target)
    }

    /// Convert a value into `target`, deriving the source type from the
    /// value's runtime representation
    pub fn convert_to(&self, value: &Value, target: FieldType) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let source = value.field_type();
        match self.find_converter(source, target) {
            Some(converter) => converter.convert(value),
            None => Err(no_converter(source, target)),
        }
    }
}

fn no_converter(source: FieldType, target: FieldType) -> Error {
    Error::Conversion {
        message: "no converter registered for this pair".to_string(),
        source_type: source,
        target_type: target,
    }
}

/// Whether the built-in matrix covers a pair. Kept in step with
/// [`builtin_convert`]; the null-propagation test walks every supported pair.
fn builtin_supports(source: FieldType, target: FieldType) -> bool {
    use FieldType::*;
    if source == target || target == Any || target == None || source == Any {
        return true;
    }
    match (source, target) {
        // Every type has a canonical string form
        (_, String) => true,
        // String parses into every primitive, and into Complex as JSON
        (String, t) => t.is_primitive() || t == Complex,
        (Boolean, t) if t.is_numeric() => true,
        (Boolean, Character) => true,
        (Character, t) if t.is_numeric() => true,
        (s, t) if s.is_numeric() && t.is_numeric() => true,
        (s, Boolean) if s.is_numeric() => true,
        (s, Character) if s.is_numeric() => true,
        (DateTime, Long) | (Long, DateTime) => true,
        _ => false,
    }
}

fn builtin_convert(value: &Value, target: FieldType) -> Result<Value> {
    let source = value.field_type();
    if source == target || target == FieldType::Any || target == FieldType::None {
        return Ok(value.clone());
    }

    match (value, target) {
        (Value::String(s), _) => string_to(s, target),
        (v, FieldType::String) => Ok(Value::String(v.to_string())),

        (Value::Boolean(b), FieldType::Character) => {
            // Numeric on purpose: true=1, false=0 as code points
            Ok(Value::Character(if *b { '\u{1}' } else { '\u{0}' }))
        }
        (Value::Boolean(b), t) if t.is_numeric() => Ok(long_to(i64::from(*b), t)),

        (Value::Character(c), t) if t.is_numeric() => Ok(long_to(i64::from(u32::from(*c)), t)),

        (Value::DateTime(dt), FieldType::Long) => Ok(Value::Long(dt.timestamp_millis())),
        (Value::Long(ms), FieldType::DateTime) => match Utc.timestamp_millis_opt(*ms) {
            chrono::LocalResult::Single(dt) => Ok(Value::DateTime(dt)),
            _ => Err(Error::Conversion {
                message: format!("{} is out of range for a timestamp", ms),
                source_type: source,
                target_type: target,
            }),
        },

        (v, FieldType::Boolean) if source.is_numeric() => {
            Ok(Value::Boolean(v.as_double() != Some(0.0)))
        }
        (v, FieldType::Character) if source.is_numeric() => {
            let code = v
                .as_long()
                .and_then(|n| u32::try_from(n).ok())
                .and_then(char::from_u32);
            code.map(Value::Character).ok_or_else(|| Error::Conversion {
                message: format!("{} is not a valid character code point", v),
                source_type: source,
                target_type: target,
            })
        }

        (v, t) if source.is_numeric() && t.is_numeric() => match (v.as_long(), v.as_double()) {
            (Some(n), _) => Ok(long_to(n, t)),
            // Floating sources narrow through f64, saturating at the bounds
            (_, Some(d)) => Ok(double_to(d, t)),
            _ => Err(no_converter(source, target)),
        },

        _ => Err(no_converter(source, target)),
    }
}

/// Narrow or widen an integral value, saturating at the target's bounds
fn long_to(v: i64, target: FieldType) -> Value {
    match target {
        FieldType::Byte => Value::Byte(v.clamp(i64::from(i8::MIN), i64::from(i8::MAX)) as i8),
        FieldType::Short => Value::Short(v.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16),
        FieldType::Integer => {
            Value::Integer(v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
        }
        FieldType::Long => Value::Long(v),
        FieldType::Float => Value::Float(v as f32),
        FieldType::Double => Value::Double(v as f64),
        FieldType::Decimal => Value::Decimal(v as f64),
        // Guarded by is_numeric at the call sites
        _ => unreachable!("long_to called with non-numeric target"),
    }
}

/// Narrow a floating value; `as` casts saturate at integral bounds
fn double_to(v: f64, target: FieldType) -> Value {
    match target {
        FieldType::Byte => Value::Byte(v as i8),
        FieldType::Short => Value::Short(v as i16),
        FieldType::Integer => Value::Integer(v as i32),
        FieldType::Long => Value::Long(v as i64),
        FieldType::Float => Value::Float(v as f32),
        FieldType::Double => Value::Double(v),
        FieldType::Decimal => Value::Decimal(v),
        _ => unreachable!("double_to called with non-numeric target"),
    }
}

fn string_to(s: &str, target: FieldType) -> Result<Value> {
    let fail = |message: String| Error::Conversion {
        message,
        source_type: FieldType::String,
        target_type: target,
    };
    match target {
        FieldType::Boolean => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(fail(format!("'{}' is not a boolean", s))),
        },
        FieldType::Character => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), Option::None) => Ok(Value::Character(c)),
                _ => Err(fail(format!("'{}' is not a single character", s))),
            }
        }
        FieldType::Byte => s
            .trim()
            .parse::<i8>()
            .map(Value::Byte)
            .map_err(|e| fail(format!("'{}': {}", s, e))),
        FieldType::Short => s
            .trim()
            .parse::<i16>()
            .map(Value::Short)
            .map_err(|e| fail(format!("'{}': {}", s, e))),
        FieldType::Integer => s
            .trim()
            .parse::<i32>()
            .map(Value::Integer)
            .map_err(|e| fail(format!("'{}': {}", s, e))),
        FieldType::Long => s
            .trim()
            .parse::<i64>()
            .map(Value::Long)
            .map_err(|e| fail(format!("'{}': {}", s, e))),
        FieldType::Float => s
            .trim()
            .parse::<f32>()
            .map(Value::Float)
            .map_err(|e| fail(format!("'{}': {}", s, e))),
        FieldType::Double => s
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|e| fail(format!("'{}': {}", s, e))),
        FieldType::Decimal => s
            .trim()
            .parse::<f64>()
            .map(Value::Decimal)
            .map_err(|e| fail(format!("'{}': {}", s, e))),
        FieldType::DateTime => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
            .map_err(|e| fail(format!("'{}': {}", s, e))),
        FieldType::Complex => {
            let parsed: serde_json::Value =
                serde_json::from_str(s).map_err(|e| fail(format!("'{}': {}", s, e)))?;
            Ok(Value::Complex(parsed))
        }
        FieldType::String | FieldType::Any | FieldType::None => {
            Ok(Value::String(s.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldType as FT;

    const ALL_TYPES: [FT; 14] = [
        FT::Boolean,
        FT::Byte,
        FT::Character,
        FT::DateTime,
        FT::Decimal,
        FT::Double,
        FT::Float,
        FT::Integer,
        FT::Long,
        FT::Short,
        FT::String,
        FT::Complex,
        FT::Any,
        FT::None,
    ];

    #[test]
    fn test_null_propagates_for_every_pair() {
        let registry = ConverterRegistry::new();
        for source in ALL_TYPES {
            for target in ALL_TYPES {
                if registry.find_converter(source, target).is_some() {
                    let result = registry.convert(&Value::Null, source, target).unwrap();
                    assert_eq!(result, Value::Null, "{} -> {}", source, target);
                }
            }
        }
    }

    #[test]
    fn test_boolean_conversions() {
        let r = ConverterRegistry::new();
        assert_eq!(
            r.convert_to(&Value::Boolean(true), FT::Integer).unwrap(),
            Value::Integer(1)
        );
        assert_eq!(
            r.convert_to(&Value::Boolean(false), FT::Integer).unwrap(),
            Value::Integer(0)
        );
        assert_eq!(
            r.convert_to(&Value::Boolean(true), FT::Character).unwrap(),
            Value::Character('\u{1}')
        );
        assert_eq!(
            r.convert_to(&Value::Boolean(false), FT::Character).unwrap(),
            Value::Character('\u{0}')
        );
    }

    #[test]
    fn test_numeric_narrowing_saturates() {
        let r = ConverterRegistry::new();
        assert_eq!(
            r.convert_to(&Value::Long(300), FT::Byte).unwrap(),
            Value::Byte(i8::MAX)
        );
        assert_eq!(
            r.convert_to(&Value::Long(-300), FT::Byte).unwrap(),
            Value::Byte(i8::MIN)
        );
        assert_eq!(
            r.convert_to(&Value::Double(1e12), FT::Integer).unwrap(),
            Value::Integer(i32::MAX)
        );
        assert_eq!(
            r.convert_to(&Value::Integer(-7), FT::Long).unwrap(),
            Value::Long(-7)
        );
    }

    #[test]
    fn test_string_parsing() {
        let r = ConverterRegistry::new();
        assert_eq!(
            r.convert_to(&Value::String("42".to_string()), FT::Integer)
                .unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            r.convert_to(&Value::String("TRUE".to_string()), FT::Boolean)
                .unwrap(),
            Value::Boolean(true)
        );
        assert!(matches!(
            r.convert_to(&Value::String("abc".to_string()), FT::Integer),
            Err(Error::Conversion { .. })
        ));
    }

    #[test]
    fn test_string_to_complex_parses_json() {
        let r = ConverterRegistry::new();
        assert_eq!(
            r.convert_to(&Value::String("{\"a\": 1}".to_string()), FT::Complex)
                .unwrap(),
            Value::Complex(serde_json::json!({"a": 1}))
        );
        assert!(matches!(
            r.convert_to(&Value::String("not json".to_string()), FT::Complex),
            Err(Error::Conversion { .. })
        ));
    }

    #[test]
    fn test_datetime_round_trip_through_millis() {
        let r = ConverterRegistry::new();
        let dt = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let millis = r.convert_to(&Value::DateTime(dt), FT::Long).unwrap();
        assert_eq!(millis, Value::Long(1_700_000_000_000));
        assert_eq!(
            r.convert_to(&millis, FT::DateTime).unwrap(),
            Value::DateTime(dt)
        );
    }

    #[test]
    fn test_declared_source_shape_checked() {
        let r = ConverterRegistry::new();
        let err = r.convert(&Value::Integer(1), FT::String, FT::Long);
        assert!(matches!(err, Err(Error::Conversion { .. })));
    }

    #[test]
    fn test_unsupported_pair() {
        let r = ConverterRegistry::new();
        assert!(r.find_converter(FT::Complex, FT::DateTime).is_none());
        assert!(matches!(
            r.convert_to(&Value::Complex(serde_json::json!({})), FT::DateTime),
            Err(Error::Conversion { .. })
        ));
    }

    #[test]
    fn test_custom_converter_overrides_builtin() {
        let mut r = ConverterRegistry::new();
        r.register(FT::Boolean, FT::String, |v| {
            Ok(Value::String(match v {
                Value::Boolean(true) => "yes".to_string(),
                _ => "no".to_string(),
            }))
        });
        assert_eq!(
            r.convert_to(&Value::Boolean(true), FT::String).unwrap(),
            Value::String("yes".to_string())
        );
        // Null still short-circuits ahead of the custom converter
        assert_eq!(
            r.convert(&Value::Null, FT::Boolean, FT::String).unwrap(),
            Value::Null
        );
    }
}
