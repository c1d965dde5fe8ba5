//! Runtime value representation and the field type enum
//!
//! Every value flowing through the engine is one of the closed [`Value`]
//! variants; every field declares one of the closed [`FieldType`]s. The two
//! enums mirror each other: `Value::field_type()` recovers the declared type
//! of a runtime value, and the conversion service walks the matrix between
//! them. `Complex` carries an opaque JSON subtree for structured values the
//! primitive types cannot express.
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Boolean,
    Byte,
    Character,
    DateTime,
    Decimal,
    Double,
    Float,
    Integer,
    Long,
    Short,
    String,
    /// Structured value, carried as an opaque JSON subtree
    Complex,
    /// Matches any runtime type; conversion to Any is the identity
    Any,
    /// No declared type
    None,
}

impl FieldType {
    /// Whether this is one of the primitive scalar types
    pub fn is_primitive(self) -> bool {
        !matches!(self, FieldType::Complex | FieldType::Any | FieldType::None)
    }

    pub fn is_numeric(self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Widening rank among the numeric types; wider types rank higher
    fn numeric_rank(self) -> Option<u8> {
        match self {
            FieldType::Byte => Some(0),
            FieldType::Short => Some(1),
            FieldType::Integer => Some(2),
            FieldType::Long => Some(3),
            FieldType::Float => Some(4),
            FieldType::Double => Some(5),
            FieldType::Decimal => Some(6),
            _ => None,
        }
    }

    /// Distance from `self` to `target` along the numeric widening chain
    ///
    /// `Some(0)` for the same type, `Some(n)` when `target` is `n` steps
    /// wider, `None` when the pair is not a widening.
    pub fn widening_distance(self, target: FieldType) -> Option<u8> {
        if self == target {
            return Some(0);
        }
        match (self.numeric_rank(), target.numeric_rank()) {
            (Some(from), Some(to)) if to >= from => Some(to - from),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Boolean => "BOOLEAN",
            FieldType::Byte => "BYTE",
            FieldType::Character => "CHARACTER",
            FieldType::DateTime => "DATE_TIME",
            FieldType::Decimal => "DECIMAL",
            FieldType::Double => "DOUBLE",
            FieldType::Float => "FLOAT",
            FieldType::Integer => "INTEGER",
            FieldType::Long => "LONG",
            FieldType::Short => "SHORT",
            FieldType::String => "STRING",
            FieldType::Complex => "COMPLEX",
            FieldType::Any => "ANY",
            FieldType::None => "NONE",
        };
        write!(f, "{}", name)
    }
}

/// A runtime value, one variant per field type plus `Null`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Value {
    Boolean(bool),
    Byte(i8),
    Character(char),
    DateTime(DateTime<Utc>),
    Decimal(f64),
    Double(f64),
    Float(f32),
    Integer(i32),
    Long(i64),
    Short(i16),
    String(String),
    Complex(serde_json::Value),
    Null,
}

impl Value {
    /// The declared type matching this value's runtime representation
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Boolean(_) => FieldType::Boolean,
            Value::Byte(_) => FieldType::Byte,
            Value::Character(_) => FieldType::Character,
            Value::DateTime(_) => FieldType::DateTime,
            Value::Decimal(_) => FieldType::Decimal,
            Value::Double(_) => FieldType::Double,
            Value::Float(_) => FieldType::Float,
            Value::Integer(_) => FieldType::Integer,
            Value::Long(_) => FieldType::Long,
            Value::Short(_) => FieldType::Short,
            Value::String(_) => FieldType::String,
            Value::Complex(_) => FieldType::Complex,
            Value::Null => FieldType::None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Widest integral reading of this value, when it has one
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Integer(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Widest floating reading of this value, when it has one
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) | Value::Decimal(v) => Some(*v),
            _ => self.as_long().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// The canonical string form, used by string conversion and Combine.
/// `Null` renders as the empty string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Character(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Decimal(v) | Value::Double(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Complex(v) => write!(f, "{}", v),
            Value::Null => Ok(()),
        }
    }
}
