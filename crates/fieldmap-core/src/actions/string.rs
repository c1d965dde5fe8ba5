//! Built-in string actions
//!
//! All of these pass a null input through unchanged; a non-string input is
//! an error the chain executor downgrades to a warning audit.
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use super::{opt_usize_param, string_param, usize_param, ActionDetail, ActionRegistry, Params};
use crate::error::{Error, Result};
use crate::value::{FieldType, Value};

/// Register the string actions in their fixed order
pub(super) fn register(registry: &mut ActionRegistry) {
    use FieldType::{Integer, String};
    registry.register(ActionDetail::scalar("Uppercase", String, String, uppercase));
    registry.register(ActionDetail::scalar("Lowercase", String, String, lowercase));
    registry.register(ActionDetail::scalar("Capitalize", String, String, capitalize));
    registry.register(ActionDetail::scalar("Trim", String, String, trim));
    registry.register(ActionDetail::scalar("TrimLeft", String, String, trim_left));
    registry.register(ActionDetail::scalar("TrimRight", String, String, trim_right));
    registry.register(ActionDetail::scalar("Append", String, String, append));
    registry.register(ActionDetail::scalar("Prepend", String, String, prepend));
    registry.register(ActionDetail::scalar("Replace", String, String, replace));
    registry.register(ActionDetail::scalar("SubString", String, String, sub_string));
    registry.register(ActionDetail::scalar("Length", String, Integer, length));
}

fn expect_string(value: &Value) -> Result<Option<&str>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(Error::Conversion {
            message: "string action applied to a non-string value".to_string(),
            source_type: other.field_type(),
            target_type: FieldType::String,
        }),
    }
}

fn uppercase(value: &Value, _: &Params) -> Result<Value> {
    Ok(match expect_string(value)? {
        Some(s) => Value::String(s.to_uppercase()),
        None => Value::Null,
    })
}

fn lowercase(value: &Value, _: &Params) -> Result<Value> {
    Ok(match expect_string(value)? {
        Some(s) => Value::String(s.to_lowercase()),
        None => Value::Null,
    })
}

fn capitalize(value: &Value, _: &Params) -> Result<Value> {
    Ok(match expect_string(value)? {
        Some(s) => {
            let mut chars = s.chars();
            let capitalized = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            };
            Value::String(capitalized)
        }
        None => Value::Null,
    })
}

fn trim(value: &Value, _: &Params) -> Result<Value> {
    Ok(match expect_string(value)? {
        Some(s) => Value::String(s.trim().to_string()),
        None => Value::Null,
    })
}

fn trim_left(value: &Value, _: &Params) -> Result<Value> {
    Ok(match expect_string(value)? {
        Some(s) => Value::String(s.trim_start().to_string()),
        None => Value::Null,
    })
}

fn trim_right(value: &Value, _: &Params) -> Result<Value> {
    Ok(match expect_string(value)? {
        Some(s) => Value::String(s.trim_end().to_string()),
        None => Value::Null,
    })
}

/// Appends the `string` parameter
fn append(value: &Value, params: &Params) -> Result<Value> {
    let suffix = string_param(params, "string")?;
    Ok(match expect_string(value)? {
        Some(s) => Value::String(format!("{}{}", s, suffix)),
        None => Value::Null,
    })
}

/// Prepends the `string` parameter
fn prepend(value: &Value, params: &Params) -> Result<Value> {
    let prefix = string_param(params, "string")?;
    Ok(match expect_string(value)? {
        Some(s) => Value::String(format!("{}{}", prefix, s)),
        None => Value::Null,
    })
}

/// Replaces every occurrence of `match` with `new`
fn replace(value: &Value, params: &Params) -> Result<Value> {
    let pattern = string_param(params, "match")?;
    let replacement = string_param(params, "new")?;
    Ok(match expect_string(value)? {
        Some(s) => Value::String(s.replace(&pattern, &replacement)),
        None => Value::Null,
    })
}

/// Character range `[startIndex, endIndex)`; the end defaults to the length
/// and both bounds clamp to it
fn sub_string(value: &Value, params: &Params) -> Result<Value> {
    let start = usize_param(params, "startIndex")?;
    let end = opt_usize_param(params, "endIndex")?;
    Ok(match expect_string(value)? {
        Some(s) => {
            let chars: Vec<char> = s.chars().collect();
            let end = end.unwrap_or(chars.len()).min(chars.len());
            let start = start.min(end);
            Value::String(chars[start..end].iter().collect())
        }
        None => Value::Null,
    })
}

/// Character count as an Integer
fn length(value: &Value, _: &Params) -> Result<Value> {
    Ok(match expect_string(value)? {
        Some(s) => Value::Integer(s.chars().count() as i32),
        None => Value::Null,
    })
}

#[cfg(test)]
mod tests {
    use super::super::ActionCall;
    use super::*;

    fn run(call: &ActionCall, value: Value) -> Result<Value> {
        ActionRegistry::with_builtins().apply(call, &value)
    }

    #[test]
    fn test_case_actions() {
        let s = |v: &str| Value::String(v.to_string());
        assert_eq!(
            run(&ActionCall::named("Uppercase"), s("aBc")).unwrap(),
            s("ABC")
        );
        assert_eq!(
            run(&ActionCall::named("Lowercase"), s("aBc")).unwrap(),
            s("abc")
        );
        assert_eq!(
            run(&ActionCall::named("Capitalize"), s("ozzie smith")).unwrap(),
            s("Ozzie smith")
        );
    }

    #[test]
    fn test_trim_family() {
        let s = |v: &str| Value::String(v.to_string());
        assert_eq!(run(&ActionCall::named("Trim"), s(" a ")).unwrap(), s("a"));
        assert_eq!(
            run(&ActionCall::named("TrimLeft"), s(" a ")).unwrap(),
            s("a ")
        );
        assert_eq!(
            run(&ActionCall::named("TrimRight"), s(" a ")).unwrap(),
            s(" a")
        );
    }

    #[test]
    fn test_append_prepend_replace() {
        let s = |v: &str| Value::String(v.to_string());
        assert_eq!(
            run(
                &ActionCall::named("Append").with_param("string", serde_json::json!("!")),
                s("hi")
            )
            .unwrap(),
            s("hi!")
        );
        assert_eq!(
            run(
                &ActionCall::named("Prepend").with_param("string", serde_json::json!(">")),
                s("hi")
            )
            .unwrap(),
            s(">hi")
        );
        assert_eq!(
            run(
                &ActionCall::named("Replace")
                    .with_param("match", serde_json::json!("l"))
                    .with_param("new", serde_json::json!("L")),
                s("hello")
            )
            .unwrap(),
            s("heLLo")
        );
    }

    #[test]
    fn test_sub_string_clamps() {
        let s = |v: &str| Value::String(v.to_string());
        let call = ActionCall::named("SubString")
            .with_param("startIndex", serde_json::json!(1))
            .with_param("endIndex", serde_json::json!(3));
        assert_eq!(run(&call, s("abcde")).unwrap(), s("bc"));

        let call = ActionCall::named("SubString").with_param("startIndex", serde_json::json!(9));
        assert_eq!(run(&call, s("abc")).unwrap(), s(""));
    }

    #[test]
    fn test_length() {
        assert_eq!(
            run(
                &ActionCall::named("Length"),
                Value::String("abc".to_string())
            )
            .unwrap(),
            Value::Integer(3)
        );
    }

    #[test]
    fn test_null_passes_through() {
        assert_eq!(
            run(&ActionCall::named("Uppercase"), Value::Null).unwrap(),
            Value::Null
        );
        assert_eq!(
            run(&ActionCall::named("Length"), Value::Null).unwrap(),
            Value::Null
        );
    }
}
