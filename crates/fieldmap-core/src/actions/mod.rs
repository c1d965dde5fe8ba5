//! Field action service
//!
//! Actions are named, typed, pure transformation functions applied to a
//! field value in a declared chain. The registry holds [`ActionDetail`]
//! records - several may share a name, distinguished by their declared
//! source type (overloads). Registration is an explicit startup call; the
//! registry is read-only at invocation time, so a single registry is safe
//! to share across concurrent sessions.
//!
//! Overload resolution is deterministic: an exact source-type match wins,
//! then the smallest numeric widening distance, then `Any`; remaining ties
//! go to the earliest-registered detail, and the built-in registration
//! order is fixed.
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

mod number;
mod string;

use crate::audit::Audits;
use crate::convert::ConverterRegistry;
use crate::error::{Error, Result};
use crate::field::{CollectionType, Field};
use crate::value::{FieldType, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Literal parameters of one action invocation
pub type Params = BTreeMap<String, serde_json::Value>;

/// How the chain executor handles a failing action invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnFailure {
    /// Record a WARN audit and continue with the pre-action value
    #[default]
    Warn,
    /// Record an ERROR audit and continue with the pre-action value
    Error,
    /// Abort the whole mapping entry with the action's error
    Fatal,
}

/// One action invocation in a field's declared chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCall {
    pub name: String,
    #[serde(default)]
    pub parameters: Params,
    /// Failure handling for this invocation
    #[serde(default)]
    pub on_failure: OnFailure,
}

impl ActionCall {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Params::new(),
            on_failure: OnFailure::default(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_on_failure(mut self, on_failure: OnFailure) -> Self {
        self.on_failure = on_failure;
        self
    }
}

/// The callable implementation of one action overload
pub type ActionFn = fn(&Value, &Params) -> Result<Value>;

/// Registry metadata for one action overload
#[derive(Clone)]
pub struct ActionDetail {
    pub name: &'static str,
    pub source_type: FieldType,
    pub target_type: FieldType,
    pub source_collection: CollectionType,
    pub target_collection: CollectionType,
    pub handler: ActionFn,
}

impl ActionDetail {
    /// A scalar-to-scalar action detail
    pub fn scalar(
        name: &'static str,
        source_type: FieldType,
        target_type: FieldType,
        handler: ActionFn,
    ) -> Self {
        Self {
            name,
            source_type,
            target_type,
            source_collection: CollectionType::None,
            target_collection: CollectionType::None,
            handler,
        }
    }
}

/// Registry of named, typed transformation functions
#[derive(Clone, Default)]
pub struct ActionRegistry {
    details: Vec<ActionDetail>,
}

impl ActionRegistry {
    /// An empty registry, for hosts building their own action set
    pub fn empty() -> Self {
        Self::default()
    }

    /// The registry pre-loaded with the built-in string and number actions,
    /// registered in a fixed order
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        string::register(&mut registry);
        number::register(&mut registry);
        registry
    }

    pub fn register(&mut self, detail: ActionDetail) {
        self.details.push(detail);
    }

    /// All registered details in registration order, for discovery
    pub fn list_action_details(&self) -> &[ActionDetail] {
        &self.details
    }

    /// Resolve the overload for `name` matching the sample value's type
    ///
    /// # Errors
    ///
    /// [`Error::ActionNotFound`] when the name is unknown or no overload
    /// accepts the sample value's type.
    pub fn find_action(&self, name: &str, sample: &Value) -> Result<&ActionDetail> {
        let mut found_name = false;
        let mut best: Option<(u32, &ActionDetail)> = None;
        let sample_type = sample.field_type();

        for detail in &self.details {
            if detail.name != name {
                continue;
            }
            found_name = true;
            let Some(score) = specificity(sample_type, detail.source_type) else {
                continue;
            };
            // Strict comparison keeps the earliest-registered detail on ties
            if best.map_or(true, |(current, _)| score < current) {
                best = Some((score, detail));
            }
        }

        match best {
            Some((_, detail)) => Ok(detail),
            None if found_name => Err(Error::ActionNotFound {
                name: name.to_string(),
                message: format!("no overload accepts source type {}", sample_type),
            }),
            None => Err(Error::ActionNotFound {
                name: name.to_string(),
                message: "no action registered under this name".to_string(),
            }),
        }
    }

    /// Apply one action call to a value
    pub fn apply(&self, call: &ActionCall, value: &Value) -> Result<Value> {
        let detail = self.find_action(&call.name, value)?;
        (detail.handler)(value, &call.parameters)
    }

    /// Execute an action chain against a field in declared order
    ///
    /// Each action consumes the previous action's output. A failing action
    /// is handled per its [`OnFailure`] setting: an audit at the configured
    /// severity and the chain continues with the pre-action value, or an
    /// `Err` aborting the entry when the call is flagged fatal.
    pub fn process_actions(
        &self,
        actions: &[ActionCall],
        field: &mut Field,
        audits: &mut Audits,
    ) -> Result<()> {
        for call in actions {
            match self.apply(call, &field.value) {
                Ok(value) => field.value = value,
                Err(e) => {
                    warn!(action = call.name, path = %field.path, error = %e, "action failed");
                    let message = format!("Action '{}' failed: {}", call.name, e);
                    match call.on_failure {
                        OnFailure::Warn => audits.add_warn(message, Some(field.path.to_string())),
                        OnFailure::Error => audits.add_error(message, Some(field.path.to_string())),
                        OnFailure::Fatal => return Err(e),
                    }
                }
            }
        }
        Ok(())
    }

    /// Execute an action chain against a bare value, converting to
    /// `target_type` as the final step
    pub fn process_actions_to(
        &self,
        actions: &[ActionCall],
        value: Value,
        target_type: FieldType,
        converters: &ConverterRegistry,
        audits: &mut Audits,
    ) -> Result<Value> {
        let mut current = value;
        for call in actions {
            match self.apply(call, &current) {
                Ok(value) => current = value,
                Err(e) => {
                    warn!(action = call.name, error = %e, "action failed");
                    let message = format!("Action '{}' failed: {}", call.name, e);
                    match call.on_failure {
                        OnFailure::Warn => audits.add_warn(message, None),
                        OnFailure::Error => audits.add_error(message, None),
                        OnFailure::Fatal => return Err(e),
                    }
                }
            }
        }
        converters.convert_to(&current, target_type)
    }
}

/// How well a declared source type matches a sample type; lower is more
/// specific, `None` is no match.
fn specificity(sample: FieldType, declared: FieldType) -> Option<u32> {
    if declared == sample {
        return Some(0);
    }
    // A null sample matches every overload, least specifically
    if sample == FieldType::None {
        return Some(1000);
    }
    if let Some(distance) = sample.widening_distance(declared) {
        return Some(u32::from(distance));
    }
    if declared == FieldType::Any {
        return Some(500);
    }
    None
}

/// Required string parameter of an action call
pub(crate) fn string_param(params: &Params, key: &str) -> Result<String> {
    match params.get(key) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(anyhow::anyhow!("missing required parameter '{}'", key).into()),
    }
}

/// Required non-negative integer parameter of an action call
pub(crate) fn usize_param(params: &Params, key: &str) -> Result<usize> {
    params
        .get(key)
        .and_then(serde_json::Value::as_u64)
        .map(|v| v as usize)
        .ok_or_else(|| anyhow::anyhow!("missing or invalid parameter '{}'", key).into())
}

/// Optional non-negative integer parameter of an action call
pub(crate) fn opt_usize_param(params: &Params, key: &str) -> Result<Option<usize>> {
    match params.get(key) {
        Option::None | Some(serde_json::Value::Null) => Ok(Option::None),
        Some(v) => v
            .as_u64()
            .map(|v| Some(v as usize))
            .ok_or_else(|| anyhow::anyhow!("invalid parameter '{}'", key).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;

    fn echo_string(value: &Value, _: &Params) -> Result<Value> {
        Ok(Value::String(format!("string:{}", value)))
    }

    fn echo_integer(value: &Value, _: &Params) -> Result<Value> {
        Ok(Value::String(format!("integer:{}", value)))
    }

    #[test]
    fn test_overload_resolution_by_sample_type() {
        let mut registry = ActionRegistry::empty();
        registry.register(ActionDetail::scalar(
            "Echo",
            FieldType::String,
            FieldType::String,
            echo_string,
        ));
        registry.register(ActionDetail::scalar(
            "Echo",
            FieldType::Integer,
            FieldType::String,
            echo_integer,
        ));

        let call = ActionCall::named("Echo");
        assert_eq!(
            registry
                .apply(&call, &Value::String("text".to_string()))
                .unwrap(),
            Value::String("string:text".to_string())
        );
        assert_eq!(
            registry.apply(&call, &Value::Integer(5)).unwrap(),
            Value::String("integer:5".to_string())
        );
    }

    #[test]
    fn test_widening_prefers_nearest_overload() {
        let registry = ActionRegistry::with_builtins();
        // Integer resolves its exact AbsoluteValue overload
        let detail = registry
            .find_action("AbsoluteValue", &Value::Integer(-3))
            .unwrap();
        assert_eq!(detail.source_type, FieldType::Integer);
        // Short has no exact overload; Integer is the nearest widening
        let detail = registry
            .find_action("AbsoluteValue", &Value::Short(-3))
            .unwrap();
        assert_eq!(detail.source_type, FieldType::Integer);
        // Float widens to Double, skipping the integral overloads
        let detail = registry
            .find_action("AbsoluteValue", &Value::Float(-3.0))
            .unwrap();
        assert_eq!(detail.source_type, FieldType::Double);
    }

    #[test]
    fn test_unknown_action() {
        let registry = ActionRegistry::with_builtins();
        assert!(matches!(
            registry.find_action("NoSuchAction", &Value::Integer(1)),
            Err(Error::ActionNotFound { .. })
        ));
    }

    #[test]
    fn test_no_matching_overload() {
        let registry = ActionRegistry::with_builtins();
        let result = registry.find_action("AbsoluteValue", &Value::Boolean(true));
        assert!(matches!(result, Err(Error::ActionNotFound { .. })));
    }

    #[test]
    fn test_chain_continues_after_failure() {
        let registry = ActionRegistry::with_builtins();
        let mut audits = Audits::new();
        let mut field = Field::new("d", Path::parse("/name").unwrap(), FieldType::String)
            .with_value(Value::String("  ozzie  ".to_string()));

        // SubString without its required parameter fails; Trim and
        // Uppercase still run against the pre-failure value.
        let chain = vec![
            ActionCall::named("Trim"),
            ActionCall::named("SubString"),
            ActionCall::named("Uppercase"),
        ];
        registry.process_actions(&chain, &mut field, &mut audits).unwrap();

        assert_eq!(field.value, Value::String("OZZIE".to_string()));
        assert_eq!(audits.len(), 1);
        assert!(audits.has_warns());
        assert!(!audits.has_errors());
    }

    #[test]
    fn test_failure_severity_is_configurable() {
        let registry = ActionRegistry::with_builtins();
        let mut audits = Audits::new();
        let mut field = Field::new("d", Path::parse("/name").unwrap(), FieldType::String)
            .with_value(Value::String("ozzie".to_string()));

        let chain = vec![
            ActionCall::named("SubString").with_on_failure(OnFailure::Error),
            ActionCall::named("Uppercase"),
        ];
        registry.process_actions(&chain, &mut field, &mut audits).unwrap();

        // The chain still continues with the pre-failure value
        assert_eq!(field.value, Value::String("OZZIE".to_string()));
        assert!(audits.has_errors());
        assert!(!audits.has_warns());
    }

    #[test]
    fn test_fatal_action_aborts_the_chain() {
        let registry = ActionRegistry::with_builtins();
        let mut audits = Audits::new();
        let mut field = Field::new("d", Path::parse("/name").unwrap(), FieldType::String)
            .with_value(Value::String("ozzie".to_string()));

        let chain = vec![
            ActionCall::named("SubString").with_on_failure(OnFailure::Fatal),
            ActionCall::named("Uppercase"),
        ];
        assert!(registry
            .process_actions(&chain, &mut field, &mut audits)
            .is_err());

        // Nothing after the fatal action ran and no audit was recorded
        // here; the pipeline records the entry-level one
        assert_eq!(field.value, Value::String("ozzie".to_string()));
        assert!(audits.is_empty());
    }

    #[test]
    fn test_on_failure_defaults_to_warn_in_serde() {
        let call: ActionCall = serde_json::from_value(serde_json::json!({
            "name": "Trim",
        }))
        .unwrap();
        assert_eq!(call.on_failure, OnFailure::Warn);

        let call: ActionCall = serde_json::from_value(serde_json::json!({
            "name": "Trim",
            "onFailure": "fatal",
        }))
        .unwrap();
        assert_eq!(call.on_failure, OnFailure::Fatal);
    }

    #[test]
    fn test_process_actions_to_converts_final_value() {
        let registry = ActionRegistry::with_builtins();
        let converters = ConverterRegistry::new();
        let mut audits = Audits::new();

        let result = registry
            .process_actions_to(
                &[ActionCall::named("Trim")],
                Value::String(" 42 ".to_string()),
                FieldType::Integer,
                &converters,
                &mut audits,
            )
            .unwrap();
        assert_eq!(result, Value::Integer(42));
        assert!(audits.is_empty());
    }

    #[test]
    fn test_null_sample_resolves_least_specific() {
        let registry = ActionRegistry::with_builtins();
        // Null resolves to the first registered overload of the name
        let detail = registry.find_action("AbsoluteValue", &Value::Null).unwrap();
        assert_eq!(detail.source_type, FieldType::Integer);
    }
}
