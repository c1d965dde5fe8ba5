//! JSON document module
//!
//! Reads and writes `serde_json::Value` trees attached to the session. A
//! read whose path marks a collection level without an index fans out into
//! a field group, one member per element. Writes create every missing
//! intermediate container and pad arrays with nulls up to the requested
//! index. Runtime types are inferred from the JSON node; converting them
//! to the output field's declared type is the pipeline's job.
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::field::{Field, FieldGroup, FieldStatus};
use crate::module::{Module, ModuleMode};
use crate::path::{CollectionMarker, Path, Segment};
use crate::session::Session;
use crate::value::{FieldType, Value};
use serde_json::Value as JsonValue;

/// Format adapter for JSON documents in either mode
#[derive(Debug)]
pub struct JsonModule {
    mode: ModuleMode,
}

impl JsonModule {
    pub fn source() -> Self {
        Self {
            mode: ModuleMode::Source,
        }
    }

    pub fn target() -> Self {
        Self {
            mode: ModuleMode::Target,
        }
    }
}

impl Module for JsonModule {
    fn mode(&self) -> ModuleMode {
        self.mode
    }

    fn create_field(&self) -> Field {
        Field {
            doc_id: None,
            path: Path::root(),
            field_type: FieldType::Any,
            collection_type: Default::default(),
            index: None,
            value: Value::Null,
            actions: Vec::new(),
            status: FieldStatus::Supported,
        }
    }

    fn is_supported_field(&self, _field: &Field) -> bool {
        // JSON can carry every field type
        true
    }

    fn read_source_value(&self, session: &mut Session) -> Result<()> {
        if self.mode != ModuleMode::Source {
            return Err(Error::unsupported(
                "target-mode JSON module cannot read".to_string(),
            ));
        }
        let mut field = session
            .head()
            .source_field()
            .cloned()
            .ok_or_else(|| Error::invalid_state("no source field in flight"))?;
        let doc_id = field
            .doc_id
            .clone()
            .ok_or_else(|| Error::invalid_state("source field names no document id"))?;
        // An unattached document reads as all-null, not as an error
        let root = session
            .source_document::<JsonValue>(&doc_id)
            .cloned()
            .unwrap_or(JsonValue::Null);

        let mut matches = Vec::new();
        collect(&root, field.path.segments(), Vec::new(), &mut matches);

        if expands(&field.path) {
            let mut group = FieldGroup::new(field.path.clone(), field.field_type);
            for (i, (path, node)) in matches.into_iter().enumerate() {
                let mut member = field.clone();
                member.path = path;
                member.index = Some(i);
                member.value = json_to_value(&node);
                group.fields.push(member);
            }
            session.head_mut().set_source_group(group);
        } else {
            field.value = matches
                .into_iter()
                .next()
                .map(|(_, node)| json_to_value(&node))
                .unwrap_or(Value::Null);
            session.head_mut().set_source_field(field);
        }
        Ok(())
    }

    fn populate_target_field(&self, session: &mut Session) -> Result<()> {
        if self.mode != ModuleMode::Target {
            return Err(Error::unsupported(
                "source-mode JSON module cannot write".to_string(),
            ));
        }
        let field = session
            .head()
            .target_field()
            .cloned()
            .ok_or_else(|| Error::invalid_state("no target field in flight"))?;
        let doc_id = field
            .doc_id
            .ok_or_else(|| Error::invalid_state("target field names no document id"))?;
        if !session.has_target_document(&doc_id) {
            session.set_target_document(doc_id, JsonValue::Object(serde_json::Map::new()));
        }
        Ok(())
    }

    fn write_target_value(&self, session: &mut Session) -> Result<()> {
        if self.mode != ModuleMode::Target {
            return Err(Error::unsupported(
                "source-mode JSON module cannot write".to_string(),
            ));
        }
        let field = session
            .head()
            .target_field()
            .cloned()
            .ok_or_else(|| Error::invalid_state("no target field in flight"))?;
        let doc_id = field
            .doc_id
            .clone()
            .ok_or_else(|| Error::invalid_state("target field names no document id"))?;
        let node = value_to_json(&field.value);
        let root = session
            .target_document_mut::<JsonValue>(&doc_id)
            .ok_or_else(|| {
                Error::invalid_state(format!("target document '{}' is not a JSON tree", doc_id))
            })?;
        write_at(root, field.path.segments(), node)
    }
}

/// Whether the path addresses every element of some collection level
fn expands(path: &Path) -> bool {
    path.segments()
        .iter()
        .any(|s| s.is_collection() && s.index().is_none())
}

/// Depth-first walk collecting every node the path addresses, with the
/// concrete (fully indexed) path of each match
fn collect(
    node: &JsonValue,
    segments: &[Segment],
    prefix: Vec<Segment>,
    out: &mut Vec<(Path, JsonValue)>,
) {
    let Some((segment, rest)) = segments.split_first() else {
        out.push((Path::from_segments(prefix), node.clone()));
        return;
    };
    let Some(child) = node.get(segment.name()) else {
        return;
    };
    match segment.marker() {
        CollectionMarker::None | CollectionMarker::Map => {
            let mut prefix = prefix;
            prefix.push(segment.clone());
            collect(child, rest, prefix, out);
        }
        _ => {
            let JsonValue::Array(items) = child else {
                return;
            };
            match segment.index() {
                Some(index) => {
                    if let Some(element) = items.get(index) {
                        let mut prefix = prefix;
                        prefix.push(segment.clone());
                        collect(element, rest, prefix, out);
                    }
                }
                None => {
                    for (i, element) in items.iter().enumerate() {
                        let mut prefix = prefix.clone();
                        prefix.push(segment.with_index(i));
                        collect(element, rest, prefix, out);
                    }
                }
            }
        }
    }
}

/// Write `value` at the path, creating missing objects and padding arrays
fn write_at(current: &mut JsonValue, segments: &[Segment], value: JsonValue) -> Result<()> {
    let Some((segment, rest)) = segments.split_first() else {
        *current = value;
        return Ok(());
    };
    let object = ensure_object(current);
    let slot = object
        .entry(segment.name().to_string())
        .or_insert(JsonValue::Null);
    match segment.marker() {
        CollectionMarker::None | CollectionMarker::Map => write_at(slot, rest, value),
        _ => {
            let index = segment.index().ok_or_else(|| {
                Error::invalid_state(format!(
                    "cannot write through unindexed collection segment '{}'",
                    segment
                ))
            })?;
            let array = ensure_array(slot);
            if array.len() <= index {
                array.resize(index + 1, JsonValue::Null);
            }
            write_at(&mut array[index], rest, value)
        }
    }
}

fn ensure_object(node: &mut JsonValue) -> &mut serde_json::Map<String, JsonValue> {
    if !node.is_object() {
        *node = JsonValue::Object(serde_json::Map::new());
    }
    match node {
        JsonValue::Object(map) => map,
        _ => unreachable!(),
    }
}

fn ensure_array(node: &mut JsonValue) -> &mut Vec<JsonValue> {
    if !node.is_array() {
        *node = JsonValue::Array(Vec::new());
    }
    match node {
        JsonValue::Array(items) => items,
        _ => unreachable!(),
    }
}

/// Infer the runtime value of a JSON node
fn json_to_value(node: &JsonValue) -> Value {
    match node {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(v) => Value::Boolean(*v),
        JsonValue::Number(n) => match n.as_i64() {
            Some(v) => Value::Long(v),
            None => Value::Double(n.as_f64().unwrap_or(f64::MAX)),
        },
        JsonValue::String(s) => Value::String(s.clone()),
        structured => Value::Complex(structured.clone()),
    }
}

/// The JSON node a runtime value writes as
fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(v) => JsonValue::Bool(*v),
        Value::Byte(v) => JsonValue::from(*v),
        Value::Short(v) => JsonValue::from(*v),
        Value::Integer(v) => JsonValue::from(*v),
        Value::Long(v) => JsonValue::from(*v),
        Value::Float(v) => JsonValue::from(*v),
        Value::Double(v) | Value::Decimal(v) => JsonValue::from(*v),
        Value::Character(v) => JsonValue::String(v.to_string()),
        Value::DateTime(v) => JsonValue::String(v.to_rfc3339()),
        Value::String(v) => JsonValue::String(v.clone()),
        Value::Complex(v) => v.clone(),
    }
}
