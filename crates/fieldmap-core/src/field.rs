//! Field and field group model
//!
//! A [`Field`] is one addressable value in a source or target document; a
//! [`FieldGroup`] is one collection level expanded into concrete indexed
//! fields. Modules produce groups when a path denotes "every element" and
//! the engine replays the rest of the pipeline once per member.
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::actions::ActionCall;
use crate::error::{Error, Result};
use crate::path::Path;
use crate::value::{FieldType, Value};
use serde::{Deserialize, Serialize};

/// Collection shape declared on a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectionType {
    #[default]
    None,
    Array,
    List,
    Map,
}

/// Whether the owning module can service this field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldStatus {
    #[default]
    Supported,
    Unsupported,
    /// The field was attempted and failed; its value is not trustworthy
    Error,
}

/// One addressable value in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Which document this field belongs to
    #[serde(default)]
    pub doc_id: Option<String>,
    pub path: Path,
    #[serde(default = "default_field_type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub collection_type: CollectionType,
    /// Position within the parent collection, for combine/separate alignment
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default = "default_value")]
    pub value: Value,
    /// Ordered action invocations applied after the source read
    #[serde(default)]
    pub actions: Vec<ActionCall>,
    #[serde(default)]
    pub status: FieldStatus,
}

fn default_field_type() -> FieldType {
    FieldType::Any
}

fn default_value() -> Value {
    Value::Null
}

impl Field {
    /// A blank field for the given document and path
    pub fn new(doc_id: impl Into<String>, path: Path, field_type: FieldType) -> Self {
        Self {
            doc_id: Some(doc_id.into()),
            path,
            field_type,
            collection_type: CollectionType::None,
            index: None,
            value: Value::Null,
            actions: Vec::new(),
            status: FieldStatus::Supported,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_collection_type(mut self, collection_type: CollectionType) -> Self {
        self.collection_type = collection_type;
        self
    }

    pub fn with_actions(mut self, actions: Vec<ActionCall>) -> Self {
        self.actions = actions;
        self
    }
}

/// An ordered sequence of fields sharing a parent path, representing one
/// collection level. Ordering is index order and drives combine/separate
/// index assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGroup {
    pub path: Path,
    pub field_type: FieldType,
    pub fields: Vec<Field>,
}

impl FieldGroup {
    pub fn new(path: Path, field_type: FieldType) -> Self {
        Self {
            path,
            field_type,
            fields: Vec::new(),
        }
    }

    /// Expand a template field into `n` indexed clones
    ///
    /// Each clone gets a distinct numeric index appended to the template's
    /// path, preserving the declared type and action chain.
    ///
    /// # Errors
    ///
    /// Expanding a template whose path already carries a concrete leaf index
    /// is a programming error and returns [`Error::InvalidState`].
    pub fn expand(template: &Field, n: usize) -> Result<FieldGroup> {
        if template.path.leaf().and_then(|s| s.index()).is_some() {
            return Err(Error::invalid_state(format!(
                "cannot expand field at already-indexed path {}",
                template.path
            )));
        }
        let mut group = FieldGroup::new(template.path.clone(), template.field_type);
        for i in 0..n {
            let mut member = template.clone();
            member.path = template.path.with_leaf_index(i)?;
            member.index = Some(i);
            group.fields.push(member);
        }
        Ok(group)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Field {
        Field::new(
            "orders",
            Path::parse("/lines<>").unwrap(),
            FieldType::String,
        )
        .with_actions(vec![ActionCall::named("Trim")])
    }

    #[test]
    fn test_clone_is_deep() {
        let field = template().with_value(Value::String("a".to_string()));
        let mut copy = field.clone();
        copy.value = Value::String("b".to_string());
        copy.actions.clear();
        assert_eq!(field.value, Value::String("a".to_string()));
        assert_eq!(field.actions.len(), 1);
    }

    #[test]
    fn test_expand_assigns_indices() {
        let group = FieldGroup::expand(&template(), 3).unwrap();
        assert_eq!(group.len(), 3);
        for (i, member) in group.fields.iter().enumerate() {
            assert_eq!(member.index, Some(i));
            assert_eq!(
                member.path,
                Path::parse(&format!("/lines<{}>", i)).unwrap()
            );
            assert_eq!(member.field_type, FieldType::String);
            assert_eq!(member.actions.len(), 1);
        }
    }

    #[test]
    fn test_expand_indexed_path_is_invalid_state() {
        let mut indexed = template();
        indexed.path = Path::parse("/lines<1>").unwrap();
        assert!(matches!(
            FieldGroup::expand(&indexed, 2),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn test_field_serde_defaults() {
        let field: Field = serde_json::from_value(serde_json::json!({
            "path": "/name",
        }))
        .unwrap();
        assert_eq!(field.field_type, FieldType::Any);
        assert_eq!(field.value, Value::Null);
        assert_eq!(field.status, FieldStatus::Supported);
        assert!(field.actions.is_empty());
    }
}
