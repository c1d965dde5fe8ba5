//! Session: one execution of a mapping context against concrete documents
//!
//! A session owns every piece of mutable run state - the attached source
//! and target documents, the constant/property overlays, the audit and
//! validation sinks, and the in-flight head fields the modules read and
//! write. The context it executes stays immutable and shared; any number
//! of sessions may run against one `Arc<MappingContext>` concurrently.
//!
//! `process()` walks the document's mapping entries in order. Failures are
//! isolated per entry: a failing entry leaves its outputs unset, records an
//! ERROR audit and execution moves on to the next entry. The one exception
//! is document resolution - a field naming a document id with no module
//! registered for its mode aborts the whole run with
//! [`Error::DocumentNotFound`].
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::audit::{Audits, Validations};
use crate::context::MappingContext;
use crate::error::{Error, Result};
use crate::field::{CollectionType, Field, FieldGroup};
use crate::mapping::{Mapping, MappingKind};
use crate::multiplicity;
use crate::path::{Path, Segment};
use crate::validate;
use crate::value::{FieldType, Value};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// The fields currently in flight between the engine and a module
#[derive(Default)]
pub struct Head {
    source_field: Option<Field>,
    source_group: Option<FieldGroup>,
    target_field: Option<Field>,
}

impl Head {
    pub fn source_field(&self) -> Option<&Field> {
        self.source_field.as_ref()
    }

    /// Set by source modules after a scalar read
    pub fn set_source_field(&mut self, field: Field) {
        self.source_field = Some(field);
    }

    pub fn source_group(&self) -> Option<&FieldGroup> {
        self.source_group.as_ref()
    }

    /// Set by source modules when the path expanded into a collection
    pub fn set_source_group(&mut self, group: FieldGroup) {
        self.source_group = Some(group);
    }

    pub fn target_field(&self) -> Option<&Field> {
        self.target_field.as_ref()
    }

    pub fn set_target_field(&mut self, field: Field) {
        self.target_field = Some(field);
    }

    fn take_source_field(&mut self) -> Option<Field> {
        self.source_field.take()
    }

    fn take_source_group(&mut self) -> Option<FieldGroup> {
        self.source_group.take()
    }

    fn clear(&mut self) {
        self.source_field = None;
        self.source_group = None;
        self.target_field = None;
    }
}

/// One execution of a [`MappingContext`] against attached documents
pub struct Session {
    context: Arc<MappingContext>,
    source_documents: HashMap<String, Box<dyn Any + Send>>,
    target_documents: HashMap<String, Box<dyn Any + Send>>,
    constants: HashMap<String, String>,
    properties: HashMap<String, String>,
    audits: Audits,
    validations: Validations,
    head: Head,
}

impl Session {
    pub(crate) fn new(context: Arc<MappingContext>) -> Self {
        let constants = context.document().constants.clone();
        let properties = context.document().properties.clone();
        Self {
            context,
            source_documents: HashMap::new(),
            target_documents: HashMap::new(),
            constants,
            properties,
            audits: Audits::new(),
            validations: Validations::new(),
            head: Head::default(),
        }
    }

    pub fn context(&self) -> &MappingContext {
        &self.context
    }

    /// Attach a source document under its id
    pub fn set_source_document<T: Any + Send>(&mut self, doc_id: impl Into<String>, document: T) {
        self.source_documents.insert(doc_id.into(), Box::new(document));
    }

    /// The attached source document, downcast to its concrete type
    pub fn source_document<T: Any + Send>(&self, doc_id: &str) -> Option<&T> {
        self.source_documents
            .get(doc_id)
            .and_then(|d| d.downcast_ref::<T>())
    }

    /// Attach (or replace) a target document under its id
    pub fn set_target_document<T: Any + Send>(&mut self, doc_id: impl Into<String>, document: T) {
        self.target_documents.insert(doc_id.into(), Box::new(document));
    }

    pub fn target_document<T: Any + Send>(&self, doc_id: &str) -> Option<&T> {
        self.target_documents
            .get(doc_id)
            .and_then(|d| d.downcast_ref::<T>())
    }

    pub fn target_document_mut<T: Any + Send>(&mut self, doc_id: &str) -> Option<&mut T> {
        self.target_documents
            .get_mut(doc_id)
            .and_then(|d| d.downcast_mut::<T>())
    }

    pub fn has_target_document(&self, doc_id: &str) -> bool {
        self.target_documents.contains_key(doc_id)
    }

    /// Constants seeded from the document; read through the constants module
    pub fn constants(&self) -> &HashMap<String, String> {
        &self.constants
    }

    pub fn set_constant(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.constants.insert(name.into(), value.into());
    }

    /// Properties seeded from the document plus session overlays
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn audits(&self) -> &Audits {
        &self.audits
    }

    pub fn audits_mut(&mut self) -> &mut Audits {
        &mut self.audits
    }

    pub fn validations(&self) -> &Validations {
        &self.validations
    }

    pub fn has_errors(&self) -> bool {
        self.audits.has_errors()
    }

    pub fn has_warns(&self) -> bool {
        self.audits.has_warns()
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn head_mut(&mut self) -> &mut Head {
        &mut self.head
    }

    /// Execute every mapping entry of the context's document in order
    ///
    /// Pre-execution validations are recorded first. Entries then run one
    /// by one; a failing entry records an ERROR audit and execution
    /// continues with the next. Only [`Error::DocumentNotFound`] aborts
    /// the run.
    pub fn process(&mut self) -> Result<()> {
        let context = Arc::clone(&self.context);
        for validation in validate::validate_document(context.document()) {
            self.validations.add(validation);
        }

        for mapping in &context.document().mappings {
            let entry = mapping.display_id();
            debug!(mapping = %entry, kind = mapping.kind.name(), "processing mapping entry");
            let result = match &mapping.kind {
                MappingKind::Map => self.process_map(&context, mapping),
                MappingKind::Separate { delimiter, limit } => {
                    self.process_separate(&context, mapping, delimiter, *limit)
                }
                MappingKind::Combine {
                    delimiter,
                    limit,
                    auto_trim,
                    add_delimiter_on_null,
                } => self.process_combine(
                    &context,
                    mapping,
                    delimiter,
                    *limit,
                    *auto_trim,
                    *add_delimiter_on_null,
                ),
                MappingKind::Lookup { table } => self.process_lookup(&context, mapping, table),
            };
            self.head.clear();

            match result {
                Ok(()) => {}
                Err(e @ Error::DocumentNotFound { .. }) => return Err(e),
                Err(e) => {
                    warn!(mapping = %entry, error = %e, "mapping entry failed");
                    self.audits.add_error(
                        format!("Mapping '{}' failed: {}", entry, e),
                        mapping.output_fields.first().map(|f| f.path.to_string()),
                    );
                }
            }
        }
        Ok(())
    }

    fn process_map(&mut self, context: &MappingContext, mapping: &Mapping) -> Result<()> {
        let input = single_field(&mapping.input_fields, "input", "Map")?;
        let output = single_field(&mapping.output_fields, "output", "Map")?;
        context.target_module(require_doc_id(output)?)?;
        self.read_source(context, input)?;

        if let Some(group) = self.head.take_source_group() {
            let scalar_target =
                output.collection_type == CollectionType::None && !expands(&output.path);
            if scalar_target {
                // Collection into a scalar: the last element wins
                if let Some(member) = group.fields.into_iter().last() {
                    self.map_one(context, member, output, None)?;
                }
            } else {
                for member in group.fields {
                    let index = member.index;
                    self.map_one(context, member, output, index)?;
                }
            }
        } else if let Some(field) = self.head.take_source_field() {
            self.map_one(context, field, output, None)?;
        }
        Ok(())
    }

    /// Run the action chain and type conversion for one source field and
    /// write the result to the output, at `index` within its collection
    fn map_one(
        &mut self,
        context: &MappingContext,
        mut field: Field,
        output: &Field,
        index: Option<usize>,
    ) -> Result<()> {
        let actions = field.actions.clone();
        context
            .actions()
            .process_actions(&actions, &mut field, &mut self.audits)?;
        let value = context.converters().convert_to(&field.value, output.field_type)?;

        let mut target = output.clone();
        if let Some(index) = index {
            target.path = with_collection_index(&output.path, index)?;
            target.index = Some(index);
        }
        target.value = value;
        self.write_target(context, target)
    }

    fn process_separate(
        &mut self,
        context: &MappingContext,
        mapping: &Mapping,
        delimiter: &str,
        limit: Option<usize>,
    ) -> Result<()> {
        let input = single_field(&mapping.input_fields, "input", "Separate")?;
        if mapping.output_fields.is_empty() {
            return Err(Error::multiplicity(
                "Separate requires at least one output field".to_string(),
            ));
        }
        for output in &mapping.output_fields {
            context.target_module(require_doc_id(output)?)?;
        }
        self.read_source(context, input)?;
        let mut field = self.take_single_read(input);
        let actions = field.actions.clone();
        context
            .actions()
            .process_actions(&actions, &mut field, &mut self.audits)?;

        // A null source yields no segments at all
        let segments = match context.converters().convert_to(&field.value, FieldType::String)? {
            Value::String(text) => multiplicity::separate(&text, delimiter, limit, &mut self.audits)?,
            _ => Vec::new(),
        };

        for output in &mapping.output_fields {
            let index = output
                .index
                .or_else(|| output.path.leaf().and_then(Segment::index))
                .unwrap_or(0);
            match segments.get(index) {
                Some(segment) => {
                    let value = context
                        .converters()
                        .convert_to(&Value::String(segment.clone()), output.field_type)?;
                    let mut target = output.clone();
                    target.value = value;
                    self.write_target(context, target)?;
                }
                None => {
                    self.audits.add_warn(
                        multiplicity::short_segments_message(
                            segments.len(),
                            &output.path.to_string(),
                            index,
                        ),
                        Some(output.path.to_string()),
                    );
                }
            }
        }
        Ok(())
    }

    fn process_combine(
        &mut self,
        context: &MappingContext,
        mapping: &Mapping,
        delimiter: &str,
        limit: usize,
        auto_trim: bool,
        add_delimiter_on_null: bool,
    ) -> Result<()> {
        let output = single_field(&mapping.output_fields, "output", "Combine")?;
        if mapping.input_fields.is_empty() {
            return Err(Error::multiplicity(
                "Combine requires at least one input field".to_string(),
            ));
        }
        context.target_module(require_doc_id(output)?)?;
        for input in &mapping.input_fields {
            context.source_module(require_doc_id(input)?)?;
        }

        let mut parts: Vec<(Option<usize>, Option<String>)> =
            Vec::with_capacity(mapping.input_fields.len());
        for input in &mapping.input_fields {
            self.read_source(context, input)?;
            let mut field = self.take_single_read(input);
            let actions = field.actions.clone();
            context
                .actions()
                .process_actions(&actions, &mut field, &mut self.audits)?;
            let text = match context.converters().convert_to(&field.value, FieldType::String)? {
                Value::String(s) => Some(s),
                _ => None,
            };
            parts.push((input.index.or(field.index), text));
        }

        let combined =
            multiplicity::combine(&parts, delimiter, limit, auto_trim, add_delimiter_on_null);
        let value = context
            .converters()
            .convert_to(&Value::String(combined), output.field_type)?;
        let mut target = output.clone();
        target.value = value;
        self.write_target(context, target)
    }

    fn process_lookup(
        &mut self,
        context: &MappingContext,
        mapping: &Mapping,
        table_name: &str,
    ) -> Result<()> {
        let input = single_field(&mapping.input_fields, "input", "Lookup")?;
        let output = single_field(&mapping.output_fields, "output", "Lookup")?;
        let table = context.document().lookup_table(table_name).ok_or_else(|| {
            Error::multiplicity(format!("Lookup references unknown table '{}'", table_name))
        })?;
        context.target_module(require_doc_id(output)?)?;
        self.read_source(context, input)?;
        let mut field = self.take_single_read(input);
        let actions = field.actions.clone();
        context
            .actions()
            .process_actions(&actions, &mut field, &mut self.audits)?;

        let text = match context.converters().convert_to(&field.value, FieldType::String)? {
            Value::String(s) => s,
            _ => String::new(),
        };
        // A miss leaves the output unset; the lookup already warned
        match multiplicity::lookup(&text, table, &mut self.audits) {
            Some(found) => {
                let value = context
                    .converters()
                    .convert_to(&Value::String(found), output.field_type)?;
                let mut target = output.clone();
                target.value = value;
                self.write_target(context, target)
            }
            None => Ok(()),
        }
    }

    /// Resolve the input's module and have it populate the head
    fn read_source(&mut self, context: &MappingContext, input: &Field) -> Result<()> {
        let module = context.source_module(require_doc_id(input)?)?;
        if !module.is_supported_field(input) {
            return Err(Error::unsupported(format!(
                "source field {} is not supported by its module",
                input.path
            )));
        }
        self.head.source_field = Some(input.clone());
        self.head.source_group = None;
        module.read_source_value(self)
    }

    /// The one field a single-value strategy consumes from the last read;
    /// a group collapses to its last element
    fn take_single_read(&mut self, input: &Field) -> Field {
        if let Some(group) = self.head.take_source_group() {
            return group
                .fields
                .into_iter()
                .last()
                .unwrap_or_else(|| input.clone());
        }
        self.head
            .take_source_field()
            .unwrap_or_else(|| input.clone())
    }

    /// Resolve the target's module and have it commit the head field
    fn write_target(&mut self, context: &MappingContext, field: Field) -> Result<()> {
        let doc_id = require_doc_id(&field)?.to_string();
        let module = context.target_module(&doc_id)?;
        self.head.target_field = Some(field);
        module.populate_target_field(self)?;
        module.write_target_value(self)
    }
}

/// Whether the path addresses every element of some collection level
fn expands(path: &Path) -> bool {
    path.segments()
        .iter()
        .any(|s| s.is_collection() && s.index().is_none())
}

/// The path with its first unindexed collection segment made concrete, or
/// the leaf indexed when no collection segment is open
fn with_collection_index(path: &Path, index: usize) -> Result<Path> {
    let mut segments = path.segments().to_vec();
    if let Some(pos) = segments
        .iter()
        .position(|s| s.is_collection() && s.index().is_none())
    {
        segments[pos] = segments[pos].with_index(index);
        return Ok(Path::from_segments(segments));
    }
    path.with_leaf_index(index)
}

fn single_field<'a>(fields: &'a [Field], role: &str, kind: &str) -> Result<&'a Field> {
    match fields {
        [field] => Ok(field),
        _ => Err(Error::multiplicity(format!(
            "{} requires exactly one {} field, got {}",
            kind,
            role,
            fields.len()
        ))),
    }
}

fn require_doc_id(field: &Field) -> Result<&str> {
    field.doc_id.as_deref().ok_or_else(|| {
        Error::invalid_state(format!("field {} names no document id", field.path))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingDocument;

    fn session() -> Session {
        let context = Arc::new(
            MappingContext::new(MappingDocument::default()).unwrap(),
        );
        context.create_session()
    }

    #[test]
    fn test_typed_document_accessors() {
        let mut session = session();
        session.set_source_document("orders", serde_json::json!({"id": 7}));
        assert_eq!(
            session.source_document::<serde_json::Value>("orders"),
            Some(&serde_json::json!({"id": 7}))
        );
        // Wrong type downcasts to nothing
        assert_eq!(session.source_document::<String>("orders"), None);
        assert_eq!(session.source_document::<serde_json::Value>("absent"), None);
    }

    #[test]
    fn test_target_document_mut() {
        let mut session = session();
        session.set_target_document("out", serde_json::json!({}));
        *session.target_document_mut::<serde_json::Value>("out").unwrap() =
            serde_json::json!({"done": true});
        assert_eq!(
            session.target_document::<serde_json::Value>("out"),
            Some(&serde_json::json!({"done": true}))
        );
    }

    #[test]
    fn test_properties_overlay_document_seeds() {
        let mut document = MappingDocument::default();
        document.properties.insert("env".to_string(), "dev".to_string());
        let context = Arc::new(MappingContext::new(document).unwrap());
        let mut session = context.create_session();
        assert_eq!(session.properties().get("env").map(String::as_str), Some("dev"));
        session.set_property("env", "prod");
        assert_eq!(session.properties().get("env").map(String::as_str), Some("prod"));
    }

    #[test]
    fn test_with_collection_index() {
        let path = Path::parse("/lines[]/sku").unwrap();
        assert_eq!(
            with_collection_index(&path, 2).unwrap(),
            Path::parse("/lines[2]/sku").unwrap()
        );
        let plain = Path::parse("/name").unwrap();
        assert_eq!(
            with_collection_index(&plain, 1).unwrap(),
            Path::parse("/name[1]").unwrap()
        );
    }
}
