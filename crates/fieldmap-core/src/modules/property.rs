//! Source module exposing session properties as string fields
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::field::{Field, FieldStatus};
use crate::module::{Module, ModuleMode};
use crate::path::Path;
use crate::session::Session;
use crate::value::{FieldType, Value};
use tracing::warn;

/// Document id the properties module is registered under
pub const PROPERTIES_DOC_ID: &str = "PROPERTY";

/// Read-only access to the session's properties
///
/// Same contract as the constants module, but over the property overlay:
/// the document seeds properties and the session may overwrite them before
/// `process()`.
#[derive(Debug)]
pub struct PropertyModule;

impl Module for PropertyModule {
    fn mode(&self) -> ModuleMode {
        ModuleMode::Source
    }

    fn create_field(&self) -> Field {
        Field::new(PROPERTIES_DOC_ID, Path::root(), FieldType::String)
    }

    fn is_supported_field(&self, field: &Field) -> bool {
        matches!(field.field_type, FieldType::String | FieldType::Any)
    }

    fn read_source_value(&self, session: &mut Session) -> Result<()> {
        let mut field = session
            .head()
            .source_field()
            .cloned()
            .ok_or_else(|| Error::invalid_state("no source field in flight"))?;
        let name = field
            .path
            .leaf_name()
            .ok_or_else(|| Error::invalid_state("property path has no name segment"))?
            .to_string();

        match session.properties().get(&name) {
            Some(value) => {
                field.value = Value::String(value.clone());
            }
            None => {
                warn!(property = %name, "property not set");
                session.audits_mut().add_warn(
                    format!("Property '{}' is not set", name),
                    Some(field.path.to_string()),
                );
                field.value = Value::Null;
                field.status = FieldStatus::Unsupported;
            }
        }
        session.head_mut().set_source_field(field);
        Ok(())
    }

    fn populate_target_field(&self, _session: &mut Session) -> Result<()> {
        Err(Error::unsupported("properties are read-only".to_string()))
    }

    fn write_target_value(&self, _session: &mut Session) -> Result<()> {
        Err(Error::unsupported("properties are read-only".to_string()))
    }
}
