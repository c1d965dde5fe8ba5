//! Source module exposing the session's constants as string fields
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

/// Document id the constants module is registered under
pub const CONSTANTS_DOC_ID: &str = "CONSTANT";

/// Read-only access to the document's constant values
///
/// A constant field's path leaf names the constant; the value is always a
/// string. An unknown name is not fatal: the field reads as null with an
/// `Unsupported` status and a WARN audit.
#[derive(Debug)]
pub struct ConstantModule;

impl Module for ConstantModule {
    fn mode(&self) -> ModuleMode {
        ModuleMode::Source
    }

    fn create_field(&self) -> Field {
        Field::new(CONSTANTS_DOC_ID, Path::root(), FieldType::String)
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
            .ok_or_else(|| Error::invalid_state("constant path has no name segment"))?
            .to_string();

        match session.constants().get(&name) {
            Some(value) => {
                field.value = Value::String(value.clone());
            }
            None => {
                warn!(constant = %name, "constant not defined");
                session.audits_mut().add_warn(
                    format!("Constant '{}' is not defined", name),
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
        Err(Error::unsupported("constants are read-only".to_string()))
    }

    fn write_target_value(&self, _session: &mut Session) -> Result<()> {
        Err(Error::unsupported("constants are read-only".to_string()))
    }
}
