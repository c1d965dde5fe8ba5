//! Fieldmap Core - Declarative data mapping engine
//!
//! This crate executes compiled mapping documents against concrete source
//! and target documents: it reads values through format modules, runs field
//! action chains, converts between the closed set of field types and writes
//! the results out, collecting audits instead of aborting on per-entry
//! failures.
//!
//! # Main Components
//!
//! - **Error Handling**: Error types using `thiserror` and `anyhow`
//! - **Path & Field Model**: Addressing values inside documents
//! - **Conversion Service**: The type conversion matrix between field types
//! - **Field Actions**: Named, typed transformation functions with overloads
//! - **Multiplicity**: Separate, Combine and Lookup strategies
//! - **Modules**: Format adapters (JSON, constants, properties)
//! - **Context & Session**: One shared compiled context, many concurrent runs
//!
//! # Example
//!
//! ```no_run
//! use fieldmap_core::{
//!     Field, FieldType, JsonModule, Mapping, MappingContext, MappingDocument,
//!     MappingKind, Path, Result,
//! };
//! use std::sync::Arc;
//!
//! fn example() -> Result<()> {
//!     let document = MappingDocument::new("demo").with_mapping(
//!         Mapping::new(MappingKind::Map)
//!             .with_input(Field::new("in", Path::parse("/name")?, FieldType::String))
//!             .with_output(Field::new("out", Path::parse("/fullName")?, FieldType::String)),
//!     );
//!     let mut context = MappingContext::new(document)?;
//!     context.register_source_module("in", Box::new(JsonModule::source()))?;
//!     context.register_target_module("out", Box::new(JsonModule::target()))?;
//!     let context = Arc::new(context);
//!
//!     let mut session = context.create_session();
//!     session.set_source_document("in", serde_json::json!({"name": "Ozzie"}));
//!     session.process()?;
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod audit;
pub mod context;
pub mod convert;
pub mod error;
pub mod field;
pub mod mapping;
pub mod module;
pub mod modules;
pub mod multiplicity;
pub mod path;
pub mod session;
pub mod validate;
pub mod value;

// Re-export main types for convenience
pub use actions::{ActionCall, ActionDetail, ActionFn, ActionRegistry, OnFailure, Params};
pub use audit::{
    Audit, AuditStatus, Audits, Validation, ValidationScope, ValidationStatus, Validations,
};
pub use context::MappingContext;
pub use convert::{Converter, ConverterRegistry};
pub use error::{Error, Result};
pub use field::{CollectionType, Field, FieldGroup, FieldStatus};
pub use mapping::{
    LookupEntry, LookupTable, Mapping, MappingDocument, MappingKind, DEFAULT_DELIMITER,
    DEFAULT_LIMIT,
};
pub use module::{Module, ModuleMode};
pub use modules::{ConstantModule, JsonModule, PropertyModule, CONSTANTS_DOC_ID, PROPERTIES_DOC_ID};
pub use path::{CollectionMarker, Path, Segment};
pub use session::{Head, Session};
pub use validate::validate_document;
pub use value::{FieldType, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version_is_set() {
        assert!(!super::VERSION.is_empty());
    }
}
