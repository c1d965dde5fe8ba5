//! Mapping context: the shared, immutable execution environment
//!
//! A context is built once from a compiled [`MappingDocument`] plus
//! explicitly constructed registries, then shared behind an `Arc` by any
//! number of concurrent sessions. Registries and module instances are
//! read-only after construction; every mutable bit of a run lives on the
//! [`Session`].
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::actions::ActionRegistry;
use crate::convert::ConverterRegistry;
use crate::error::{Error, Result};
use crate::mapping::MappingDocument;
use crate::module::{Module, ModuleMode};
use crate::modules::{ConstantModule, PropertyModule, CONSTANTS_DOC_ID, PROPERTIES_DOC_ID};
use crate::session::Session;
use std::collections::HashMap;
use std::sync::Arc;

/// The compiled mapping document plus the registries one execution needs
pub struct MappingContext {
    document: MappingDocument,
    actions: ActionRegistry,
    converters: ConverterRegistry,
    source_modules: HashMap<String, Box<dyn Module>>,
    target_modules: HashMap<String, Box<dyn Module>>,
}

impl MappingContext {
    /// A context with the built-in action and converter registries and the
    /// constants/properties modules pre-registered
    pub fn new(document: MappingDocument) -> Result<Self> {
        Self::with_registries(document, ActionRegistry::with_builtins(), ConverterRegistry::new())
    }

    /// A context around caller-constructed registries
    pub fn with_registries(
        document: MappingDocument,
        actions: ActionRegistry,
        converters: ConverterRegistry,
    ) -> Result<Self> {
        let mut context = Self {
            document,
            actions,
            converters,
            source_modules: HashMap::new(),
            target_modules: HashMap::new(),
        };
        context.register_source_module(CONSTANTS_DOC_ID, Box::new(ConstantModule))?;
        context.register_source_module(PROPERTIES_DOC_ID, Box::new(PropertyModule))?;
        Ok(context)
    }

    /// Register a source module under a document id, running its `init`
    pub fn register_source_module(
        &mut self,
        doc_id: impl Into<String>,
        mut module: Box<dyn Module>,
    ) -> Result<()> {
        if module.mode() != ModuleMode::Source {
            return Err(Error::unsupported(
                "cannot register a target-mode module as a source".to_string(),
            ));
        }
        module.init()?;
        self.source_modules.insert(doc_id.into(), module);
        Ok(())
    }

    /// Register a target module under a document id, running its `init`
    pub fn register_target_module(
        &mut self,
        doc_id: impl Into<String>,
        mut module: Box<dyn Module>,
    ) -> Result<()> {
        if module.mode() != ModuleMode::Target {
            return Err(Error::unsupported(
                "cannot register a source-mode module as a target".to_string(),
            ));
        }
        module.init()?;
        self.target_modules.insert(doc_id.into(), module);
        Ok(())
    }

    pub fn document(&self) -> &MappingDocument {
        &self.document
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Mutable access to the action registry; only valid before the context
    /// is shared
    pub fn actions_mut(&mut self) -> &mut ActionRegistry {
        &mut self.actions
    }

    /// Mutable access to the converter registry; only valid before the
    /// context is shared
    pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.converters
    }

    /// Resolve the source module for a document id
    ///
    /// # Errors
    ///
    /// [`Error::DocumentNotFound`] when no source module is registered
    /// under the id - including when only a target module is.
    pub fn source_module(&self, doc_id: &str) -> Result<&dyn Module> {
        self.source_modules
            .get(doc_id)
            .map(Box::as_ref)
            .ok_or_else(|| self.not_found(doc_id, ModuleMode::Source))
    }

    /// Resolve the target module for a document id
    pub fn target_module(&self, doc_id: &str) -> Result<&dyn Module> {
        self.target_modules
            .get(doc_id)
            .map(Box::as_ref)
            .ok_or_else(|| self.not_found(doc_id, ModuleMode::Target))
    }

    fn not_found(&self, doc_id: &str, mode: ModuleMode) -> Error {
        let other = match mode {
            ModuleMode::Source => self.target_modules.contains_key(doc_id),
            ModuleMode::Target => self.source_modules.contains_key(doc_id),
        };
        let message = if other {
            format!("document is registered in the opposite mode, not as a {}", mode.as_str())
        } else {
            format!("no {} module registered for this document id", mode.as_str())
        };
        Error::DocumentNotFound {
            doc_id: doc_id.to_string(),
            message,
        }
    }

    /// Create a new session for one execution of this context's document
    pub fn create_session(self: &Arc<Self>) -> Session {
        Session::new(Arc::clone(self))
    }
}

impl Drop for MappingContext {
    fn drop(&mut self) {
        for module in self.source_modules.values_mut() {
            module.destroy();
        }
        for module in self.target_modules.values_mut() {
            module.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::JsonModule;

    #[test]
    fn test_builtin_modules_registered() {
        let context = MappingContext::new(MappingDocument::default()).unwrap();
        assert!(context.source_module(CONSTANTS_DOC_ID).is_ok());
        assert!(context.source_module(PROPERTIES_DOC_ID).is_ok());
        assert!(matches!(
            context.source_module("unknown"),
            Err(Error::DocumentNotFound { .. })
        ));
    }

    #[test]
    fn test_mode_mismatch_at_registration() {
        let mut context = MappingContext::new(MappingDocument::default()).unwrap();
        assert!(matches!(
            context.register_source_module("t", Box::new(JsonModule::target())),
            Err(Error::Unsupported { .. })
        ));
        assert!(matches!(
            context.register_target_module("s", Box::new(JsonModule::source())),
            Err(Error::Unsupported { .. })
        ));
    }

    #[test]
    fn test_mode_mismatch_at_resolution() {
        let mut context = MappingContext::new(MappingDocument::default()).unwrap();
        context
            .register_target_module("orders", Box::new(JsonModule::target()))
            .unwrap();
        let err = context.source_module("orders").unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound { .. }));
        assert!(err.to_string().contains("opposite mode"));
    }
}
