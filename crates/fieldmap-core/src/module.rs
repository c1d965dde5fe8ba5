//! The module contract every format adapter implements
//!
//! A module gives the engine read or write access to one concrete document
//! format. Instances are registered on the [`MappingContext`] under a
//! document id, shared across all sessions created from that context, and
//! must therefore keep every piece of per-call state on the session - a
//! module that stashes mutable per-document state on itself is a
//! concurrency bug.
//!
//! [`MappingContext`]: crate::context::MappingContext
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::error::Result;
use crate::field::Field;
use crate::session::Session;

/// Whether a module serves reads or writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleMode {
    Source,
    Target,
}

impl ModuleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleMode::Source => "source",
            ModuleMode::Target => "target",
        }
    }
}

/// Format adapter contract
///
/// A SOURCE-mode module must refuse write calls and a TARGET-mode module
/// must refuse read calls, both with [`Error::Unsupported`].
///
/// [`Error::Unsupported`]: crate::error::Error::Unsupported
pub trait Module: Send + Sync + std::fmt::Debug {
    fn mode(&self) -> ModuleMode;

    /// Called once when the module is registered, before any session runs
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called when the owning context is dropped
    fn destroy(&mut self) {}

    /// A blank, type-correct field for this format
    fn create_field(&self) -> Field;

    /// Whether this module can service the given field
    fn is_supported_field(&self, field: &Field) -> bool;

    /// Populate the head's source field from the module's document,
    /// expanding into a field group when the path denotes every element
    fn read_source_value(&self, session: &mut Session) -> Result<()>;

    /// Prepare the head's target field, e.g. allocating parent containers
    fn populate_target_field(&self, session: &mut Session) -> Result<()>;

    /// Commit the head's converted target value into the module's document,
    /// creating intermediate containers and indices as needed
    fn write_target_value(&self, session: &mut Session) -> Result<()>;
}
