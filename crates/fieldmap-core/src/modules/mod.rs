//! Built-in format modules
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

mod constant;
mod json;
mod property;

pub use constant::{ConstantModule, CONSTANTS_DOC_ID};
pub use json::JsonModule;
pub use property::{PropertyModule, PROPERTIES_DOC_ID};
