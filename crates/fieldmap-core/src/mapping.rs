//! The mapping document object graph
//!
//! A [`MappingDocument`] is the compiled, in-memory form of a declarative
//! mapping: an ordered list of [`Mapping`] entries plus lookup tables and
//! constant/property seeds. How the document is marshalled (JSON, XML) is
//! the host's business; the engine only consumes this graph, and the types
//! derive serde so hosts can load them from JSON directly.
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::field::Field;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default delimiter for Separate and Combine
pub const DEFAULT_DELIMITER: &str = " ";
/// Default element cap for Combine, and for Separate when a limit is set
pub const DEFAULT_LIMIT: usize = 512;

/// One transformation rule between input and output fields
///
/// The kind-specific configuration lives on [`MappingKind`]; the shared
/// shape (ordered field lists) lives here. Arity invariants per kind are
/// enforced by pre-validation and re-checked at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub kind: MappingKind,
    #[serde(default)]
    pub input_fields: Vec<Field>,
    #[serde(default)]
    pub output_fields: Vec<Field>,
}

impl Mapping {
    pub fn new(kind: MappingKind) -> Self {
        Self {
            id: None,
            kind,
            input_fields: Vec::new(),
            output_fields: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_input(mut self, field: Field) -> Self {
        self.input_fields.push(field);
        self
    }

    pub fn with_output(mut self, field: Field) -> Self {
        self.output_fields.push(field);
        self
    }

    /// Identifier used in audits: the explicit id, or the first input path
    pub fn display_id(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }
        self.input_fields
            .first()
            .map(|f| f.path.to_string())
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

/// The closed set of mapping kinds with their kind-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MappingKind {
    /// One input field to one output field
    Map,
    /// One input value split into many output fields by a delimiter pattern
    #[serde(rename_all = "camelCase")]
    Separate {
        #[serde(default = "default_delimiter")]
        delimiter: String,
        /// Segments beyond the limit are dropped with a warning
        #[serde(default)]
        limit: Option<usize>,
    },
    /// Many indexed input values joined into one output value
    #[serde(rename_all = "camelCase")]
    Combine {
        #[serde(default = "default_delimiter")]
        delimiter: String,
        #[serde(default = "default_limit")]
        limit: usize,
        /// Trim each non-null value before joining
        #[serde(default = "default_true")]
        auto_trim: bool,
        /// When off, a null element also suppresses its separating delimiter,
        /// joining its neighbors directly
        #[serde(default = "default_true")]
        add_delimiter_on_null: bool,
    },
    /// Value substitution through a named lookup table
    Lookup { table: String },
}

impl MappingKind {
    /// Combine with the pinned defaults: delimiter `" "`, limit 512,
    /// auto-trim on, add-delimiter-on-null on.
    pub fn combine_defaults() -> Self {
        MappingKind::Combine {
            delimiter: DEFAULT_DELIMITER.to_string(),
            limit: DEFAULT_LIMIT,
            auto_trim: true,
            add_delimiter_on_null: true,
        }
    }

    /// Separate with the pinned defaults: delimiter `" "`, no limit.
    pub fn separate_defaults() -> Self {
        MappingKind::Separate {
            delimiter: DEFAULT_DELIMITER.to_string(),
            limit: None,
        }
    }

    /// Human-readable kind name, used in audits and validations
    pub fn name(&self) -> &'static str {
        match self {
            MappingKind::Map => "Map",
            MappingKind::Separate { .. } => "Separate",
            MappingKind::Combine { .. } => "Combine",
            MappingKind::Lookup { .. } => "Lookup",
        }
    }
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_true() -> bool {
    true
}

/// One (source, target) substitution pair in a lookup table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub source: String,
    pub target: String,
}

/// A named, ordered substitution table; names are unique per document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupTable {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<LookupEntry>,
}

impl LookupTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn with_entry(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.entries.push(LookupEntry {
            source: source.into(),
            target: target.into(),
        });
        self
    }

    /// Target value of the first entry whose source equals `value`
    pub fn find(&self, value: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.source == value)
            .map(|e| e.target.as_str())
    }
}

/// The compiled mapping document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mappings: Vec<Mapping>,
    #[serde(default)]
    pub lookup_tables: Vec<LookupTable>,
    /// Constant values readable through the constants module
    #[serde(default)]
    pub constants: HashMap<String, String>,
    /// Property seeds readable through the properties module; sessions may
    /// overlay their own
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl MappingDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    pub fn with_lookup_table(mut self, table: LookupTable) -> Self {
        self.lookup_tables.push(table);
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.constants.insert(name.into(), value.into());
        self
    }

    pub fn lookup_table(&self, name: &str) -> Option<&LookupTable> {
        self.lookup_tables.iter().find(|t| t.name == name)
    }
}
