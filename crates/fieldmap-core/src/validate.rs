//! Pre-execution checks over a mapping document
//!
//! These catch structural problems before any document is touched: arity
//! violations per mapping kind, references to unknown lookup tables and
//! duplicate table names. Path syntax needs no check here - a [`Path`] in
//! the object graph was already parsed. Findings are recorded on the
//! session; an ERROR finding predicts the entry will fail at execution
//! time, it does not stop the run by itself.
//!
//! [`Path`]: crate::path::Path
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::audit::{Validation, ValidationScope, ValidationStatus};
use crate::mapping::{Mapping, MappingDocument, MappingKind};
use std::collections::HashSet;

/// Validate a document, returning every finding
pub fn validate_document(document: &MappingDocument) -> Vec<Validation> {
    let mut findings = Vec::new();

    let mut names = HashSet::new();
    for table in &document.lookup_tables {
        if !names.insert(table.name.as_str()) {
            findings.push(Validation {
                scope: ValidationScope::LookupTable,
                status: ValidationStatus::Error,
                field: None,
                message: format!("duplicate lookup table name '{}'", table.name),
            });
        }
        if table.entries.is_empty() {
            findings.push(Validation {
                scope: ValidationScope::LookupTable,
                status: ValidationStatus::Warn,
                field: None,
                message: format!("lookup table '{}' has no entries", table.name),
            });
        }
    }

    for mapping in &document.mappings {
        validate_mapping(document, mapping, &mut findings);
    }
    findings
}

fn validate_mapping(
    document: &MappingDocument,
    mapping: &Mapping,
    findings: &mut Vec<Validation>,
) {
    let entry = mapping.display_id();
    let inputs = mapping.input_fields.len();
    let outputs = mapping.output_fields.len();

    match &mapping.kind {
        MappingKind::Map => {
            if inputs != 1 || outputs != 1 {
                arity_error(findings, format!(
                    "Map mapping '{}' requires exactly one input and one output field, got {} and {}",
                    entry, inputs, outputs
                ));
            }
        }
        MappingKind::Separate { .. } => {
            if inputs != 1 {
                arity_error(findings, format!(
                    "Separate mapping '{}' requires exactly one input field, got {}",
                    entry, inputs
                ));
            }
            if outputs == 0 {
                arity_error(findings, format!(
                    "Separate mapping '{}' requires at least one output field",
                    entry
                ));
            }
            for output in &mapping.output_fields {
                let indexed =
                    output.index.is_some() || output.path.leaf().and_then(|s| s.index()).is_some();
                if !indexed {
                    findings.push(Validation {
                        scope: ValidationScope::Field,
                        status: ValidationStatus::Warn,
                        field: Some(output.path.to_string()),
                        message: format!(
                            "Separate mapping '{}' output {} carries no index; it receives segment 0",
                            entry, output.path
                        ),
                    });
                }
            }
        }
        MappingKind::Combine { .. } => {
            if inputs == 0 {
                arity_error(findings, format!(
                    "Combine mapping '{}' requires at least one input field",
                    entry
                ));
            }
            if outputs != 1 {
                arity_error(findings, format!(
                    "Combine mapping '{}' requires exactly one output field, got {}",
                    entry, outputs
                ));
            }
            for input in &mapping.input_fields {
                if input.index.is_none() {
                    findings.push(Validation {
                        scope: ValidationScope::Field,
                        status: ValidationStatus::Warn,
                        field: Some(input.path.to_string()),
                        message: format!(
                            "Combine mapping '{}' input {} carries no index; it sorts first",
                            entry, input.path
                        ),
                    });
                }
            }
        }
        MappingKind::Lookup { table } => {
            if inputs != 1 || outputs != 1 {
                arity_error(findings, format!(
                    "Lookup mapping '{}' requires exactly one input and one output field, got {} and {}",
                    entry, inputs, outputs
                ));
            }
            if document.lookup_table(table).is_none() {
                findings.push(Validation {
                    scope: ValidationScope::Mapping,
                    status: ValidationStatus::Error,
                    field: None,
                    message: format!(
                        "Lookup mapping '{}' references unknown table '{}'",
                        entry, table
                    ),
                });
            }
        }
    }
}

fn arity_error(findings: &mut Vec<Validation>, message: String) {
    findings.push(Validation {
        scope: ValidationScope::Mapping,
        status: ValidationStatus::Error,
        field: None,
        message,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::mapping::LookupTable;
    use crate::path::Path;
    use crate::value::FieldType;

    fn field(path: &str) -> Field {
        Field::new("d", Path::parse(path).unwrap(), FieldType::String)
    }

    #[test]
    fn test_clean_document() {
        let doc = MappingDocument::new("ok").with_mapping(
            Mapping::new(MappingKind::Map)
                .with_input(field("/a"))
                .with_output(field("/b")),
        );
        assert!(validate_document(&doc).is_empty());
    }

    #[test]
    fn test_map_arity() {
        let doc = MappingDocument::new("bad")
            .with_mapping(Mapping::new(MappingKind::Map).with_input(field("/a")));
        let findings = validate_document(&doc);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].status, ValidationStatus::Error);
        assert_eq!(findings[0].scope, ValidationScope::Mapping);
    }

    #[test]
    fn test_unknown_lookup_table() {
        let doc = MappingDocument::new("bad").with_mapping(
            Mapping::new(MappingKind::Lookup {
                table: "states".to_string(),
            })
            .with_input(field("/a"))
            .with_output(field("/b")),
        );
        let findings = validate_document(&doc);
        assert!(findings
            .iter()
            .any(|f| f.message.contains("unknown table 'states'")));
    }

    #[test]
    fn test_duplicate_table_names() {
        let doc = MappingDocument::new("bad")
            .with_lookup_table(LookupTable::new("states").with_entry("a", "b"))
            .with_lookup_table(LookupTable::new("states").with_entry("c", "d"));
        let findings = validate_document(&doc);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].scope, ValidationScope::LookupTable);
        assert_eq!(findings[0].status, ValidationStatus::Error);
    }

    #[test]
    fn test_unindexed_separate_output_warns() {
        let doc = MappingDocument::new("warn").with_mapping(
            Mapping::new(MappingKind::separate_defaults())
                .with_input(field("/name"))
                .with_output(field("/firstName"))
                .with_output(field("/lastName").with_index(1)),
        );
        let findings = validate_document(&doc);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].status, ValidationStatus::Warn);
        assert_eq!(findings[0].scope, ValidationScope::Field);
        assert_eq!(findings[0].field.as_deref(), Some("/firstName"));
    }

    #[test]
    fn test_separate_output_indexed_by_path_is_clean() {
        let doc = MappingDocument::new("ok").with_mapping(
            Mapping::new(MappingKind::separate_defaults())
                .with_input(field("/name"))
                .with_output(field("/names[0]"))
                .with_output(field("/names[1]")),
        );
        assert!(validate_document(&doc).is_empty());
    }

    #[test]
    fn test_unindexed_combine_input_warns() {
        let doc = MappingDocument::new("warn").with_mapping(
            Mapping::new(MappingKind::combine_defaults())
                .with_input(field("/a"))
                .with_output(field("/b")),
        );
        let findings = validate_document(&doc);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].status, ValidationStatus::Warn);
        assert_eq!(findings[0].field.as_deref(), Some("/a"));
    }
}
