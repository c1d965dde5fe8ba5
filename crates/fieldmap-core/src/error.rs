//! Error types for the Fieldmap core library
//!
//! This module defines the error handling system for Fieldmap, using
//! thiserror for ergonomic error definitions and anyhow for flexible
//! error contexts.

use crate::value::FieldType;
use thiserror::Error;

/// Main error type for Fieldmap operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed field path syntax
    #[error("Path syntax error at position {position}: {message} (path: {path})")]
    PathSyntax {
        message: String,
        position: usize,
        path: String,
    },

    /// Unknown document id or module requested in the wrong mode
    #[error("Document not found: {doc_id} - {message}")]
    DocumentNotFound { doc_id: String, message: String },

    /// No converter exists or the runtime value does not match its declared type
    #[error("Conversion failed from {source_type} to {target_type}: {message}")]
    Conversion {
        message: String,
        source_type: FieldType,
        target_type: FieldType,
    },

    /// No registered action overload matches
    #[error("Action not found: {name} - {message}")]
    ActionNotFound { name: String, message: String },

    /// Separate/Combine/Lookup misconfiguration
    #[error("Multiplicity error: {message}")]
    Multiplicity { message: String },

    /// Internal invariant violated
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Unsupported operation, e.g. a read against a target-mode module
    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for an invalid-state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Error::InvalidState {
            message: message.into(),
        }
    }

    /// Shorthand for a multiplicity error
    pub fn multiplicity(message: impl Into<String>) -> Self {
        Error::Multiplicity {
            message: message.into(),
        }
    }

    /// Shorthand for an unsupported-operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported {
            message: message.into(),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PathSyntax {
            message: "empty segment".to_string(),
            position: 3,
            path: "/a//b".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Path syntax error at position 3: empty segment (path: /a//b)"
        );
    }

    #[test]
    fn test_document_not_found_display() {
        let err = Error::DocumentNotFound {
            doc_id: "orders".to_string(),
            message: "no source module registered".to_string(),
        };
        assert!(err.to_string().contains("orders"));
    }

    #[test]
    fn test_conversion_display() {
        let err = Error::Conversion {
            message: "not a number".to_string(),
            source_type: FieldType::String,
            target_type: FieldType::Integer,
        };
        assert!(err.to_string().contains("STRING"));
        assert!(err.to_string().contains("INTEGER"));
    }
}
