//! Session-scoped audit and validation records
//!
//! Audits are append-only diagnostics accumulated while a session executes;
//! validations are produced by the pre-execution document checks. The engine
//! never removes either during a session - hosts read them after `process()`
//! returns and decide how to render or persist them.
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of one audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuditStatus {
    /// Informational, no action required
    Info,
    /// Non-fatal condition, mapping entry still produced output
    Warn,
    /// Fatal for one mapping entry, or an action failure escalated to
    /// error severity
    Error,
}

/// One diagnostic record describing a non-fatal or per-entry-fatal condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub status: AuditStatus,
    pub message: String,
    /// Path of the field the audit refers to, when known
    pub path: Option<String>,
    /// Document the field belongs to, when known
    pub doc_id: Option<String>,
}

/// Append-only collection of audits owned by one session
#[derive(Debug, Clone, Default)]
pub struct Audits {
    items: Vec<Audit>,
}

impl Audits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an informational audit
    pub fn add_info(&mut self, message: impl Into<String>, path: Option<String>) {
        self.add(Audit {
            status: AuditStatus::Info,
            message: message.into(),
            path,
            doc_id: None,
        });
    }

    /// Append a warning audit
    pub fn add_warn(&mut self, message: impl Into<String>, path: Option<String>) {
        self.add(Audit {
            status: AuditStatus::Warn,
            message: message.into(),
            path,
            doc_id: None,
        });
    }

    /// Append an error audit
    pub fn add_error(&mut self, message: impl Into<String>, path: Option<String>) {
        self.add(Audit {
            status: AuditStatus::Error,
            message: message.into(),
            path,
            doc_id: None,
        });
    }

    /// Append a fully constructed audit
    pub fn add(&mut self, audit: Audit) {
        self.items.push(audit);
    }

    /// All audits in append order
    pub fn items(&self) -> &[Audit] {
        &self.items
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|a| a.status == AuditStatus::Error)
    }

    pub fn has_warns(&self) -> bool {
        self.items.iter().any(|a| a.status == AuditStatus::Warn)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of audits at exactly the given status
    pub fn count_at(&self, status: AuditStatus) -> usize {
        self.items.iter().filter(|a| a.status == status).count()
    }
}

/// What a validation finding refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationScope {
    Document,
    Mapping,
    LookupTable,
    Field,
}

/// Severity of one validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    Warn,
    Error,
}

/// One pre-execution finding about the mapping document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub scope: ValidationScope,
    pub status: ValidationStatus,
    /// Path of the offending field, when the scope is a field
    pub field: Option<String>,
    pub message: String,
}

/// Append-only collection of validations owned by one session
#[derive(Debug, Clone, Default)]
pub struct Validations {
    items: Vec<Validation>,
}

impl Validations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, validation: Validation) {
        self.items.push(validation);
    }

    pub fn items(&self) -> &[Validation] {
        &self.items
    }

    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditStatus::Info => write!(f, "info"),
            AuditStatus::Warn => write!(f, "warn"),
            AuditStatus::Error => write!(f, "error"),
        }
    }
}
