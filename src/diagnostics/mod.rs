//! # Diagnostics Ledger
//!
//! Append-only store of errors and warnings, keyed by feature type and
//! code. Nothing in the engine aborts on a finding: every check appends
//! here and the caller decides afterwards whether to go on.
//!
//! | Kind | Code | Severity |
//! |------|------|----------|
//! | Structural (name missing from topology) | `"10"` | Error |
//! | Consistency (name owned by several maps) | `"11"` | Error |
//! | Schema (required / optional column missing) | `"20"` | Error / Warning |
//! | Connectivity (unmatched superposition pair) | `""` | Error |
//! | Capacity (more candidates than columns) | `""` | Warning |

pub mod trail;
pub mod summary;

use serde::{Deserialize, Serialize};

pub use trail::{ProcessLine, ProcessTrail, Status, TemplateArgs, expand_template};
pub use summary::Summary;

/// Diagnostic codes shared with the reporting layer.
pub mod code {
    /// Name referenced by a map does not exist in the reference topology.
    pub const STRUCTURAL: &str = "10";
    /// Name referenced by more than one map.
    pub const CONSISTENCY: &str = "11";
    /// Required or optional attribute column missing.
    pub const SCHEMA: &str = "20";
    /// Uncoded findings (connectivity, capacity, truncation).
    pub const NONE: &str = "";
}

/// Ledger type for findings that span two feature types.
pub const GEOCHECK: &str = "geocheck";

// ============================================================================
// Entries
// ============================================================================

/// Severity of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

/// A single ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub feature_type: String,
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    fn matches(&self, feature_type: &str, code: &str) -> bool {
        self.feature_type == feature_type && (code.is_empty() || self.code == code)
    }
}

/// Result of one check: whether it found errors, and the messages it
/// reported under its code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub failed: bool,
    pub messages: Vec<String>,
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        !self.failed
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Append-only diagnostics store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    entries: Vec<Diagnostic>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one message.
    pub fn append(&mut self, message: impl Into<String>, feature_type: &str, is_warning: bool, code: &str) {
        self.entries.push(Diagnostic {
            feature_type: feature_type.to_string(),
            code: code.to_string(),
            message: message.into(),
            severity: if is_warning { Severity::Warning } else { Severity::Error },
        });
    }

    /// Record a message unless an identical entry already exists.
    ///
    /// Keeps re-runnable checks idempotent. Returns true if appended.
    pub fn append_once(&mut self, message: impl Into<String>, feature_type: &str, is_warning: bool, code: &str) -> bool {
        let message = message.into();
        let severity = if is_warning { Severity::Warning } else { Severity::Error };
        let exists = self.entries.iter().any(|d| {
            d.severity == severity && d.feature_type == feature_type && d.code == code && d.message == message
        });
        if !exists {
            self.append(message, feature_type, is_warning, code);
        }
        !exists
    }

    /// Record several messages sharing type, severity and code.
    pub fn append_all<I, M>(&mut self, messages: I, feature_type: &str, is_warning: bool, code: &str)
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        for message in messages {
            self.append(message, feature_type, is_warning, code);
        }
    }

    /// Entries of `feature_type` whose code is `code`; an empty code
    /// selects every code.
    pub fn query<'a>(&'a self, feature_type: &'a str, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.matches(feature_type, code))
    }

    /// `query` collected into a list borrowing only the ledger.
    pub fn select(&self, feature_type: &str, code: &str) -> Vec<&Diagnostic> {
        self.entries.iter().filter(|d| d.matches(feature_type, code)).collect()
    }

    /// Error messages, in append order.
    pub fn errors(&self, feature_type: &str, code: &str) -> Vec<String> {
        self.messages(feature_type, code, Severity::Error)
    }

    /// Warning messages, in append order.
    pub fn warnings(&self, feature_type: &str, code: &str) -> Vec<String> {
        self.messages(feature_type, code, Severity::Warning)
    }

    fn messages(&self, feature_type: &str, code: &str, severity: Severity) -> Vec<String> {
        self.query(feature_type, code)
            .filter(|d| d.severity == severity)
            .map(|d| d.message.clone())
            .collect()
    }

    pub fn has_errors(&self, feature_type: &str, code: &str) -> bool {
        self.query(feature_type, code).any(|d| d.severity == Severity::Error)
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
