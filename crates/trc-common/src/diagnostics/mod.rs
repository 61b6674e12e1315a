//! Diagnostic types and message lookup.
//!
//! Diagnostics are plain values: every phase appends them to a list and keeps
//! going. Nothing in the compiler aborts a file because of a diagnostic.

use crate::position::LineMap;
use serde::Serialize;

mod data;
pub use data::{DIAGNOSTIC_MESSAGES, diagnostic_codes, diagnostic_messages};

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Error,
    Warning,
    Hint,
}

impl DiagnosticCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Hint => "hint",
        }
    }
}

/// The error taxonomy reported in JSON and JUnit output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    SyntaxError,
    UnsupportedFeatureError,
    UnresolvedTypeError,
    RecursiveAliasError,
    IntersectionConflictError,
    DuplicateDeclarationError,
    TypeMismatchError,
    CircularInferenceError,
    ImplicitAnyError,
    UnusedVarWarning,
    UnsafeIndexedAccessError,
    MissingReturnTypeError,
    DynamicDispatchHint,
}

impl DiagnosticKind {
    /// Classify a diagnostic code.
    pub fn from_code(code: u32) -> Self {
        use diagnostic_codes::*;
        match code {
            UNSUPPORTED_TUPLE_TYPE | UNSUPPORTED_CONDITIONAL_TYPE | UNSUPPORTED_MAPPED_TYPE => {
                DiagnosticKind::UnsupportedFeatureError
            }
            1000..=1999 => DiagnosticKind::SyntaxError,
            TYPE_ALIAS_CIRCULARLY_REFERENCES_ITSELF => DiagnosticKind::RecursiveAliasError,
            CONFLICTING_INTERSECTION_MEMBER => DiagnosticKind::IntersectionConflictError,
            DUPLICATE_DECLARATION => DiagnosticKind::DuplicateDeclarationError,
            2000..=2999 => DiagnosticKind::UnresolvedTypeError,
            CIRCULAR_INFERENCE => DiagnosticKind::CircularInferenceError,
            3000..=3999 => DiagnosticKind::TypeMismatchError,
            IMPLICIT_ANY_PARAMETER | IMPLICIT_ANY_ATTRIBUTE => DiagnosticKind::ImplicitAnyError,
            UNUSED_VARIABLE => DiagnosticKind::UnusedVarWarning,
            UNSAFE_INDEXED_ACCESS => DiagnosticKind::UnsafeIndexedAccessError,
            NIL_NOT_IN_RETURN_TYPE | MISSING_RETURN_TYPE => DiagnosticKind::MissingReturnTypeError,
            _ => DiagnosticKind::DynamicDispatchHint,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::SyntaxError => "SyntaxError",
            DiagnosticKind::UnsupportedFeatureError => "UnsupportedFeatureError",
            DiagnosticKind::UnresolvedTypeError => "UnresolvedTypeError",
            DiagnosticKind::RecursiveAliasError => "RecursiveAliasError",
            DiagnosticKind::IntersectionConflictError => "IntersectionConflictError",
            DiagnosticKind::DuplicateDeclarationError => "DuplicateDeclarationError",
            DiagnosticKind::TypeMismatchError => "TypeMismatchError",
            DiagnosticKind::CircularInferenceError => "CircularInferenceError",
            DiagnosticKind::ImplicitAnyError => "ImplicitAnyError",
            DiagnosticKind::UnusedVarWarning => "UnusedVarWarning",
            DiagnosticKind::UnsafeIndexedAccessError => "UnsafeIndexedAccessError",
            DiagnosticKind::MissingReturnTypeError => "MissingReturnTypeError",
            DiagnosticKind::DynamicDispatchHint => "DynamicDispatchHint",
        }
    }

    /// Parser-level kinds; files with these map to exit code 1.
    pub fn is_syntax(self) -> bool {
        matches!(
            self,
            DiagnosticKind::SyntaxError | DiagnosticKind::UnsupportedFeatureError
        )
    }
}

/// Related information for a diagnostic (e.g., where a method was declared).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

/// A positioned, immutable compiler message.
///
/// `line` and `column` are one-based and filled in by [`Diagnostic::locate`]
/// once the file's line map is known; `start`/`length` are byte offsets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub line: u32,
    pub column: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    pub fn new(
        category: DiagnosticCategory,
        code: u32,
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: String,
    ) -> Self {
        Self {
            file: file.into(),
            start,
            length,
            line: 0,
            column: 0,
            message_text: message,
            category,
            code,
            kind: DiagnosticKind::from_code(code),
            related_information: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    pub fn error(file: impl Into<String>, start: u32, length: u32, message: String, code: u32) -> Self {
        Self::new(DiagnosticCategory::Error, code, file, start, length, message)
    }

    /// Build a diagnostic from the message table, filling `{0}`, `{1}`, ...
    /// with `args`. The category is the code's default.
    pub fn from_code(code: u32, file: impl Into<String>, start: u32, length: u32, args: &[&str]) -> Self {
        let (category, message) = match get_diagnostic_message(code) {
            Some(def) => (def.category, format_message(def.message, args)),
            None => (DiagnosticCategory::Error, args.join(" ")),
        };
        Self::new(category, code, file, start, length, message)
    }

    #[must_use]
    pub fn with_category(mut self, category: DiagnosticCategory) -> Self {
        self.category = category;
        self
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(mut self, file: String, start: u32, length: u32, message: String) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            file,
            start,
            length,
            message_text: message,
        });
        self
    }

    /// Fill in the one-based line and column from byte offsets.
    pub fn locate(&mut self, line_map: &LineMap) {
        let pos = line_map.offset_to_position(self.start);
        self.line = pos.line + 1;
        self.column = pos.character + 1;
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the message template for a diagnostic code.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    get_diagnostic_message(code).map(|m| m.message)
}

/// Get the default category for a diagnostic code.
#[must_use]
pub fn get_diagnostic_category(code: u32) -> Option<DiagnosticCategory> {
    get_diagnostic_message(code).map(|m| m.category)
}

#[cfg(test)]
#[path = "../../tests/diagnostics_tests.rs"]
mod tests;
