//! Binder errors.
//!
//! Resolution failures are values, never panics. Every variant maps to a
//! diagnostic code; the caller turns it into a [`Diagnostic`] and uses
//! `Any` in place of the type that failed.

use trc_common::diagnostics::{Diagnostic, diagnostic_codes};
use trc_common::position::LineMap;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Cannot find type '{name}'.")]
    UnresolvedType { name: String, pos: u32, end: u32 },

    #[error("Type alias '{name}' circularly references itself.")]
    RecursiveAlias { name: String, pos: u32, end: u32 },

    #[error("Intersection of '{left}' and '{right}' has conflicting signatures for '{member}'.")]
    IntersectionConflict {
        left: String,
        right: String,
        member: String,
        pos: u32,
        end: u32,
    },

    #[error("Duplicate declaration of '{name}'.")]
    DuplicateDeclaration { name: String, pos: u32, end: u32 },

    #[error("Type '{name}' expects {expected} type argument(s), but got {found}.")]
    TypeArgumentCount {
        name: String,
        expected: usize,
        found: usize,
        pos: u32,
        end: u32,
    },
}

impl ResolveError {
    pub fn code(&self) -> u32 {
        match self {
            ResolveError::UnresolvedType { .. } => diagnostic_codes::CANNOT_FIND_TYPE,
            ResolveError::RecursiveAlias { .. } => {
                diagnostic_codes::TYPE_ALIAS_CIRCULARLY_REFERENCES_ITSELF
            }
            ResolveError::IntersectionConflict { .. } => {
                diagnostic_codes::CONFLICTING_INTERSECTION_MEMBER
            }
            ResolveError::DuplicateDeclaration { .. } => diagnostic_codes::DUPLICATE_DECLARATION,
            ResolveError::TypeArgumentCount { .. } => {
                diagnostic_codes::WRONG_NUMBER_OF_TYPE_ARGUMENTS
            }
        }
    }

    /// Byte span the error is reported at.
    pub fn span(&self) -> (u32, u32) {
        match *self {
            ResolveError::UnresolvedType { pos, end, .. }
            | ResolveError::RecursiveAlias { pos, end, .. }
            | ResolveError::IntersectionConflict { pos, end, .. }
            | ResolveError::DuplicateDeclaration { pos, end, .. }
            | ResolveError::TypeArgumentCount { pos, end, .. } => (pos, end),
        }
    }

    pub fn to_diagnostic(&self, file_name: &str, line_map: &LineMap) -> Diagnostic {
        let (pos, end) = self.span();
        let mut diagnostic = Diagnostic::error(
            file_name,
            pos,
            end.saturating_sub(pos),
            self.to_string(),
            self.code(),
        );
        diagnostic.locate(line_map);
        diagnostic
    }
}
