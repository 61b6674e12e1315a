//! Tokenizer for typed Ruby.
//!
//! This crate provides the lexical analysis phase:
//! - `SyntaxKind` - Token types
//! - `ScannerState` - Tokenizer state machine with snapshot/restore lookahead
//! - `char_codes` - Character classification utilities
//!
//! Newlines are significant in Ruby, so the scanner emits `Newline` tokens,
//! collapsing blank lines and suppressing newlines that continue an
//! expression (after a binary operator or comma, or before a leading `.`).

pub mod char_codes;

mod syntax_kind;
pub use syntax_kind::{SyntaxKind, keyword_kind};

mod scanner;
pub use scanner::{Comment, ScannerDiagnostic, ScannerSnapshot, ScannerState, StringSegment};

#[cfg(test)]
#[path = "../tests/scanner_tests.rs"]
mod scanner_tests;
