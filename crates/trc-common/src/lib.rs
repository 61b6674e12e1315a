//! Common types and utilities for the trc compiler.
//!
//! This crate provides foundational types used across all trc crates:
//! - String interning (`Atom`, `ShardedInterner`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, `DiagnosticKind`, message tables)
//! - Line/column mapping (`LineMap`, `Position`)
//! - Compiler limits and thresholds
//! - Compilation options (`CompilationContext`, `StrictnessConfig`, `RubyVersion`)

// String interning for identifier and type-name deduplication
pub mod interner;
pub use interner::{Atom, ShardedInterner};

// Diagnostics - codes, messages, categories
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticKind};

// Centralized limits and thresholds
pub mod limits;

// Position/LineMap for line/column source locations
pub mod position;
pub use position::{LineMap, Position};

// Immutable compilation options threaded through every phase
pub mod options;
pub use options::{
    CheckName, CompilationContext, ExperimentalFeature, OptionParseError, RubyVersion,
    StrictnessConfig, StrictnessLevel,
};

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod options_tests;

#[cfg(test)]
#[path = "../tests/position_tests.rs"]
mod position_tests;
