//! Type checker for typed Ruby.
//!
//! Checks one bound file at a time against the shared, read-only
//! [`DeclarationTable`](trc_binder::DeclarationTable), so files check in
//! parallel. The checker is organized into several submodules:
//! - `context` - `CheckerContext` and the per-file `TypeCache`
//! - `state` - `CheckerState`, scopes and the file entry point
//! - `expressions` - literals, names, operators and indexing
//! - `calls` - method dispatch, arguments, blocks and constructors
//! - `statements` - class and method bodies, assignment, control flow
//! - `patterns` - `case/in`
//! - `flow` - narrowing facts for `nil?`, `is_a?` and truthiness guards
//! - `infer` - on-demand return-type inference and generic arguments
//! - `error_reporter` - diagnostics and strictness severities
//!
//! The relation used everywhere is the gradual one: `Any` is compatible
//! both ways, and `nil` is accepted anywhere unless `strict_nil` is on.

mod calls;
pub mod context;
mod error_reporter;
mod expressions;
mod flow;
mod infer;
mod patterns;
pub mod state;
mod statements;

pub use context::{CheckerContext, TypeCache};
pub use state::{CheckResult, CheckerState, check_file};
