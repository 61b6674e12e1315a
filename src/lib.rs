//! trc: a gradual type checker and compiler for typed Ruby (`.trb`).
//!
//! The phase crates are re-exported here; this crate adds the whole-program
//! driver that runs them in order:
//!
//! parse (parallel) -> bind (serial) -> check + emit (parallel)
//!
//! and the per-file [`CompilationCache`] that watch mode uses to recompile
//! only what changed.

pub use trc_binder as binder;
pub use trc_checker as checker;
pub use trc_common as common;
pub use trc_emitter as emitter;
pub use trc_parser as parser;
pub use trc_scanner as scanner;
pub use trc_solver as solver;

// Per-file outputs and declaration summaries kept between compilations
pub mod cache;
pub use cache::{CacheEntry, CompilationCache};
#[cfg(test)]
#[path = "../tests/cache_tests.rs"]
mod cache_tests;

// Concurrent diagnostics collection
pub mod sink;
pub use sink::DiagnosticSink;

// The compilation pipeline
pub mod program;
pub use program::{
    Compilation, CompilationSummary, EmitSettings, FileOutput, SourceInput, compile, compile_with_cache,
};
