//! Output generation for checked `.trb` files.
//!
//! - `ruby` - plain Ruby with annotations erased and newer syntax lowered
//!   for the configured target version
//! - `rbs` - RBS signatures built from the declaration table and the
//!   checker's inferred types
//! - `source_writer` - indentation-aware output buffer shared by both

pub mod rbs;
pub mod ruby;
pub mod source_writer;

pub use rbs::{RbsEmitter, RbsTypePrinter, emit_rbs};
pub use ruby::{RubyPrinter, emit_ruby};
pub use source_writer::SourceWriter;
