//! Recursive-descent parser producing an arena-allocated AST.

mod base;
pub mod node;
mod node_arena;
mod state;
mod state_expressions;
mod state_patterns;
mod state_statements;
mod state_types;
pub mod type_expr;

pub use base::{NodeIndex, NodeList};
pub use node_arena::NodeArena;
pub use state::{ParseDiagnostic, ParseOptions, ParserState};
