//! Parser for typed Ruby (`.trb`).
//!
//! Produces an arena AST where every annotation is kept as a syntactic
//! [`TypeExpr`]. Syntax errors are recorded as diagnostics and parsing
//! resumes at the next statement, so one file yields as many errors as it
//! contains (up to the configured limit) along with a usable tree.

use std::sync::Arc;

use trc_common::diagnostics::Diagnostic;
use trc_common::position::LineMap;
use tracing::debug_span;

pub mod parser;

pub use parser::node::{
    AssignOp, AttrItem, AttrKind, BinaryOp, CallData, Guard, HashEntry, HashKey,
    HashPatternEntry, IfForm, InClause, MethodDecl, Node, NodeKind, Param, ParamKind, Pattern,
    RescueClause, RestPattern, StringPart, TypeParamDecl, UnaryOp, Visibility, WhenClause,
};
pub use parser::type_expr::{LiteralType, RecordField, TypeExpr, TypeExprKind};
pub use parser::{NodeArena, NodeIndex, NodeList, ParseOptions, ParserState};
pub use trc_scanner::Comment;

/// A parsed source file with its tree, comments and syntax diagnostics.
#[derive(Clone, Debug)]
pub struct ParsedFile {
    pub file_name: String,
    pub source: Arc<str>,
    pub arena: NodeArena,
    pub root: NodeIndex,
    pub line_map: LineMap,
    pub comments: Vec<Comment>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedFile {
    /// Top-level statements of the file.
    pub fn statements(&self) -> &[NodeIndex] {
        match self.arena.kind(self.root) {
            Some(NodeKind::SourceFile { statements }) => statements,
            _ => &[],
        }
    }

    /// Source text covered by a node.
    pub fn node_text(&self, index: NodeIndex) -> &str {
        let (pos, end) = self.arena.span(index);
        self.slice(pos, end)
    }

    pub fn slice(&self, pos: u32, end: u32) -> &str {
        let len = self.source.len();
        let start = (pos as usize).min(len);
        let end = (end as usize).clamp(start, len);
        self.source.get(start..end).unwrap_or("")
    }

    pub fn has_syntax_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Parse one file.
pub fn parse_source(file_name: &str, source: &str, options: ParseOptions) -> ParsedFile {
    let _span = debug_span!("parse", file = file_name, bytes = source.len()).entered();
    let mut state = ParserState::new(source, options);
    let root = state.parse_source_file();
    let (arena, parse_diagnostics, comments) = state.into_parts();
    let line_map = LineMap::build(source);
    let diagnostics = parse_diagnostics
        .into_iter()
        .map(|d| {
            let mut diagnostic = d.into_diagnostic(file_name);
            diagnostic.locate(&line_map);
            diagnostic
        })
        .collect();
    ParsedFile {
        file_name: file_name.to_string(),
        source: Arc::from(source),
        arena,
        root,
        line_map,
        comments,
        diagnostics,
    }
}

#[cfg(test)]
#[path = "../tests/parser_tests.rs"]
mod parser_tests;

#[cfg(test)]
#[path = "../tests/type_syntax_tests.rs"]
mod type_syntax_tests;
