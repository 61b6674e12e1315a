//! Ruby emitter.
//!
//! Prints a parsed `.trb` file back as plain Ruby for a target version:
//! - every annotation is erased (parameter, return, local, attr and block
//!   parameter types; type parameters; `type`, `interface` and bodiless
//!   `@name: T` declarations)
//! - `case/in` becomes a subject temporary and a `case`/`when` chain below
//!   Ruby 3.0 (see [`patterns`])
//! - endless methods become regular `def`s below Ruby 3.0
//! - hash shorthand `{x:}` becomes `{x: x}` below Ruby 3.1
//!
//! Literals are copied from the source text, so numbers and strings keep
//! their original spelling. Standalone comments are preserved. The printer
//! never looks at types or diagnostics.

mod expressions;
mod patterns;
mod statements;

use memchr::memchr_iter;
use trc_common::options::{CompilationContext, ExperimentalFeature, RubyVersion};
use trc_parser::{Comment, NodeArena, NodeIndex, NodeKind, ParsedFile};
use tracing::debug_span;

use crate::source_writer::SourceWriter;

pub(crate) use statements::IvarPrologue;

pub struct RubyPrinter<'a> {
    pub(crate) file: &'a ParsedFile,
    pub(crate) arena: &'a NodeArena,
    pub(crate) target: RubyVersion,
    pub(crate) native_pattern_matching: bool,
    pub(crate) writer: SourceWriter,
    /// Next comment not yet written or skipped.
    comment_index: usize,
    /// Counter for `case/in` subject temporaries.
    pub(crate) temp_counter: u32,
    /// Class-body ivar initializers of each enclosing class or module.
    pub(crate) ivar_prologues: Vec<IvarPrologue>,
}

impl<'a> RubyPrinter<'a> {
    pub fn new(file: &'a ParsedFile, options: &CompilationContext) -> Self {
        let target = options.target;
        // 2.7 shipped `case/in` as experimental syntax.
        let native_pattern_matching = target.supports_pattern_matching()
            || (target == RubyVersion::V2_7
                && options.has_feature(ExperimentalFeature::NativePatternMatching));
        RubyPrinter {
            file,
            arena: &file.arena,
            target,
            native_pattern_matching,
            writer: SourceWriter::with_capacity(file.source.len()),
            comment_index: 0,
            temp_counter: 0,
            ivar_prologues: Vec::new(),
        }
    }

    /// Print the whole file.
    pub fn print(mut self) -> String {
        let _span = debug_span!("emit_ruby", file = %self.file.file_name, target = %self.target).entered();
        let statements = self.file.statements();
        self.emit_statements(statements);
        self.emit_comments_before(u32::MAX);
        self.writer.ensure_line();
        self.writer.into_output()
    }

    // =========================================================================
    // Statement lists
    // =========================================================================

    /// One statement per line, keeping single blank lines from the source.
    pub(crate) fn emit_statements(&mut self, statements: &[NodeIndex]) {
        let mut previous_end = None;
        for &statement in statements {
            let (pos, end) = self.arena.span(statement);
            if self.is_erased(statement) {
                self.emit_comments_before(pos);
                self.skip_comments_before(end);
                continue;
            }
            if let Some(previous_end) = previous_end {
                let next = self.next_comment_pos().filter(|&c| c < pos).unwrap_or(pos);
                if self.has_blank_line_between(previous_end, next) {
                    self.writer.blank_line();
                }
            }
            self.emit_comments_before(pos);
            self.writer.ensure_line();
            self.emit_statement(statement);
            self.emit_trailing_comment(end);
            self.writer.ensure_line();
            previous_end = Some(end);
        }
    }

    /// Body of a construct closed by `end`: indented statements plus any
    /// comments before the closing keyword, which `end_pos` follows.
    pub(crate) fn emit_body(&mut self, statements: &[NodeIndex], end_pos: u32) {
        self.writer.ensure_line();
        self.writer.increase_indent();
        self.emit_statements(statements);
        self.emit_comments_before(end_pos);
        self.writer.decrease_indent();
        self.writer.ensure_line();
    }

    /// Statements joined with `; ` on the current line.
    pub(crate) fn emit_inline_statements(&mut self, statements: &[NodeIndex]) {
        for (i, &statement) in statements.iter().enumerate() {
            if i > 0 {
                self.writer.write("; ");
            }
            self.emit_expression(statement);
        }
    }

    /// Declarations that only exist for the checker.
    fn is_erased(&self, node: NodeIndex) -> bool {
        match self.arena.kind(node) {
            Some(NodeKind::TypeAlias { .. } | NodeKind::Interface { .. } | NodeKind::Error) | None => true,
            Some(NodeKind::IvarDecl { value, .. }) => {
                value.is_none()
                    || self
                        .ivar_prologues
                        .last()
                        .is_some_and(|prologue| prologue.moves(node))
            }
            Some(NodeKind::Method(decl)) => decl.signature_only,
            _ => false,
        }
    }

    fn has_blank_line_between(&self, start: u32, end: u32) -> bool {
        let gap = self.file.slice(start, end);
        memchr_iter(b'\n', gap.as_bytes()).take(2).count() == 2
    }

    /// Source text of a node, for literals copied verbatim.
    pub(crate) fn node_text(&self, node: NodeIndex) -> &'a str {
        self.file.node_text(node)
    }

    /// The node was written on one source line.
    pub(crate) fn is_single_line(&self, node: NodeIndex) -> bool {
        memchr::memchr(b'\n', self.node_text(node).as_bytes()).is_none()
    }

    /// Print an expression into a string instead of the output.
    pub(crate) fn expression_text(&mut self, node: NodeIndex) -> String {
        let saved = std::mem::take(&mut self.writer);
        self.emit_expression(node);
        std::mem::replace(&mut self.writer, saved).into_output()
    }

    pub(crate) fn next_temp(&mut self, prefix: &str) -> String {
        self.temp_counter += 1;
        format!("__{prefix}_{}", self.temp_counter)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    fn comments(&self) -> &'a [Comment] {
        &self.file.comments
    }

    fn next_comment_pos(&self) -> Option<u32> {
        self.comments().get(self.comment_index).map(|c| c.pos)
    }

    /// Write every comment that starts before `pos`, each on its own line.
    pub(crate) fn emit_comments_before(&mut self, pos: u32) {
        while let Some(comment) = self.comments().get(self.comment_index) {
            if comment.pos >= pos {
                break;
            }
            self.comment_index += 1;
            self.writer.ensure_line();
            self.writer.write(comment.text.trim_end());
            self.writer.write_line();
        }
    }

    /// A comment after `end` on the same source line stays on that line.
    fn emit_trailing_comment(&mut self, end: u32) {
        let Some(comment) = self.comments().get(self.comment_index) else {
            return;
        };
        if comment.own_line || comment.pos < end {
            return;
        }
        let between = self.file.slice(end, comment.pos);
        if between.contains('\n') {
            return;
        }
        self.comment_index += 1;
        self.writer.write_space();
        self.writer.write(comment.text.trim_end());
    }

    /// Drop comments inside an erased declaration.
    fn skip_comments_before(&mut self, pos: u32) {
        while self.next_comment_pos().is_some_and(|c| c < pos) {
            self.comment_index += 1;
        }
    }
}

/// Erase annotations and lower `file` for `options.target`.
pub fn emit_ruby(file: &ParsedFile, options: &CompilationContext) -> String {
    RubyPrinter::new(file, options).print()
}
