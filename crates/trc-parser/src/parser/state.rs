//! Parser state: token cursor, local-variable scopes, diagnostics and recovery.
//!
//! The grammar methods live in the `state_*` sibling modules, each adding an
//! `impl ParserState` block.

use super::base::{NodeIndex, NodeList};
use super::node::NodeKind;
use super::node_arena::NodeArena;
use rustc_hash::FxHashSet;
use trc_common::diagnostics::{Diagnostic, diagnostic_codes};
use trc_common::limits::MAX_PARSER_DEPTH;
use trc_scanner::{Comment, ScannerState, SyntaxKind};

/// A syntax error recorded during parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub start: u32,
    pub length: u32,
    pub code: u32,
    pub message: String,
}

impl ParseDiagnostic {
    pub fn into_diagnostic(self, file_name: &str) -> Diagnostic {
        Diagnostic::error(file_name, self.start, self.length, self.message, self.code)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ParseOptions {
    pub max_errors: usize,
    /// Method definitions carry signatures only (`def name(x: T): R`, no body
    /// or `end`). Used for the built-in prelude.
    pub declaration_mode: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_errors: trc_common::limits::DEFAULT_MAX_ERRORS,
            declaration_mode: false,
        }
    }
}

struct LocalScope {
    names: FxHashSet<String>,
    /// `def`, `class` and `module` bodies do not see enclosing locals.
    hard: bool,
}

pub struct ParserState {
    pub(crate) scanner: ScannerState,
    pub(crate) arena: NodeArena,
    pub(crate) options: ParseOptions,
    pub(crate) diagnostics: Vec<ParseDiagnostic>,
    pub(crate) comments: Vec<Comment>,
    locals: Vec<LocalScope>,
    depth: u32,
    /// End of the last consumed token that was not a statement terminator.
    pub(crate) prev_token_end: u32,
    /// `do` belongs to an enclosing construct (`while cond do`, command args).
    pub(crate) no_do_block: bool,
    /// `|` closes block parameters or separates pattern alternatives.
    pub(crate) no_pipe: bool,
    last_error_pos: Option<u32>,
}

impl ParserState {
    pub fn new(source: &str, options: ParseOptions) -> Self {
        ParserState {
            scanner: ScannerState::new(source),
            arena: NodeArena::with_capacity(source.len() / 8 + 16),
            options,
            diagnostics: Vec::new(),
            comments: Vec::new(),
            locals: vec![LocalScope {
                names: FxHashSet::default(),
                hard: true,
            }],
            depth: 0,
            prev_token_end: 0,
            no_do_block: false,
            no_pipe: false,
            last_error_pos: None,
        }
    }

    /// Parse a whole file and return the `SourceFile` node.
    pub fn parse_source_file(&mut self) -> NodeIndex {
        self.next_token();
        let mut statements = self.parse_statements();
        // A stray `end` or `}` at top level: report it and keep going.
        while !self.is_token(SyntaxKind::EndOfFile) && !self.error_limit_reached() {
            self.unexpected_token();
            self.next_token();
            statements.extend(self.parse_statements());
        }
        self.drain_scanner();
        let end = self.scanner.source_text().len() as u32;
        self.arena.add(NodeKind::SourceFile { statements }, 0, end)
    }

    pub fn into_parts(mut self) -> (NodeArena, Vec<ParseDiagnostic>, Vec<Comment>) {
        self.drain_scanner();
        self.diagnostics.sort_by_key(|d| d.start);
        self.comments.sort_by_key(|c| c.pos);
        (self.arena, self.diagnostics, self.comments)
    }

    pub(crate) fn drain_scanner(&mut self) {
        self.comments.extend(self.scanner.take_comments());
        for diag in self.scanner.take_diagnostics() {
            self.push_diagnostic(diag.pos, diag.length, diag.code, diag.message.to_string());
        }
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    #[inline]
    pub(crate) fn token(&self) -> SyntaxKind {
        self.scanner.token()
    }

    #[inline]
    pub(crate) fn is_token(&self, kind: SyntaxKind) -> bool {
        self.scanner.token() == kind
    }

    #[inline]
    pub(crate) fn token_pos(&self) -> u32 {
        self.scanner.token_start()
    }

    #[inline]
    pub(crate) fn token_end(&self) -> u32 {
        self.scanner.token_end()
    }

    pub(crate) fn token_value(&self) -> String {
        self.scanner.token_value().to_string()
    }

    #[inline]
    pub(crate) fn preceded_by_space(&self) -> bool {
        self.scanner.preceded_by_space()
    }

    pub(crate) fn next_token(&mut self) -> SyntaxKind {
        if !matches!(
            self.token(),
            SyntaxKind::Newline | SyntaxKind::Semicolon | SyntaxKind::Unknown | SyntaxKind::EndOfFile
        ) {
            self.prev_token_end = self.token_end();
        }
        self.scanner.scan()
    }

    pub(crate) fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or report `'x' expected.`
    pub(crate) fn parse_expected(&mut self, kind: SyntaxKind) -> bool {
        if self.parse_optional(kind) {
            return true;
        }
        self.parse_error_at_current_token(diagnostic_codes::EXPECTED, &[kind.text()]);
        false
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.is_token(SyntaxKind::Newline) {
            self.next_token();
        }
    }

    pub(crate) fn skip_terminators(&mut self) {
        while matches!(self.token(), SyntaxKind::Newline | SyntaxKind::Semicolon) {
            self.next_token();
        }
    }

    pub(crate) fn at_terminator(&self) -> bool {
        matches!(
            self.token(),
            SyntaxKind::Newline | SyntaxKind::Semicolon | SyntaxKind::EndOfFile
        )
    }

    /// Keywords and tokens that close an enclosing statement list.
    pub(crate) fn at_block_end(&self) -> bool {
        matches!(
            self.token(),
            SyntaxKind::EndKeyword
                | SyntaxKind::ElseKeyword
                | SyntaxKind::ElsifKeyword
                | SyntaxKind::WhenKeyword
                | SyntaxKind::InKeyword
                | SyntaxKind::RescueKeyword
                | SyntaxKind::EnsureKeyword
                | SyntaxKind::CloseBrace
                | SyntaxKind::CloseParen
                | SyntaxKind::EndOfFile
        )
    }

    /// Run `f` speculatively and rewind the scanner afterwards.
    pub(crate) fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let snapshot = self.scanner.snapshot();
        let prev_end = self.prev_token_end;
        let result = f(self);
        self.scanner.restore(snapshot);
        self.prev_token_end = prev_end;
        result
    }

    /// Kind of the token after the current one.
    pub(crate) fn peek_token(&mut self) -> SyntaxKind {
        self.look_ahead(|p| p.next_token())
    }

    /// Whether the current token is `name:` written as a label (colon glued
    /// to the name and not part of `::`).
    pub(crate) fn at_label(&mut self) -> bool {
        if !matches!(self.token(), SyntaxKind::Identifier | SyntaxKind::Constant) {
            return false;
        }
        self.look_ahead(|p| {
            p.next_token();
            p.is_token(SyntaxKind::Colon) && !p.preceded_by_space()
        })
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    pub(crate) fn finish_node(&mut self, kind: NodeKind, pos: u32) -> NodeIndex {
        let end = self.prev_token_end.max(pos);
        self.arena.add(kind, pos, end)
    }

    pub(crate) fn node_kind(&self, index: NodeIndex) -> Option<&NodeKind> {
        self.arena.kind(index)
    }

    pub(crate) fn node_pos(&self, index: NodeIndex) -> u32 {
        self.arena.span(index).0
    }

    // =========================================================================
    // Local variable scopes
    // =========================================================================

    pub(crate) fn push_scope(&mut self, hard: bool) {
        self.locals.push(LocalScope {
            names: FxHashSet::default(),
            hard,
        });
    }

    pub(crate) fn pop_scope(&mut self) {
        if self.locals.len() > 1 {
            self.locals.pop();
        }
    }

    pub(crate) fn declare_local(&mut self, name: &str) {
        if let Some(scope) = self.locals.last_mut() {
            scope.names.insert(name.to_string());
        }
    }

    pub(crate) fn declare_params(&mut self, params: &[super::node::Param]) {
        for param in params {
            if !param.name.is_empty() {
                self.declare_local(&param.name);
            }
        }
    }

    /// Whether `name` is a local in the current method, class body, or any
    /// enclosing block.
    pub(crate) fn is_local(&self, name: &str) -> bool {
        for scope in self.locals.iter().rev() {
            if scope.names.contains(name) {
                return true;
            }
            if scope.hard {
                break;
            }
        }
        false
    }

    // =========================================================================
    // Errors and recovery
    // =========================================================================

    pub(crate) fn error_limit_reached(&self) -> bool {
        self.options.max_errors > 0 && self.diagnostics.len() >= self.options.max_errors
    }

    fn push_diagnostic(&mut self, start: u32, length: u32, code: u32, message: String) {
        if self.error_limit_reached() || self.last_error_pos == Some(start) {
            return;
        }
        self.last_error_pos = Some(start);
        self.diagnostics.push(ParseDiagnostic {
            start,
            length,
            code,
            message,
        });
    }

    pub(crate) fn parse_error_at(&mut self, start: u32, length: u32, code: u32, args: &[&str]) {
        let template = trc_common::diagnostics::get_message_template(code).unwrap_or("{0}");
        let message = trc_common::diagnostics::format_message(template, args);
        self.push_diagnostic(start, length, code, message);
    }

    pub(crate) fn parse_error_at_current_token(&mut self, code: u32, args: &[&str]) {
        let start = self.token_pos();
        let length = self.token_end().saturating_sub(start).max(1);
        self.parse_error_at(start, length, code, args);
    }

    pub(crate) fn unexpected_token(&mut self) {
        let text = match self.token() {
            SyntaxKind::Newline => "newline".to_string(),
            SyntaxKind::EndOfFile => "end of file".to_string(),
            _ => self.scanner.token_text().to_string(),
        };
        self.parse_error_at_current_token(diagnostic_codes::UNEXPECTED_TOKEN, &[&text]);
    }

    /// Skip to the next statement boundary without consuming a token that
    /// closes an enclosing block.
    pub(crate) fn resync_statement(&mut self) {
        let mut nesting = 0u32;
        loop {
            match self.token() {
                SyntaxKind::EndOfFile => return,
                SyntaxKind::Newline | SyntaxKind::Semicolon if nesting == 0 => return,
                SyntaxKind::OpenParen | SyntaxKind::OpenBracket | SyntaxKind::OpenBrace => nesting += 1,
                SyntaxKind::CloseParen | SyntaxKind::CloseBracket | SyntaxKind::CloseBrace => {
                    if nesting == 0 {
                        return;
                    }
                    nesting -= 1;
                }
                _ if nesting == 0 && self.at_block_end() => return,
                _ => {}
            }
            self.next_token();
        }
    }

    /// Enter a nested construct; reports and returns false past the limit.
    pub(crate) fn enter_nesting(&mut self) -> bool {
        self.depth += 1;
        if self.depth > MAX_PARSER_DEPTH {
            self.parse_error_at_current_token(diagnostic_codes::NESTING_TOO_DEEP, &[]);
            return false;
        }
        true
    }

    pub(crate) fn leave_nesting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // =========================================================================
    // Statement lists
    // =========================================================================

    /// Parse statements until a block-closing token or end of file.
    pub(crate) fn parse_statements(&mut self) -> NodeList {
        let mut statements = NodeList::new();
        loop {
            self.skip_terminators();
            if self.at_block_end() || self.error_limit_reached() {
                break;
            }
            let start = self.token_pos();
            let start_token = self.token();
            let statement = self.parse_statement();
            if statement.is_some() {
                statements.push(statement);
            }
            if self.at_terminator() || self.at_block_end() {
                continue;
            }
            self.unexpected_token();
            self.resync_statement();
            if self.token_pos() == start && self.token() == start_token {
                self.next_token();
            }
        }
        statements
    }
}
