//! Scanner state machine.
//!
//! The scanner produces one token at a time. Positions are byte offsets into
//! the original file; a scanner created with [`ScannerState::new_at`] scans a
//! slice of a file (the code inside `#{...}`) and reports positions shifted by
//! the slice's base offset.

use crate::char_codes::{
    is_constant_start, is_identifier_part, is_identifier_start, is_inline_whitespace,
};
use crate::syntax_kind::{SyntaxKind, keyword_kind};
use memchr::{memchr, memmem, memrchr};
use serde::Serialize;
use trc_common::diagnostics::{diagnostic_codes, diagnostic_messages};

/// A piece of a double-quoted string literal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum StringSegment {
    /// Literal text with escapes already processed.
    Text(String),
    /// Source of a `#{...}` interpolation and the absolute offset of its first byte.
    Interpolation { source: String, offset: u32 },
}

/// A `#` comment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub pos: u32,
    pub end: u32,
    /// Text including the leading `#`.
    pub text: String,
    /// Nothing but whitespace precedes the comment on its line.
    pub own_line: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannerDiagnostic {
    pub pos: u32,
    pub length: u32,
    pub code: u32,
    pub message: &'static str,
}

/// Saved scanner state for speculative lookahead.
#[derive(Clone, Debug)]
pub struct ScannerSnapshot {
    pos: usize,
    token: SyntaxKind,
    token_start: usize,
    token_value: String,
    segments: Vec<StringSegment>,
    preceded_by_space: bool,
    prev_token: SyntaxKind,
    comments_len: usize,
    diagnostics_len: usize,
}

pub struct ScannerState {
    source: String,
    base: u32,
    pos: usize,
    token: SyntaxKind,
    token_start: usize,
    token_value: String,
    segments: Vec<StringSegment>,
    preceded_by_space: bool,
    /// Last emitted token, used for newline significance and regex detection.
    prev_token: SyntaxKind,
    comments: Vec<Comment>,
    diagnostics: Vec<ScannerDiagnostic>,
}

impl ScannerState {
    pub fn new(source: impl Into<String>) -> Self {
        Self::new_at(source, 0)
    }

    /// Scan `source` as if it started at byte `base` of the enclosing file.
    pub fn new_at(source: impl Into<String>, base: u32) -> Self {
        ScannerState {
            source: source.into(),
            base,
            pos: 0,
            token: SyntaxKind::Unknown,
            token_start: 0,
            token_value: String::new(),
            segments: Vec::new(),
            preceded_by_space: false,
            prev_token: SyntaxKind::Newline,
            comments: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn token(&self) -> SyntaxKind {
        self.token
    }

    /// Absolute start offset of the current token.
    #[inline]
    pub fn token_start(&self) -> u32 {
        self.base + self.token_start as u32
    }

    /// Absolute end offset of the current token.
    #[inline]
    pub fn token_end(&self) -> u32 {
        self.base + self.pos as u32
    }

    /// Cooked value of the current token: identifier text, processed string
    /// contents, symbol name without the colon, number text.
    #[inline]
    pub fn token_value(&self) -> &str {
        &self.token_value
    }

    /// Raw source text of the current token.
    pub fn token_text(&self) -> &str {
        &self.source[self.token_start..self.pos]
    }

    /// Interpolation segments of the current `StringLiteral`.
    pub fn segments(&self) -> &[StringSegment] {
        &self.segments
    }

    /// Whether whitespace separated the current token from the previous one.
    #[inline]
    pub fn preceded_by_space(&self) -> bool {
        self.preceded_by_space
    }

    pub fn source_text(&self) -> &str {
        &self.source
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    /// Whether the byte right after the current token is whitespace or EOF.
    pub fn followed_by_space(&self) -> bool {
        self.peek_char(0).is_none_or(|c| c.is_whitespace())
    }

    pub fn take_comments(&mut self) -> Vec<Comment> {
        std::mem::take(&mut self.comments)
    }

    pub fn take_diagnostics(&mut self) -> Vec<ScannerDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn snapshot(&self) -> ScannerSnapshot {
        ScannerSnapshot {
            pos: self.pos,
            token: self.token,
            token_start: self.token_start,
            token_value: self.token_value.clone(),
            segments: self.segments.clone(),
            preceded_by_space: self.preceded_by_space,
            prev_token: self.prev_token,
            comments_len: self.comments.len(),
            diagnostics_len: self.diagnostics.len(),
        }
    }

    pub fn restore(&mut self, snapshot: ScannerSnapshot) {
        self.pos = snapshot.pos;
        self.token = snapshot.token;
        self.token_start = snapshot.token_start;
        self.token_value = snapshot.token_value;
        self.segments = snapshot.segments;
        self.preceded_by_space = snapshot.preceded_by_space;
        self.prev_token = snapshot.prev_token;
        self.comments.truncate(snapshot.comments_len);
        self.diagnostics.truncate(snapshot.diagnostics_len);
    }

    // =========================================================================
    // Character helpers
    // =========================================================================

    #[inline]
    fn peek_char(&self, ahead: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(ahead)
    }

    #[inline]
    fn current_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    #[inline]
    fn advance_char(&mut self) -> Option<char> {
        let c = self.current_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_with(&self, text: &str) -> bool {
        self.source[self.pos..].starts_with(text)
    }

    fn at_line_start(&self, offset: usize) -> bool {
        let line_start = memrchr(b'\n', &self.source.as_bytes()[..offset]).map_or(0, |i| i + 1);
        self.source[line_start..offset].chars().all(is_inline_whitespace)
    }

    /// Offset of the newline ending the line that contains `offset`, or the
    /// end of the source.
    fn line_end(&self, offset: usize) -> usize {
        memchr(b'\n', &self.source.as_bytes()[offset..]).map_or(self.source.len(), |i| offset + i)
    }

    fn error(&mut self, start: usize, end: usize, code: u32, message: &'static str) {
        self.diagnostics.push(ScannerDiagnostic {
            pos: self.base + start as u32,
            length: (end.saturating_sub(start)) as u32,
            code,
            message,
        });
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Scan the next token and return its kind.
    pub fn scan(&mut self) -> SyntaxKind {
        self.preceded_by_space = false;
        self.token_value.clear();
        self.segments.clear();

        loop {
            let Some(c) = self.current_char() else {
                self.token_start = self.pos;
                return self.finish(SyntaxKind::EndOfFile);
            };

            if is_inline_whitespace(c) {
                self.pos += c.len_utf8();
                self.preceded_by_space = true;
                continue;
            }
            if c == '\\' && self.peek_char(1) == Some('\n') {
                self.pos += 2;
                self.preceded_by_space = true;
                continue;
            }
            if c == '#' {
                self.scan_comment();
                continue;
            }
            if c == '=' && self.starts_with("=begin") && self.at_line_start(self.pos) {
                self.skip_block_comment();
                continue;
            }
            if self.starts_with("__END__") && self.at_line_start(self.pos) {
                self.pos = self.source.len();
                continue;
            }
            if c == '\n' {
                let start = self.pos;
                self.pos += 1;
                self.preceded_by_space = true;
                if self.prev_token == SyntaxKind::Newline
                    || self.prev_token == SyntaxKind::Semicolon
                    || self.prev_token.continues_line()
                    || self.next_line_continues()
                {
                    continue;
                }
                self.token_start = start;
                return self.finish(SyntaxKind::Newline);
            }

            self.token_start = self.pos;
            let kind = self.scan_token(c);
            return self.finish(kind);
        }
    }

    fn finish(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.token = kind;
        self.prev_token = kind;
        kind
    }

    fn scan_comment(&mut self) {
        let start = self.pos;
        let own_line = self.at_line_start(start);
        let end = self.line_end(start);
        self.comments.push(Comment {
            pos: self.base + start as u32,
            end: self.base + end as u32,
            text: self.source[start..end].trim_end().to_string(),
            own_line,
        });
        self.pos = end;
    }

    fn skip_block_comment(&mut self) {
        match memmem::find(&self.source.as_bytes()[self.pos..], b"\n=end") {
            Some(i) => {
                let after = self.pos + i + "\n=end".len();
                self.pos = self.line_end(after);
            }
            None => self.pos = self.source.len(),
        }
    }

    /// A line starting with `.method` or `&.method` continues the previous one.
    fn next_line_continues(&self) -> bool {
        let mut rest = &self.source[self.pos..];
        loop {
            let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace());
            if trimmed.starts_with('#') {
                match memchr(b'\n', trimmed.as_bytes()) {
                    Some(i) => {
                        rest = &trimmed[i..];
                        continue;
                    }
                    None => return false,
                }
            }
            return (trimmed.starts_with('.') && !trimmed.starts_with(".."))
                || trimmed.starts_with("&.");
        }
    }

    fn scan_token(&mut self, c: char) -> SyntaxKind {
        if c.is_ascii_digit() {
            return self.scan_number();
        }
        if is_identifier_start(c) {
            return self.scan_identifier();
        }
        match c {
            '"' => self.scan_double_quoted(),
            '\'' => self.scan_single_quoted(),
            '@' => self.scan_variable(),
            '$' => self.scan_global(),
            ':' => self.scan_colon(),
            _ => self.scan_punctuation(c),
        }
    }

    fn scan_number(&mut self) -> SyntaxKind {
        let start = self.pos;
        if self.starts_with("0x") || self.starts_with("0b") || self.starts_with("0o") {
            self.pos += 2;
            while self.current_char().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                self.pos += 1;
            }
            self.token_value = self.source[start..self.pos].replace('_', "");
            return SyntaxKind::IntegerLiteral;
        }

        let mut is_float = false;
        self.consume_digits();
        if self.current_char() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.pos += 1;
            self.consume_digits();
        }
        if matches!(self.current_char(), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek_char(1), Some('+' | '-')));
            if self.peek_char(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.pos += 1 + sign;
                self.consume_digits();
            }
        }
        self.token_value = self.source[start..self.pos].replace('_', "");
        if is_float {
            SyntaxKind::FloatLiteral
        } else {
            SyntaxKind::IntegerLiteral
        }
    }

    fn consume_digits(&mut self) {
        while self.current_char().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.pos += 1;
        }
    }

    fn scan_identifier(&mut self) -> SyntaxKind {
        let start = self.pos;
        while self.current_char().is_some_and(is_identifier_part) {
            self.advance_char();
        }
        let first = self.source[start..].chars().next().unwrap_or('_');
        if is_constant_start(first) {
            self.token_value = self.source[start..self.pos].to_string();
            return SyntaxKind::Constant;
        }

        // Predicate and bang method names: `empty?`, `save!`. Not `x!=y`.
        if matches!(self.current_char(), Some('?' | '!')) && self.peek_char(1) != Some('=') {
            self.pos += 1;
        }

        let text = &self.source[start..self.pos];
        self.token_value = text.to_string();

        let after_dot = matches!(
            self.prev_token,
            SyntaxKind::Dot | SyntaxKind::SafeNavigation
        );
        let is_label = self.current_char() == Some(':') && self.peek_char(1) != Some(':');
        if after_dot || is_label {
            return SyntaxKind::Identifier;
        }
        // `def end`, `def self.class` spell method names with keywords.
        if self.prev_token == SyntaxKind::DefKeyword && text != "self" {
            return SyntaxKind::Identifier;
        }
        keyword_kind(text).unwrap_or(SyntaxKind::Identifier)
    }

    fn scan_variable(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        let kind = if self.current_char() == Some('@') {
            self.pos += 1;
            SyntaxKind::ClassVariable
        } else {
            SyntaxKind::InstanceVariable
        };
        if !self.current_char().is_some_and(is_identifier_start) {
            self.error(start, self.pos, diagnostic_codes::INVALID_CHARACTER, diagnostic_messages::INVALID_CHARACTER);
            return SyntaxKind::Unknown;
        }
        while self.current_char().is_some_and(is_identifier_part) {
            self.advance_char();
        }
        self.token_value = self.source[start..self.pos].to_string();
        kind
    }

    fn scan_global(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        match self.current_char() {
            Some(c) if is_identifier_start(c) => {
                while self.current_char().is_some_and(is_identifier_part) {
                    self.advance_char();
                }
            }
            Some(c) if c.is_ascii_digit() || "!@&~;,/\\<>_0*$?:\"".contains(c) => {
                self.advance_char();
            }
            _ => {
                self.error(start, self.pos, diagnostic_codes::INVALID_CHARACTER, diagnostic_messages::INVALID_CHARACTER);
                return SyntaxKind::Unknown;
            }
        }
        self.token_value = self.source[start..self.pos].to_string();
        SyntaxKind::GlobalVariable
    }

    fn scan_colon(&mut self) -> SyntaxKind {
        if self.starts_with("::") {
            self.pos += 2;
            return SyntaxKind::ColonColon;
        }
        // `a: Integer` and `x ? a : b` use a bare colon; `:name` after whitespace
        // or an opening token is a symbol.
        let adjacent_operand = !self.preceded_by_space && self.prev_token.ends_operand();
        if !adjacent_operand {
            if let Some(kind) = self.try_scan_symbol() {
                return kind;
            }
        }
        self.pos += 1;
        SyntaxKind::Colon
    }

    fn try_scan_symbol(&mut self) -> Option<SyntaxKind> {
        let next = self.peek_char(1)?;
        let name_start = self.pos + 1;
        if next == '"' {
            self.pos += 1;
            self.scan_double_quoted();
            self.segments.clear();
            return Some(SyntaxKind::SymbolLiteral);
        }
        if is_identifier_start(next) || next == '@' {
            self.pos = name_start;
            if self.current_char() == Some('@') {
                self.pos += 1;
                if self.current_char() == Some('@') {
                    self.pos += 1;
                }
            }
            while self.current_char().is_some_and(is_identifier_part) {
                self.advance_char();
            }
            if matches!(self.current_char(), Some('?' | '!' | '='))
                && !matches!(self.peek_char(1), Some('=' | '>' | '~'))
            {
                self.pos += 1;
            }
            self.token_value = self.source[name_start..self.pos].to_string();
            return Some(SyntaxKind::SymbolLiteral);
        }
        const OPERATOR_SYMBOLS: &[&str] = &[
            "[]=", "[]", "<=>", "===", "==", "=~", "!=", "<<", "<=", ">=", "**", "+", "-", "*",
            "/", "%", "<", ">", "!", "&", "|", "^",
        ];
        let rest = &self.source[name_start..];
        let op = OPERATOR_SYMBOLS.iter().find(|op| rest.starts_with(**op))?;
        self.pos = name_start + op.len();
        self.token_value = (*op).to_string();
        Some(SyntaxKind::SymbolLiteral)
    }

    fn scan_single_quoted(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.advance_char() {
                None => {
                    self.error(start, self.pos, diagnostic_codes::UNTERMINATED_STRING_LITERAL, diagnostic_messages::UNTERMINATED_STRING_LITERAL);
                    break;
                }
                Some('\'') => break,
                Some('\\') => match self.current_char() {
                    Some(c @ ('\'' | '\\')) => {
                        self.pos += 1;
                        value.push(c);
                    }
                    _ => value.push('\\'),
                },
                Some(c) => value.push(c),
            }
        }
        self.token_value = value;
        SyntaxKind::RawStringLiteral
    }

    fn scan_double_quoted(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        let mut text = String::new();
        let mut cooked = String::new();
        let mut segments = Vec::new();
        loop {
            let Some(c) = self.advance_char() else {
                self.error(start, self.pos, diagnostic_codes::UNTERMINATED_STRING_LITERAL, diagnostic_messages::UNTERMINATED_STRING_LITERAL);
                break;
            };
            match c {
                '"' => break,
                '\\' => {
                    let escaped = match self.advance_char() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('e') => '\u{1b}',
                        Some('s') => ' ',
                        Some(other) => other,
                        None => continue,
                    };
                    text.push(escaped);
                    cooked.push(escaped);
                }
                '#' if self.current_char() == Some('{') => {
                    self.pos += 1;
                    let code_start = self.pos;
                    let code_end = self.skip_interpolation();
                    if !text.is_empty() {
                        segments.push(StringSegment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(StringSegment::Interpolation {
                        source: self.source[code_start..code_end].to_string(),
                        offset: self.base + code_start as u32,
                    });
                }
                other => {
                    text.push(other);
                    cooked.push(other);
                }
            }
        }
        if !segments.is_empty() && !text.is_empty() {
            segments.push(StringSegment::Text(text));
        }
        self.token_value = cooked;
        self.segments = segments;
        SyntaxKind::StringLiteral
    }

    /// Skip the body of `#{...}`, returning the offset of the closing brace
    /// (consumed).
    fn skip_interpolation(&mut self) -> usize {
        let mut depth = 1usize;
        while let Some(c) = self.current_char() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let end = self.pos;
                        self.pos += 1;
                        return end;
                    }
                }
                '"' | '\'' => {
                    let quote = c;
                    self.pos += 1;
                    while let Some(inner) = self.advance_char() {
                        if inner == '\\' {
                            self.advance_char();
                        } else if inner == quote {
                            break;
                        }
                    }
                    continue;
                }
                _ => {}
            }
            self.advance_char();
        }
        self.source.len()
    }

    fn scan_regex(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.advance_char() {
                None | Some('\n') => {
                    self.error(start, self.pos, diagnostic_codes::UNTERMINATED_STRING_LITERAL, diagnostic_messages::UNTERMINATED_STRING_LITERAL);
                    break;
                }
                Some('\\') => {
                    self.advance_char();
                }
                Some('/') => {
                    while self.current_char().is_some_and(|c| matches!(c, 'i' | 'm' | 'x' | 'o')) {
                        self.pos += 1;
                    }
                    break;
                }
                Some(_) => {}
            }
        }
        self.token_value = self.source[start..self.pos].to_string();
        SyntaxKind::RegexLiteral
    }

    fn regex_allowed(&self) -> bool {
        // `def /(other)` defines the division operator.
        if self.prev_token == SyntaxKind::DefKeyword {
            return false;
        }
        if !self.prev_token.ends_operand() {
            return true;
        }
        // `puts /x/` is a command call with a regex argument.
        self.prev_token == SyntaxKind::Identifier
            && self.preceded_by_space
            && self.peek_char(1).is_some_and(|c| !c.is_whitespace() && c != '=')
    }

    fn scan_punctuation(&mut self, c: char) -> SyntaxKind {
        const OPERATORS: &[(&str, SyntaxKind)] = &[
            ("**=", SyntaxKind::StarStarEq),
            ("<=>", SyntaxKind::Spaceship),
            ("===", SyntaxKind::EqEqEq),
            ("<<=", SyntaxKind::LtLtEq),
            ("||=", SyntaxKind::PipePipeEq),
            ("&&=", SyntaxKind::AmpAmpEq),
            ("...", SyntaxKind::DotDotDot),
            ("**", SyntaxKind::StarStar),
            ("*=", SyntaxKind::StarEq),
            ("+=", SyntaxKind::PlusEq),
            ("-=", SyntaxKind::MinusEq),
            ("->", SyntaxKind::Arrow),
            ("%=", SyntaxKind::PercentEq),
            ("!=", SyntaxKind::BangEq),
            ("!~", SyntaxKind::BangTilde),
            ("==", SyntaxKind::EqEq),
            ("=~", SyntaxKind::EqTilde),
            ("=>", SyntaxKind::FatArrow),
            ("<<", SyntaxKind::LtLt),
            ("<=", SyntaxKind::LtEq),
            (">=", SyntaxKind::GtEq),
            ("&&", SyntaxKind::AmpAmp),
            ("&.", SyntaxKind::SafeNavigation),
            ("||", SyntaxKind::PipePipe),
            ("..", SyntaxKind::DotDot),
            ("*", SyntaxKind::Star),
            ("+", SyntaxKind::Plus),
            ("-", SyntaxKind::Minus),
            ("%", SyntaxKind::Percent),
            ("!", SyntaxKind::Bang),
            ("=", SyntaxKind::Eq),
            ("<", SyntaxKind::Lt),
            (">", SyntaxKind::Gt),
            ("&", SyntaxKind::Amp),
            ("|", SyntaxKind::Pipe),
            ("^", SyntaxKind::Caret),
            ("~", SyntaxKind::Tilde),
            (".", SyntaxKind::Dot),
            ("?", SyntaxKind::Question),
            (";", SyntaxKind::Semicolon),
            (",", SyntaxKind::Comma),
            ("(", SyntaxKind::OpenParen),
            (")", SyntaxKind::CloseParen),
            ("[", SyntaxKind::OpenBracket),
            ("]", SyntaxKind::CloseBracket),
            ("{", SyntaxKind::OpenBrace),
            ("}", SyntaxKind::CloseBrace),
        ];

        if c == '/' {
            if self.regex_allowed() {
                return self.scan_regex();
            }
            if self.starts_with("/=") {
                self.pos += 2;
                return SyntaxKind::SlashEq;
            }
            self.pos += 1;
            return SyntaxKind::Slash;
        }

        let rest = &self.source[self.pos..];
        if let Some((text, kind)) = OPERATORS.iter().find(|(text, _)| rest.starts_with(*text)) {
            self.pos += text.len();
            return *kind;
        }

        let start = self.pos;
        self.advance_char();
        self.error(start, self.pos, diagnostic_codes::INVALID_CHARACTER, diagnostic_messages::INVALID_CHARACTER);
        self.token_value = self.source[start..self.pos].to_string();
        SyntaxKind::Unknown
    }
}
