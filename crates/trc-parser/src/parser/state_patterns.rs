//! Parser state - `case/in` patterns.

use super::base::NodeIndex;
use super::node::{HashPatternEntry, NodeKind, Pattern, RestPattern};
use super::state::ParserState;
use trc_common::diagnostics::diagnostic_codes;
use trc_scanner::SyntaxKind;

impl ParserState {
    /// A pattern after `in`. Bare `a, *rest` and `key:` forms are accepted
    /// without brackets.
    pub(crate) fn parse_top_pattern(&mut self) -> Pattern {
        if self.at_label() {
            return self.parse_hash_pattern_body(None);
        }
        if self.is_token(SyntaxKind::Star) {
            return self.parse_array_pattern_body(None, Vec::new());
        }
        let first = self.parse_pattern();
        if self.parse_optional(SyntaxKind::Comma) {
            return self.parse_array_pattern_body(None, vec![first]);
        }
        first
    }

    /// Alternatives and `=> name` captures.
    fn parse_pattern(&mut self) -> Pattern {
        let first = self.parse_primary_pattern();
        let mut alternatives = vec![first];
        while self.parse_optional(SyntaxKind::Pipe) {
            self.skip_newlines();
            alternatives.push(self.parse_primary_pattern());
        }
        let pattern = if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            Pattern::Alternatives(alternatives)
        };
        if !self.parse_optional(SyntaxKind::FatArrow) {
            return pattern;
        }
        if !self.is_token(SyntaxKind::Identifier) {
            self.parse_error_at_current_token(diagnostic_codes::IDENTIFIER_EXPECTED, &[]);
            return pattern;
        }
        let name = self.token_value();
        let pos = self.token_pos();
        self.declare_local(&name);
        self.next_token();
        Pattern::Capture {
            pattern: Box::new(pattern),
            name,
            pos,
        }
    }

    fn parse_primary_pattern(&mut self) -> Pattern {
        match self.token() {
            SyntaxKind::OpenBracket => {
                self.next_token();
                let pattern = self.parse_array_pattern_body(Some(SyntaxKind::CloseBracket), Vec::new());
                self.parse_expected(SyntaxKind::CloseBracket);
                pattern
            }
            SyntaxKind::OpenBrace => {
                self.next_token();
                let pattern = self.parse_hash_pattern_body(Some(SyntaxKind::CloseBrace));
                self.parse_expected(SyntaxKind::CloseBrace);
                pattern
            }
            SyntaxKind::Caret => {
                self.next_token();
                Pattern::Pin(self.parse_pattern_value())
            }
            SyntaxKind::Identifier => {
                let name = self.token_value();
                let pos = self.token_pos();
                self.declare_local(&name);
                self.next_token();
                Pattern::Bind { name, pos }
            }
            SyntaxKind::Constant | SyntaxKind::ColonColon => self.parse_constant_pattern(),
            _ => Pattern::Value(self.parse_pattern_value()),
        }
    }

    fn parse_pattern_value(&mut self) -> NodeIndex {
        let saved = self.no_pipe;
        self.no_pipe = true;
        let value = self.parse_range();
        self.no_pipe = saved;
        value
    }

    /// `Point`, `Point(x:, y:)`, `Point[x, y]`, `Integer..`
    fn parse_constant_pattern(&mut self) -> Pattern {
        let pos = self.token_pos();
        let mut constant = if self.parse_optional(SyntaxKind::ColonColon) {
            let name = self.token_value();
            self.parse_expected(SyntaxKind::Constant);
            self.finish_node(
                NodeKind::Constant {
                    scope: NodeIndex::NONE,
                    name,
                    top_level: true,
                },
                pos,
            )
        } else {
            let name = self.token_value();
            self.next_token();
            self.finish_node(
                NodeKind::Constant {
                    scope: NodeIndex::NONE,
                    name,
                    top_level: false,
                },
                pos,
            )
        };
        while self.is_token(SyntaxKind::ColonColon) && self.peek_token() == SyntaxKind::Constant {
            self.next_token();
            let name = self.token_value();
            self.next_token();
            constant = self.finish_node(
                NodeKind::Constant {
                    scope: constant,
                    name,
                    top_level: false,
                },
                pos,
            );
        }

        if matches!(self.token(), SyntaxKind::DotDot | SyntaxKind::DotDotDot) {
            let exclusive = self.is_token(SyntaxKind::DotDotDot);
            self.next_token();
            let end = if self.can_start_argument() {
                self.parse_pattern_value()
            } else {
                NodeIndex::NONE
            };
            let range = self.finish_node(
                NodeKind::Range {
                    start: constant,
                    end,
                    exclusive,
                },
                pos,
            );
            return Pattern::Value(range);
        }

        let sub = match self.token() {
            SyntaxKind::OpenParen if !self.preceded_by_space() => {
                self.next_token();
                self.skip_newlines();
                let sub = if self.at_label() || self.is_token(SyntaxKind::StarStar) {
                    self.parse_hash_pattern_body(Some(SyntaxKind::CloseParen))
                } else {
                    self.parse_array_pattern_body(Some(SyntaxKind::CloseParen), Vec::new())
                };
                self.parse_expected(SyntaxKind::CloseParen);
                Some(Box::new(sub))
            }
            SyntaxKind::OpenBracket if !self.preceded_by_space() => {
                self.next_token();
                let sub = self.parse_array_pattern_body(Some(SyntaxKind::CloseBracket), Vec::new());
                self.parse_expected(SyntaxKind::CloseBracket);
                Some(Box::new(sub))
            }
            _ => None,
        };
        Pattern::Const { constant, sub }
    }

    /// Elements of an array pattern; `pre` holds elements already parsed.
    fn parse_array_pattern_body(&mut self, closing: Option<SyntaxKind>, pre: Vec<Pattern>) -> Pattern {
        let mut pre = pre;
        let mut rest = None;
        let mut post = Vec::new();
        loop {
            if closing.is_some() {
                self.skip_newlines();
            }
            if closing.is_some_and(|close| self.is_token(close))
                || self.at_terminator()
                || matches!(
                    self.token(),
                    SyntaxKind::ThenKeyword | SyntaxKind::IfKeyword | SyntaxKind::UnlessKeyword
                )
            {
                break;
            }
            if self.parse_optional(SyntaxKind::Star) {
                rest = Some(if self.is_token(SyntaxKind::Identifier) {
                    let name = self.token_value();
                    self.declare_local(&name);
                    self.next_token();
                    RestPattern::Named(name)
                } else {
                    RestPattern::Anonymous
                });
            } else {
                let element = self.parse_pattern();
                if rest.is_some() {
                    post.push(element);
                } else {
                    pre.push(element);
                }
            }
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        Pattern::Array { pre, rest, post }
    }

    /// `name:, age: Integer, **rest`
    fn parse_hash_pattern_body(&mut self, closing: Option<SyntaxKind>) -> Pattern {
        let mut entries = Vec::new();
        let mut rest = None;
        loop {
            if closing.is_some() {
                self.skip_newlines();
            }
            if closing.is_some_and(|close| self.is_token(close)) {
                break;
            }
            if self.parse_optional(SyntaxKind::StarStar) {
                rest = Some(if self.parse_optional(SyntaxKind::NilKeyword) {
                    RestPattern::NoRest
                } else if self.is_token(SyntaxKind::Identifier) {
                    let name = self.token_value();
                    self.declare_local(&name);
                    self.next_token();
                    RestPattern::Named(name)
                } else {
                    RestPattern::Anonymous
                });
            } else if self.at_label() {
                let pos = self.token_pos();
                let key = self.token_value();
                self.next_token();
                self.next_token();
                let value = if matches!(
                    self.token(),
                    SyntaxKind::Comma
                        | SyntaxKind::CloseBrace
                        | SyntaxKind::CloseParen
                        | SyntaxKind::Newline
                        | SyntaxKind::Semicolon
                        | SyntaxKind::EndOfFile
                        | SyntaxKind::ThenKeyword
                        | SyntaxKind::IfKeyword
                        | SyntaxKind::UnlessKeyword
                ) {
                    self.declare_local(&key);
                    None
                } else {
                    Some(self.parse_pattern())
                };
                entries.push(HashPatternEntry { key, value, pos });
            } else {
                self.parse_error_at_current_token(diagnostic_codes::IDENTIFIER_EXPECTED, &[]);
                break;
            }
            if closing.is_some() {
                self.skip_newlines();
            }
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        Pattern::Hash { entries, rest }
    }
}
