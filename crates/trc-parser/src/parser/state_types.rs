//! Parser state - type annotations.
//!
//! Grammar, loosest first: union (`|`), intersection (`&`), optional
//! suffix (`?`), then primary types.

use super::state::ParserState;
use super::type_expr::{LiteralType, RecordField, TypeExpr, TypeExprKind};
use crate::parser::state_expressions::parse_integer_text;
use trc_common::diagnostics::diagnostic_codes;
use trc_scanner::SyntaxKind;

impl ParserState {
    pub(crate) fn parse_type(&mut self) -> TypeExpr {
        if !self.enter_nesting() {
            self.leave_nesting();
            let pos = self.token_pos();
            return TypeExpr::new(TypeExprKind::Error, pos, pos);
        }
        let ty = self.parse_union_type();
        self.leave_nesting();
        ty
    }

    fn parse_union_type(&mut self) -> TypeExpr {
        let pos = self.token_pos();
        let first = self.parse_intersection_type();
        if self.no_pipe || !self.is_token(SyntaxKind::Pipe) {
            return first;
        }
        let mut members = vec![first];
        while self.parse_optional(SyntaxKind::Pipe) {
            self.skip_newlines();
            members.push(self.parse_intersection_type());
        }
        TypeExpr::new(TypeExprKind::Union(members), pos, self.prev_token_end)
    }

    /// A type without top-level `|`; used where `|` ends the annotation
    /// (block parameters) and for superclasses.
    pub(crate) fn parse_intersection_type(&mut self) -> TypeExpr {
        let pos = self.token_pos();
        let first = self.parse_postfix_type();
        if !self.is_token(SyntaxKind::Amp) {
            return first;
        }
        let mut members = vec![first];
        while self.parse_optional(SyntaxKind::Amp) {
            self.skip_newlines();
            members.push(self.parse_postfix_type());
        }
        TypeExpr::new(TypeExprKind::Intersection(members), pos, self.prev_token_end)
    }

    fn parse_postfix_type(&mut self) -> TypeExpr {
        let pos = self.token_pos();
        let mut ty = self.parse_primary_type();
        while self.is_token(SyntaxKind::Question) && !self.preceded_by_space() {
            self.next_token();
            ty = TypeExpr::new(TypeExprKind::Optional(Box::new(ty)), pos, self.prev_token_end);
        }
        if self.is_token(SyntaxKind::Identifier) && self.scanner.token_value() == "extends" {
            self.parse_error_at_current_token(diagnostic_codes::UNSUPPORTED_CONDITIONAL_TYPE, &[]);
            self.skip_unsupported_type_tail();
            return TypeExpr::new(TypeExprKind::Error, pos, self.prev_token_end);
        }
        ty
    }

    fn parse_primary_type(&mut self) -> TypeExpr {
        let pos = self.token_pos();
        match self.token() {
            SyntaxKind::Constant | SyntaxKind::ColonColon => self.parse_type_reference(),
            SyntaxKind::Identifier => {
                let value = self.token_value();
                self.next_token();
                let end = self.prev_token_end;
                // `untyped?` scans as one identifier.
                match value.strip_suffix('?') {
                    Some(base) => {
                        let inner = TypeExpr::name(base, pos, end.saturating_sub(1));
                        TypeExpr::new(TypeExprKind::Optional(Box::new(inner)), pos, end)
                    }
                    None => TypeExpr::name(value, pos, end),
                }
            }
            SyntaxKind::NilKeyword => self.finish_type_token(TypeExprKind::Nil),
            SyntaxKind::SelfKeyword => self.finish_type_token(TypeExprKind::SelfType),
            SyntaxKind::TrueKeyword => self.finish_type_token(TypeExprKind::Literal(LiteralType::Bool(true))),
            SyntaxKind::FalseKeyword => self.finish_type_token(TypeExprKind::Literal(LiteralType::Bool(false))),
            SyntaxKind::IntegerLiteral => {
                let value = parse_integer_text(self.scanner.token_value());
                self.finish_type_token(TypeExprKind::Literal(LiteralType::Integer(value)))
            }
            SyntaxKind::FloatLiteral => {
                let text = self.token_value();
                self.finish_type_token(TypeExprKind::Literal(LiteralType::Float(text)))
            }
            SyntaxKind::Minus => {
                self.next_token();
                match self.token() {
                    SyntaxKind::IntegerLiteral => {
                        let value = parse_integer_text(self.scanner.token_value());
                        self.next_token();
                        TypeExpr::new(
                            TypeExprKind::Literal(LiteralType::Integer(value.wrapping_neg())),
                            pos,
                            self.prev_token_end,
                        )
                    }
                    SyntaxKind::FloatLiteral => {
                        let text = format!("-{}", self.scanner.token_value());
                        self.next_token();
                        TypeExpr::new(TypeExprKind::Literal(LiteralType::Float(text)), pos, self.prev_token_end)
                    }
                    _ => {
                        self.parse_error_at_current_token(diagnostic_codes::TYPE_EXPECTED, &[]);
                        TypeExpr::new(TypeExprKind::Error, pos, self.prev_token_end)
                    }
                }
            }
            SyntaxKind::StringLiteral | SyntaxKind::RawStringLiteral => {
                let text = self.token_value();
                self.finish_type_token(TypeExprKind::Literal(LiteralType::String(text)))
            }
            SyntaxKind::SymbolLiteral => {
                let text = self.token_value();
                self.finish_type_token(TypeExprKind::Literal(LiteralType::Symbol(text)))
            }
            SyntaxKind::OpenParen => {
                self.next_token();
                let saved = self.no_pipe;
                self.no_pipe = false;
                let inner = self.parse_type();
                self.no_pipe = saved;
                self.parse_expected(SyntaxKind::CloseParen);
                inner
            }
            SyntaxKind::OpenBrace => {
                if self.peek_token() == SyntaxKind::OpenBracket {
                    self.parse_error_at_current_token(diagnostic_codes::UNSUPPORTED_MAPPED_TYPE, &[]);
                    self.skip_balanced(SyntaxKind::OpenBrace, SyntaxKind::CloseBrace);
                    return TypeExpr::new(TypeExprKind::Error, pos, self.prev_token_end);
                }
                self.parse_record_type()
            }
            SyntaxKind::OpenBracket => {
                self.parse_error_at_current_token(diagnostic_codes::UNSUPPORTED_TUPLE_TYPE, &[]);
                self.skip_balanced(SyntaxKind::OpenBracket, SyntaxKind::CloseBracket);
                TypeExpr::new(TypeExprKind::Error, pos, self.prev_token_end)
            }
            _ => {
                self.parse_error_at_current_token(diagnostic_codes::TYPE_EXPECTED, &[]);
                TypeExpr::new(TypeExprKind::Error, pos, pos)
            }
        }
    }

    fn finish_type_token(&mut self, kind: TypeExprKind) -> TypeExpr {
        let pos = self.token_pos();
        self.next_token();
        TypeExpr::new(kind, pos, self.prev_token_end)
    }

    /// `Name`, `A::B`, `Array<T>`, `Hash<K, V>`
    fn parse_type_reference(&mut self) -> TypeExpr {
        let pos = self.token_pos();
        let mut name = String::new();
        if self.parse_optional(SyntaxKind::ColonColon) {
            name.push_str("::");
        }
        if !self.is_token(SyntaxKind::Constant) {
            self.parse_error_at_current_token(diagnostic_codes::TYPE_EXPECTED, &[]);
            return TypeExpr::new(TypeExprKind::Error, pos, self.prev_token_end);
        }
        name.push_str(self.scanner.token_value());
        self.next_token();
        while self.is_token(SyntaxKind::ColonColon) && self.peek_token() == SyntaxKind::Constant {
            self.next_token();
            name.push_str("::");
            name.push_str(self.scanner.token_value());
            self.next_token();
        }

        let mut args = Vec::new();
        if self.is_token(SyntaxKind::Lt) {
            self.next_token();
            let saved = self.no_pipe;
            self.no_pipe = false;
            loop {
                self.skip_newlines();
                args.push(self.parse_type());
                self.skip_newlines();
                if !self.parse_optional(SyntaxKind::Comma) {
                    break;
                }
            }
            self.no_pipe = saved;
            self.parse_expected(SyntaxKind::Gt);
        }
        TypeExpr::new(TypeExprKind::Name { name, args }, pos, self.prev_token_end)
    }

    /// `{ name: String, age?: Integer }`
    fn parse_record_type(&mut self) -> TypeExpr {
        let pos = self.token_pos();
        self.next_token();
        let saved = self.no_pipe;
        self.no_pipe = false;
        let mut fields = Vec::new();
        loop {
            self.skip_newlines();
            if !matches!(self.token(), SyntaxKind::Identifier | SyntaxKind::Constant) {
                break;
            }
            let raw = self.token_value();
            self.next_token();
            let (name, optional) = match raw.strip_suffix('?') {
                Some(base) => (base.to_string(), true),
                None => (raw, false),
            };
            self.parse_expected(SyntaxKind::Colon);
            let ty = self.parse_type();
            fields.push(RecordField { name, ty, optional });
            self.skip_newlines();
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.skip_newlines();
        self.no_pipe = saved;
        self.parse_expected(SyntaxKind::CloseBrace);
        TypeExpr::new(TypeExprKind::Record(fields), pos, self.prev_token_end)
    }

    /// Consume an unsupported bracketed type form through its closing token.
    fn skip_balanced(&mut self, open: SyntaxKind, close: SyntaxKind) {
        let mut depth = 0u32;
        loop {
            let token = self.token();
            if token == SyntaxKind::EndOfFile {
                return;
            }
            self.next_token();
            if token == open {
                depth += 1;
            } else if token == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// Skip the rest of a conditional type up to the end of the annotation.
    fn skip_unsupported_type_tail(&mut self) {
        let mut depth = 0u32;
        loop {
            match self.token() {
                SyntaxKind::EndOfFile | SyntaxKind::Newline | SyntaxKind::Semicolon => return,
                SyntaxKind::OpenParen | SyntaxKind::OpenBracket | SyntaxKind::OpenBrace | SyntaxKind::Lt => {
                    depth += 1
                }
                SyntaxKind::CloseParen | SyntaxKind::CloseBracket | SyntaxKind::CloseBrace | SyntaxKind::Gt => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                SyntaxKind::Comma | SyntaxKind::Eq if depth == 0 => return,
                _ => {}
            }
            self.next_token();
        }
    }
}
