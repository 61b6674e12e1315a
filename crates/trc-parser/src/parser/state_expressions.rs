//! Parser state - expressions, calls, blocks and literals.

use super::base::{NodeIndex, NodeList};
use super::node::{
    AssignOp, BinaryOp, CallData, HashEntry, HashKey, NodeKind, Param, ParamKind, StringPart,
    UnaryOp, Visibility,
};
use super::state::ParserState;
use trc_common::diagnostics::diagnostic_codes;
use trc_scanner::{ScannerState, StringSegment, SyntaxKind};

fn assignment_operator(kind: SyntaxKind) -> Option<AssignOp> {
    Some(match kind {
        SyntaxKind::PlusEq => AssignOp::Add,
        SyntaxKind::MinusEq => AssignOp::Sub,
        SyntaxKind::StarEq => AssignOp::Mul,
        SyntaxKind::SlashEq => AssignOp::Div,
        SyntaxKind::PercentEq => AssignOp::Mod,
        SyntaxKind::StarStarEq => AssignOp::Pow,
        SyntaxKind::PipePipeEq => AssignOp::Or,
        SyntaxKind::AmpAmpEq => AssignOp::And,
        SyntaxKind::LtLtEq => AssignOp::Shl,
        _ => return None,
    })
}

/// Parse an integer literal's cooked text (underscores already removed).
pub(crate) fn parse_integer_text(text: &str) -> i64 {
    let parsed = if let Some(hex) = text.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = text.strip_prefix("0b") {
        i64::from_str_radix(bin, 2)
    } else if let Some(oct) = text.strip_prefix("0o") {
        i64::from_str_radix(oct, 8)
    } else {
        text.parse::<i64>()
    };
    parsed.unwrap_or(i64::MAX)
}

impl ParserState {
    // =========================================================================
    // Statement-level expressions
    // =========================================================================

    pub(crate) fn parse_expression_statement(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let first = self.parse_expression();
        if self.is_token(SyntaxKind::Comma) && self.is_multi_assign_target(first) {
            return self.parse_multi_assign(pos, first);
        }
        first
    }

    fn is_multi_assign_target(&self, node: NodeIndex) -> bool {
        self.node_kind(node).is_some_and(|kind| {
            kind.is_assignable() || matches!(kind, NodeKind::Splat { .. })
        })
    }

    /// `a, b = b, a`
    fn parse_multi_assign(&mut self, pos: u32, first: NodeIndex) -> NodeIndex {
        let mut targets = vec![first];
        while self.parse_optional(SyntaxKind::Comma) {
            let target_pos = self.token_pos();
            let target = if self.parse_optional(SyntaxKind::Star) {
                let value = self.parse_postfix();
                self.finish_node(NodeKind::Splat { value }, target_pos)
            } else {
                self.parse_postfix()
            };
            targets.push(target);
        }
        self.parse_expected(SyntaxKind::Eq);
        self.skip_newlines();
        let value_pos = self.token_pos();
        let first_value = self.parse_argument();
        let value = if self.is_token(SyntaxKind::Comma) {
            let mut elements = vec![first_value];
            while self.parse_optional(SyntaxKind::Comma) {
                self.skip_newlines();
                elements.push(self.parse_argument());
            }
            self.finish_node(NodeKind::Array { elements }, value_pos)
        } else {
            first_value
        };
        for &target in &targets {
            self.declare_assignment_target(target);
        }
        self.finish_node(NodeKind::MultiAssign { targets, value }, pos)
    }

    fn declare_assignment_target(&mut self, target: NodeIndex) {
        let name = match self.node_kind(target) {
            Some(NodeKind::Identifier { name }) => name.clone(),
            Some(NodeKind::Splat { value }) => {
                let value = *value;
                self.declare_assignment_target(value);
                return;
            }
            _ => return,
        };
        self.declare_local(&name);
    }

    // =========================================================================
    // Operator precedence
    // =========================================================================

    /// `and` / `or`, the loosest binding operators.
    pub(crate) fn parse_expression(&mut self) -> NodeIndex {
        if !self.enter_nesting() {
            self.leave_nesting();
            let pos = self.token_pos();
            self.resync_statement();
            return self.finish_node(NodeKind::Error, pos);
        }
        let pos = self.token_pos();
        let mut left = self.parse_not_expression();
        loop {
            let op = match self.token() {
                SyntaxKind::AndKeyword => BinaryOp::AndWord,
                SyntaxKind::OrKeyword => BinaryOp::OrWord,
                _ => break,
            };
            self.next_token();
            self.skip_newlines();
            let right = self.parse_not_expression();
            left = self.finish_node(NodeKind::Binary { op, left, right }, pos);
        }
        self.leave_nesting();
        left
    }

    fn parse_not_expression(&mut self) -> NodeIndex {
        if self.is_token(SyntaxKind::NotKeyword) {
            let pos = self.token_pos();
            self.next_token();
            let operand = self.parse_not_expression();
            return self.finish_node(
                NodeKind::Unary {
                    op: UnaryOp::NotWord,
                    operand,
                },
                pos,
            );
        }
        self.parse_assignment_expression()
    }

    pub(crate) fn parse_assignment_expression(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let target = self.parse_ternary();
        let assignable = self
            .node_kind(target)
            .is_some_and(NodeKind::is_assignable);
        if !assignable {
            return target;
        }
        if self.is_token(SyntaxKind::Eq) {
            self.next_token();
            self.skip_newlines();
            let value = self.parse_assignment_expression();
            self.declare_assignment_target(target);
            return self.finish_node(NodeKind::Assign { target, value }, pos);
        }
        if let Some(op) = assignment_operator(self.token()) {
            self.next_token();
            self.skip_newlines();
            let value = self.parse_assignment_expression();
            self.declare_assignment_target(target);
            return self.finish_node(NodeKind::OpAssign { target, op, value }, pos);
        }
        target
    }

    pub(crate) fn parse_ternary(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let condition = self.parse_range();
        if !self.is_token(SyntaxKind::Question) {
            return condition;
        }
        self.next_token();
        self.skip_newlines();
        let then_value = self.parse_ternary();
        self.skip_newlines();
        self.parse_expected(SyntaxKind::Colon);
        self.skip_newlines();
        let else_value = self.parse_ternary();
        self.finish_node(
            NodeKind::If {
                condition,
                then_branch: vec![then_value],
                else_branch: vec![else_value],
                form: super::node::IfForm::Ternary,
            },
            pos,
        )
    }

    pub(crate) fn parse_range(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let start = self.parse_binary(0);
        let exclusive = match self.token() {
            SyntaxKind::DotDot => false,
            SyntaxKind::DotDotDot => true,
            _ => return start,
        };
        self.next_token();
        let end = if self.can_start_argument() {
            self.parse_binary(0)
        } else {
            NodeIndex::NONE
        };
        self.finish_node(
            NodeKind::Range {
                start,
                end,
                exclusive,
            },
            pos,
        )
    }

    fn binary_operator(&self) -> Option<(BinaryOp, u8)> {
        Some(match self.token() {
            SyntaxKind::PipePipe => (BinaryOp::Or, 1),
            SyntaxKind::AmpAmp => (BinaryOp::And, 2),
            SyntaxKind::EqEq => (BinaryOp::Eq, 4),
            SyntaxKind::BangEq => (BinaryOp::NotEq, 4),
            SyntaxKind::EqEqEq => (BinaryOp::CaseEq, 4),
            SyntaxKind::EqTilde => (BinaryOp::Match, 4),
            SyntaxKind::BangTilde => (BinaryOp::NotMatch, 4),
            SyntaxKind::Spaceship => (BinaryOp::Cmp, 4),
            SyntaxKind::Lt => (BinaryOp::Lt, 5),
            SyntaxKind::LtEq => (BinaryOp::LtEq, 5),
            SyntaxKind::Gt => (BinaryOp::Gt, 5),
            SyntaxKind::GtEq => (BinaryOp::GtEq, 5),
            SyntaxKind::Pipe if !self.no_pipe => (BinaryOp::BitOr, 6),
            SyntaxKind::Caret => (BinaryOp::BitXor, 6),
            SyntaxKind::Amp => (BinaryOp::BitAnd, 7),
            SyntaxKind::LtLt => (BinaryOp::Shl, 8),
            SyntaxKind::Plus => (BinaryOp::Add, 9),
            SyntaxKind::Minus => (BinaryOp::Sub, 9),
            SyntaxKind::Star => (BinaryOp::Mul, 10),
            SyntaxKind::Slash => (BinaryOp::Div, 10),
            SyntaxKind::Percent => (BinaryOp::Mod, 10),
            _ => return None,
        })
    }

    fn parse_binary(&mut self, min_precedence: u8) -> NodeIndex {
        let pos = self.token_pos();
        let mut left = self.parse_unary();
        while let Some((op, precedence)) = self.binary_operator() {
            if precedence < min_precedence {
                break;
            }
            self.next_token();
            self.skip_newlines();
            let right = self.parse_binary(precedence + 1);
            left = self.finish_node(NodeKind::Binary { op, left, right }, pos);
        }
        left
    }

    fn parse_unary(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let op = match self.token() {
            SyntaxKind::Bang => UnaryOp::Not,
            SyntaxKind::Tilde => UnaryOp::BitNot,
            SyntaxKind::Plus => UnaryOp::Pos,
            SyntaxKind::Minus => {
                self.next_token();
                if matches!(
                    self.token(),
                    SyntaxKind::IntegerLiteral | SyntaxKind::FloatLiteral
                ) && !self.preceded_by_space()
                {
                    let literal = self.parse_number(pos, true);
                    let base = self.parse_postfix_tail(literal, pos);
                    return self.parse_power_tail(base, pos);
                }
                let operand = self.parse_unary();
                return self.finish_node(
                    NodeKind::Unary {
                        op: UnaryOp::Neg,
                        operand,
                    },
                    pos,
                );
            }
            SyntaxKind::Star => {
                self.next_token();
                let value = self.parse_unary();
                return self.finish_node(NodeKind::Splat { value }, pos);
            }
            SyntaxKind::StarStar => {
                self.next_token();
                let value = self.parse_unary();
                return self.finish_node(NodeKind::DoubleSplat { value }, pos);
            }
            SyntaxKind::Amp => {
                self.next_token();
                let value = if self.can_start_argument() {
                    self.parse_unary()
                } else {
                    NodeIndex::NONE
                };
                return self.finish_node(NodeKind::BlockPass { value }, pos);
            }
            _ => {
                let base = self.parse_postfix();
                return self.parse_power_tail(base, pos);
            }
        };
        self.next_token();
        let operand = self.parse_unary();
        self.finish_node(NodeKind::Unary { op, operand }, pos)
    }

    /// `base ** exponent`, right-associative and tighter than unary minus.
    fn parse_power_tail(&mut self, base: NodeIndex, pos: u32) -> NodeIndex {
        if !self.is_token(SyntaxKind::StarStar) {
            return base;
        }
        self.next_token();
        self.skip_newlines();
        let right = self.parse_unary();
        self.finish_node(
            NodeKind::Binary {
                op: BinaryOp::Pow,
                left: base,
                right,
            },
            pos,
        )
    }

    // =========================================================================
    // Postfix: method calls, indexing, blocks
    // =========================================================================

    pub(crate) fn parse_postfix(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let primary = self.parse_primary();
        self.parse_postfix_tail(primary, pos)
    }

    fn parse_postfix_tail(&mut self, mut expr: NodeIndex, pos: u32) -> NodeIndex {
        loop {
            match self.token() {
                SyntaxKind::Dot | SyntaxKind::SafeNavigation => {
                    let safe_nav = self.is_token(SyntaxKind::SafeNavigation);
                    self.next_token();
                    self.skip_newlines();
                    let method_pos = self.token_pos();
                    let method = match self.token() {
                        // `callable.(args)`
                        SyntaxKind::OpenParen => "call".to_string(),
                        SyntaxKind::Identifier | SyntaxKind::Constant => {
                            let name = self.token_value();
                            self.next_token();
                            name
                        }
                        kind if kind.is_keyword() || self.is_operator_method_token() => {
                            let name = kind.text().to_string();
                            self.next_token();
                            name
                        }
                        _ => {
                            self.parse_error_at_current_token(
                                diagnostic_codes::IDENTIFIER_EXPECTED,
                                &[],
                            );
                            break;
                        }
                    };
                    expr = self.parse_call_rest(expr, method, method_pos, safe_nav, pos);
                }
                SyntaxKind::ColonColon => {
                    match self.peek_token() {
                        SyntaxKind::Constant => {
                            self.next_token();
                            let name = self.token_value();
                            let method_pos = self.token_pos();
                            self.next_token();
                            if self.is_token(SyntaxKind::OpenParen) && !self.preceded_by_space() {
                                expr = self.parse_call_rest(expr, name, method_pos, false, pos);
                            } else {
                                expr = self.finish_node(
                                    NodeKind::Constant {
                                        scope: expr,
                                        name,
                                        top_level: false,
                                    },
                                    pos,
                                );
                            }
                        }
                        SyntaxKind::Identifier => {
                            self.next_token();
                            let name = self.token_value();
                            let method_pos = self.token_pos();
                            self.next_token();
                            expr = self.parse_call_rest(expr, name, method_pos, false, pos);
                        }
                        _ => break,
                    }
                }
                SyntaxKind::OpenBracket if !self.preceded_by_space() => {
                    self.next_token();
                    let saved = self.reset_context_flags();
                    let args = self.parse_argument_list(Some(SyntaxKind::CloseBracket));
                    self.restore_context_flags(saved);
                    self.parse_expected(SyntaxKind::CloseBracket);
                    expr = self.finish_node(
                        NodeKind::Index {
                            receiver: expr,
                            args,
                        },
                        pos,
                    );
                }
                SyntaxKind::OpenBrace if self.can_take_block(expr) => {
                    let block = self.parse_block(true);
                    expr = self.attach_block(expr, block);
                }
                SyntaxKind::DoKeyword if !self.no_do_block && self.can_take_block(expr) => {
                    let block = self.parse_block(false);
                    expr = self.attach_block(expr, block);
                }
                _ => break,
            }
        }
        expr
    }

    fn is_operator_method_token(&self) -> bool {
        matches!(
            self.token(),
            SyntaxKind::Plus
                | SyntaxKind::Minus
                | SyntaxKind::Star
                | SyntaxKind::Slash
                | SyntaxKind::Percent
                | SyntaxKind::EqEq
                | SyntaxKind::Lt
                | SyntaxKind::Gt
                | SyntaxKind::LtEq
                | SyntaxKind::GtEq
                | SyntaxKind::Spaceship
                | SyntaxKind::LtLt
        )
    }

    /// Arguments after a method name that has already been consumed.
    fn parse_call_rest(
        &mut self,
        receiver: NodeIndex,
        method: String,
        method_pos: u32,
        safe_nav: bool,
        pos: u32,
    ) -> NodeIndex {
        let mut has_parens = false;
        let args = if self.is_token(SyntaxKind::OpenParen) && !self.preceded_by_space() {
            has_parens = true;
            self.parse_paren_arguments()
        } else if self.can_start_command_arguments() {
            self.parse_command_arguments()
        } else {
            NodeList::new()
        };
        let (args, block) = self.split_block_pass(args);
        self.finish_node(
            NodeKind::Call(Box::new(CallData {
                receiver,
                method,
                method_pos,
                args,
                block,
                safe_nav,
                has_parens,
            })),
            pos,
        )
    }

    fn split_block_pass(&self, mut args: NodeList) -> (NodeList, NodeIndex) {
        if let Some(&last) = args.last() {
            if matches!(self.node_kind(last), Some(NodeKind::BlockPass { .. })) {
                args.pop();
                return (args, last);
            }
        }
        (args, NodeIndex::NONE)
    }

    fn can_take_block(&self, expr: NodeIndex) -> bool {
        match self.node_kind(expr) {
            Some(NodeKind::Call(call)) => call.block.is_none(),
            Some(NodeKind::Super { block, .. }) => block.is_none(),
            Some(NodeKind::Identifier { name }) => !self.is_local(name),
            _ => false,
        }
    }

    fn attach_block(&mut self, expr: NodeIndex, block: NodeIndex) -> NodeIndex {
        let block_end = self.arena.span(block).1;
        let identifier = match self.node_kind(expr) {
            Some(NodeKind::Identifier { name }) => Some(name.clone()),
            _ => None,
        };
        if let Some(method) = identifier {
            let pos = self.node_pos(expr);
            return self.arena.add(
                NodeKind::Call(Box::new(CallData {
                    receiver: NodeIndex::NONE,
                    method,
                    method_pos: pos,
                    args: NodeList::new(),
                    block,
                    safe_nav: false,
                    has_parens: false,
                })),
                pos,
                block_end,
            );
        }
        if let Some(node) = self.arena.get_mut(expr) {
            match &mut node.kind {
                NodeKind::Call(call) => call.block = block,
                NodeKind::Super { block: slot, .. } => *slot = block,
                _ => {}
            }
            node.end = block_end;
        }
        expr
    }

    // =========================================================================
    // Arguments
    // =========================================================================

    /// Whether the current token can begin an argument or operand.
    pub(crate) fn can_start_argument(&self) -> bool {
        matches!(
            self.token(),
            SyntaxKind::Identifier
                | SyntaxKind::Constant
                | SyntaxKind::InstanceVariable
                | SyntaxKind::ClassVariable
                | SyntaxKind::GlobalVariable
                | SyntaxKind::IntegerLiteral
                | SyntaxKind::FloatLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::RawStringLiteral
                | SyntaxKind::SymbolLiteral
                | SyntaxKind::RegexLiteral
                | SyntaxKind::NilKeyword
                | SyntaxKind::TrueKeyword
                | SyntaxKind::FalseKeyword
                | SyntaxKind::SelfKeyword
                | SyntaxKind::SuperKeyword
                | SyntaxKind::YieldKeyword
                | SyntaxKind::NotKeyword
                | SyntaxKind::DefKeyword
                | SyntaxKind::Arrow
                | SyntaxKind::OpenParen
                | SyntaxKind::OpenBracket
                | SyntaxKind::OpenBrace
                | SyntaxKind::ColonColon
                | SyntaxKind::Minus
                | SyntaxKind::Bang
                | SyntaxKind::Star
                | SyntaxKind::StarStar
                | SyntaxKind::Amp
                | SyntaxKind::Tilde
        )
    }

    /// After a method name: does a space-separated argument list follow?
    ///
    /// `foo -1` and `foo *args` are calls with arguments, while `foo - 1` and
    /// `foo * 2` are binary expressions.
    pub(crate) fn can_start_command_arguments(&self) -> bool {
        if !self.preceded_by_space() {
            return false;
        }
        match self.token() {
            SyntaxKind::Minus
            | SyntaxKind::Star
            | SyntaxKind::StarStar
            | SyntaxKind::Amp
            | SyntaxKind::ColonColon
            | SyntaxKind::Bang
            | SyntaxKind::Tilde => !self.scanner.followed_by_space(),
            SyntaxKind::OpenBrace => false,
            _ => self.can_start_argument(),
        }
    }

    fn parse_command_arguments(&mut self) -> NodeList {
        let saved = self.no_do_block;
        self.no_do_block = true;
        let args = self.parse_argument_list(None);
        self.no_do_block = saved;
        args
    }

    fn parse_paren_arguments(&mut self) -> NodeList {
        self.next_token();
        let saved = self.reset_context_flags();
        let args = self.parse_argument_list(Some(SyntaxKind::CloseParen));
        self.restore_context_flags(saved);
        self.parse_expected(SyntaxKind::CloseParen);
        args
    }

    /// Comma-separated arguments. Trailing `key: value` pairs are collected
    /// into one brace-less hash argument.
    fn parse_argument_list(&mut self, closing: Option<SyntaxKind>) -> NodeList {
        let mut args = NodeList::new();
        let mut entries = Vec::new();
        let mut hash_pos = None;
        loop {
            if let Some(close) = closing {
                self.skip_newlines();
                if self.is_token(close) || self.is_token(SyntaxKind::EndOfFile) {
                    break;
                }
            }
            let entry_pos = self.token_pos();
            if self.at_label() {
                hash_pos.get_or_insert(entry_pos);
                entries.push(self.parse_label_entry());
            } else if self.is_token(SyntaxKind::StarStar) {
                hash_pos.get_or_insert(entry_pos);
                self.next_token();
                let value = self.parse_ternary();
                entries.push(HashEntry {
                    key: HashKey::DoubleSplat,
                    value,
                    pos: entry_pos,
                });
            } else {
                let arg = self.parse_argument();
                if self.parse_optional(SyntaxKind::FatArrow) {
                    hash_pos.get_or_insert(entry_pos);
                    self.skip_newlines();
                    let value = self.parse_argument();
                    entries.push(HashEntry {
                        key: HashKey::Expr(arg),
                        value,
                        pos: entry_pos,
                    });
                } else {
                    args.push(arg);
                }
            }
            if closing.is_some() {
                self.skip_newlines();
            }
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        if let Some(pos) = hash_pos {
            let hash = self.finish_node(
                NodeKind::Hash {
                    entries,
                    braces: false,
                },
                pos,
            );
            // A block pass stays last.
            let block_pass = args
                .last()
                .copied()
                .filter(|&last| matches!(self.node_kind(last), Some(NodeKind::BlockPass { .. })));
            if let Some(block_pass) = block_pass {
                args.pop();
                args.push(hash);
                args.push(block_pass);
            } else {
                args.push(hash);
            }
        }
        args
    }

    /// `name: value`, or shorthand `name:` when no value follows.
    fn parse_label_entry(&mut self) -> HashEntry {
        let pos = self.token_pos();
        let name = self.token_value();
        self.next_token();
        self.next_token();
        if matches!(
            self.token(),
            SyntaxKind::Comma
                | SyntaxKind::CloseParen
                | SyntaxKind::CloseBrace
                | SyntaxKind::CloseBracket
                | SyntaxKind::Newline
                | SyntaxKind::EndOfFile
        ) {
            return HashEntry {
                key: HashKey::Shorthand(name),
                value: NodeIndex::NONE,
                pos,
            };
        }
        self.skip_newlines();
        let value = self.parse_argument();
        HashEntry {
            key: HashKey::Label(name),
            value,
            pos,
        }
    }

    /// A single argument: splat, block pass, or any non-`and`/`or` expression.
    pub(crate) fn parse_argument(&mut self) -> NodeIndex {
        match self.token() {
            SyntaxKind::Star | SyntaxKind::Amp => self.parse_unary(),
            _ => self.parse_not_expression(),
        }
    }

    fn reset_context_flags(&mut self) -> (bool, bool) {
        let saved = (self.no_do_block, self.no_pipe);
        self.no_do_block = false;
        self.no_pipe = false;
        saved
    }

    fn restore_context_flags(&mut self, saved: (bool, bool)) {
        self.no_do_block = saved.0;
        self.no_pipe = saved.1;
    }

    // =========================================================================
    // Blocks and lambdas
    // =========================================================================

    /// `{ |x| ... }` or `do |x| ... end`
    fn parse_block(&mut self, brace: bool) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        let saved = self.reset_context_flags();
        self.push_scope(false);
        let params = if self.is_token(SyntaxKind::Pipe) {
            self.parse_block_parameters()
        } else {
            self.parse_optional(SyntaxKind::PipePipe);
            Vec::new()
        };
        self.declare_params(&params);
        let body = if brace {
            let body = self.parse_statements();
            self.parse_expected(SyntaxKind::CloseBrace);
            body
        } else {
            self.parse_body_until_end(pos)
        };
        self.pop_scope();
        self.restore_context_flags(saved);
        self.finish_node(NodeKind::Block { params, body, brace }, pos)
    }

    /// `|a, b: Integer, *rest, &blk|`
    fn parse_block_parameters(&mut self) -> Vec<Param> {
        self.next_token();
        self.no_pipe = true;
        let mut params = Vec::new();
        while !matches!(self.token(), SyntaxKind::Pipe | SyntaxKind::EndOfFile) {
            let pos = self.token_pos();
            let kind = match self.token() {
                SyntaxKind::Star => {
                    self.next_token();
                    ParamKind::Rest
                }
                SyntaxKind::StarStar => {
                    self.next_token();
                    ParamKind::KeywordRest
                }
                SyntaxKind::Amp => {
                    self.next_token();
                    ParamKind::Block
                }
                _ => ParamKind::Positional,
            };
            let name = if self.is_token(SyntaxKind::Identifier) {
                let name = self.token_value();
                self.next_token();
                name
            } else if kind == ParamKind::Positional {
                self.parse_error_at_current_token(diagnostic_codes::IDENTIFIER_EXPECTED, &[]);
                self.next_token();
                continue;
            } else {
                String::new()
            };
            let ty = if self.parse_optional(SyntaxKind::Colon) {
                Some(self.parse_intersection_type())
            } else {
                None
            };
            let default = if self.parse_optional(SyntaxKind::Eq) {
                self.parse_ternary()
            } else {
                NodeIndex::NONE
            };
            params.push(Param {
                name,
                kind,
                ty,
                default,
                pos,
                end: self.prev_token_end,
            });
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.no_pipe = false;
        self.parse_expected(SyntaxKind::Pipe);
        params
    }

    /// `->(x: Integer) { x + 1 }`
    fn parse_lambda(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        self.push_scope(false);
        let mut has_parens = false;
        let params = if self.is_token(SyntaxKind::OpenParen) {
            has_parens = true;
            self.parse_parameter_list()
        } else {
            let mut params = Vec::new();
            while self.is_token(SyntaxKind::Identifier) {
                params.push(Param {
                    name: self.token_value(),
                    kind: ParamKind::Positional,
                    ty: None,
                    default: NodeIndex::NONE,
                    pos: self.token_pos(),
                    end: self.token_end(),
                });
                self.next_token();
                if !self.parse_optional(SyntaxKind::Comma) {
                    break;
                }
            }
            params
        };
        self.declare_params(&params);
        let saved = self.reset_context_flags();
        let (body, brace) = match self.token() {
            SyntaxKind::OpenBrace => {
                self.next_token();
                let body = self.parse_statements();
                self.parse_expected(SyntaxKind::CloseBrace);
                (body, true)
            }
            SyntaxKind::DoKeyword => {
                self.next_token();
                (self.parse_body_until_end(pos), false)
            }
            _ => {
                self.parse_error_at_current_token(diagnostic_codes::EXPECTED, &["{"]);
                (NodeList::new(), true)
            }
        };
        self.restore_context_flags(saved);
        self.pop_scope();
        self.finish_node(
            NodeKind::Lambda {
                params,
                has_parens,
                body,
                brace,
            },
            pos,
        )
    }

    // =========================================================================
    // Primary expressions
    // =========================================================================

    fn parse_primary(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        match self.token() {
            SyntaxKind::IntegerLiteral | SyntaxKind::FloatLiteral => self.parse_number(pos, false),
            SyntaxKind::StringLiteral => self.parse_string(),
            SyntaxKind::RawStringLiteral => {
                let text = self.token_value();
                self.next_token();
                self.finish_node(
                    NodeKind::Str {
                        parts: vec![StringPart::Text(text)],
                        raw: true,
                    },
                    pos,
                )
            }
            SyntaxKind::SymbolLiteral => {
                let name = self.token_value();
                self.next_token();
                self.finish_node(NodeKind::Symbol { name }, pos)
            }
            SyntaxKind::RegexLiteral => {
                self.next_token();
                self.finish_node(NodeKind::Regex, pos)
            }
            SyntaxKind::NilKeyword => self.parse_keyword_literal(NodeKind::Nil),
            SyntaxKind::TrueKeyword => self.parse_keyword_literal(NodeKind::True),
            SyntaxKind::FalseKeyword => self.parse_keyword_literal(NodeKind::False),
            SyntaxKind::SelfKeyword => self.parse_keyword_literal(NodeKind::SelfRef),
            SyntaxKind::InstanceVariable => {
                let name = self.token_value();
                self.parse_keyword_literal(NodeKind::InstanceVar { name })
            }
            SyntaxKind::ClassVariable => {
                let name = self.token_value();
                self.parse_keyword_literal(NodeKind::ClassVar { name })
            }
            SyntaxKind::GlobalVariable => {
                let name = self.token_value();
                self.parse_keyword_literal(NodeKind::GlobalVar { name })
            }
            SyntaxKind::Constant => {
                let name = self.token_value();
                self.next_token();
                if self.is_token(SyntaxKind::OpenParen) && !self.preceded_by_space() {
                    return self.parse_call_rest(NodeIndex::NONE, name, pos, false, pos);
                }
                self.finish_node(
                    NodeKind::Constant {
                        scope: NodeIndex::NONE,
                        name,
                        top_level: false,
                    },
                    pos,
                )
            }
            SyntaxKind::ColonColon => {
                self.next_token();
                if !self.is_token(SyntaxKind::Constant) {
                    self.parse_error_at_current_token(diagnostic_codes::IDENTIFIER_EXPECTED, &[]);
                    return self.finish_node(NodeKind::Error, pos);
                }
                let name = self.token_value();
                self.next_token();
                self.finish_node(
                    NodeKind::Constant {
                        scope: NodeIndex::NONE,
                        name,
                        top_level: true,
                    },
                    pos,
                )
            }
            SyntaxKind::Identifier => self.parse_identifier(),
            SyntaxKind::OpenParen => self.parse_paren_expression(),
            SyntaxKind::OpenBracket => self.parse_array_literal(),
            SyntaxKind::OpenBrace => self.parse_hash_literal(),
            SyntaxKind::Arrow => self.parse_lambda(),
            SyntaxKind::IfKeyword | SyntaxKind::UnlessKeyword => self.parse_if(),
            SyntaxKind::WhileKeyword | SyntaxKind::UntilKeyword => self.parse_while(),
            SyntaxKind::CaseKeyword => self.parse_case(),
            SyntaxKind::BeginKeyword => self.parse_begin(),
            SyntaxKind::DefKeyword => self.parse_method(Visibility::Public),
            SyntaxKind::ReturnKeyword | SyntaxKind::BreakKeyword | SyntaxKind::NextKeyword => {
                self.parse_statement()
            }
            SyntaxKind::YieldKeyword => {
                self.next_token();
                let (args, has_parens) = self.parse_optional_call_arguments();
                self.finish_node(NodeKind::Yield { args, has_parens }, pos)
            }
            SyntaxKind::SuperKeyword => {
                self.next_token();
                let (args, has_parens) = self.parse_optional_call_arguments();
                let (args, block) = self.split_block_pass(args);
                self.finish_node(
                    NodeKind::Super {
                        args,
                        has_parens,
                        block,
                    },
                    pos,
                )
            }
            SyntaxKind::NotKeyword => self.parse_not_expression(),
            SyntaxKind::DotDot | SyntaxKind::DotDotDot => {
                let exclusive = self.is_token(SyntaxKind::DotDotDot);
                self.next_token();
                let end = self.parse_binary(0);
                self.finish_node(
                    NodeKind::Range {
                        start: NodeIndex::NONE,
                        end,
                        exclusive,
                    },
                    pos,
                )
            }
            _ => {
                self.parse_error_at_current_token(diagnostic_codes::EXPRESSION_EXPECTED, &[]);
                if !self.at_terminator() && !self.at_block_end() {
                    self.next_token();
                }
                self.finish_node(NodeKind::Error, pos)
            }
        }
    }

    fn parse_keyword_literal(&mut self, kind: NodeKind) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        self.finish_node(kind, pos)
    }

    fn parse_number(&mut self, pos: u32, negative: bool) -> NodeIndex {
        let text = self.token_value();
        let is_float = self.is_token(SyntaxKind::FloatLiteral);
        self.next_token();
        let kind = if is_float {
            let value: f64 = text.parse().unwrap_or(0.0);
            NodeKind::Float {
                value: if negative { -value } else { value },
            }
        } else {
            let value = parse_integer_text(&text);
            NodeKind::Integer {
                value: if negative { value.wrapping_neg() } else { value },
            }
        };
        self.finish_node(kind, pos)
    }

    /// `(args)` or space-separated arguments for `yield` and `super`.
    fn parse_optional_call_arguments(&mut self) -> (NodeList, bool) {
        if self.is_token(SyntaxKind::OpenParen) && !self.preceded_by_space() {
            (self.parse_paren_arguments(), true)
        } else if self.can_start_command_arguments() {
            (self.parse_command_arguments(), false)
        } else {
            (NodeList::new(), false)
        }
    }

    /// A lowercase name: local variable, or a receiverless method call.
    fn parse_identifier(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let name = self.token_value();
        self.next_token();
        let paren_call = self.is_token(SyntaxKind::OpenParen) && !self.preceded_by_space();
        if self.is_local(&name) && !paren_call {
            return self.finish_node(NodeKind::Identifier { name }, pos);
        }
        if paren_call || self.can_start_command_arguments() {
            return self.parse_call_rest(NodeIndex::NONE, name, pos, false, pos);
        }
        self.finish_node(NodeKind::Identifier { name }, pos)
    }

    fn parse_paren_expression(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        let saved = self.reset_context_flags();
        let statements = self.parse_statements();
        self.restore_context_flags(saved);
        self.parse_expected(SyntaxKind::CloseParen);
        self.finish_node(NodeKind::Paren { statements }, pos)
    }

    fn parse_array_literal(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        let saved = self.reset_context_flags();
        let mut elements = NodeList::new();
        loop {
            self.skip_newlines();
            if matches!(
                self.token(),
                SyntaxKind::CloseBracket | SyntaxKind::EndOfFile
            ) {
                break;
            }
            elements.push(self.parse_argument());
            self.skip_newlines();
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.skip_newlines();
        self.restore_context_flags(saved);
        self.parse_expected(SyntaxKind::CloseBracket);
        self.finish_node(NodeKind::Array { elements }, pos)
    }

    fn parse_hash_literal(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        let saved = self.reset_context_flags();
        let mut entries = Vec::new();
        loop {
            self.skip_newlines();
            if matches!(self.token(), SyntaxKind::CloseBrace | SyntaxKind::EndOfFile) {
                break;
            }
            let entry_pos = self.token_pos();
            if self.at_label() {
                entries.push(self.parse_label_entry());
            } else if self.parse_optional(SyntaxKind::StarStar) {
                let value = self.parse_ternary();
                entries.push(HashEntry {
                    key: HashKey::DoubleSplat,
                    value,
                    pos: entry_pos,
                });
            } else {
                let key = self.parse_ternary();
                self.skip_newlines();
                self.parse_expected(SyntaxKind::FatArrow);
                self.skip_newlines();
                let value = self.parse_argument();
                entries.push(HashEntry {
                    key: HashKey::Expr(key),
                    value,
                    pos: entry_pos,
                });
            }
            self.skip_newlines();
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.skip_newlines();
        self.restore_context_flags(saved);
        self.parse_expected(SyntaxKind::CloseBrace);
        self.finish_node(
            NodeKind::Hash {
                entries,
                braces: true,
            },
            pos,
        )
    }

    // =========================================================================
    // Strings
    // =========================================================================

    fn parse_string(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let segments = self.scanner.segments().to_vec();
        let parts = if segments.is_empty() {
            vec![StringPart::Text(self.token_value())]
        } else {
            segments
                .into_iter()
                .map(|segment| match segment {
                    StringSegment::Text(text) => StringPart::Text(text),
                    StringSegment::Interpolation { source, offset } => {
                        StringPart::Code(self.parse_interpolation(&source, offset))
                    }
                })
                .collect()
        };
        self.next_token();
        self.finish_node(NodeKind::Str { parts, raw: false }, pos)
    }

    /// Parse the code inside `#{...}` with a scanner positioned at its
    /// absolute offset in the file.
    fn parse_interpolation(&mut self, source: &str, offset: u32) -> NodeIndex {
        let inner = ScannerState::new_at(source, offset);
        let outer = std::mem::replace(&mut self.scanner, inner);
        let saved_end = self.prev_token_end;
        let saved_flags = self.reset_context_flags();

        self.next_token();
        let statements = self.parse_statements();
        if !self.is_token(SyntaxKind::EndOfFile) {
            self.unexpected_token();
        }
        self.drain_scanner();

        self.scanner = outer;
        self.restore_context_flags(saved_flags);
        let end = offset + source.len() as u32;
        self.prev_token_end = saved_end;
        if statements.len() == 1 {
            return statements[0];
        }
        self.arena.add(NodeKind::Paren { statements }, offset, end)
    }
}
