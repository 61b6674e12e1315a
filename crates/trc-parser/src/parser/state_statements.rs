//! Parser state - statements, declarations and control flow.

use super::base::{NodeIndex, NodeList};
use super::node::{
    AttrItem, AttrKind, Guard, IfForm, InClause, MethodDecl, NodeKind, Param, ParamKind,
    RescueClause, TypeParamDecl, Visibility, WhenClause,
};
use super::state::ParserState;
use trc_common::diagnostics::diagnostic_codes;
use trc_scanner::SyntaxKind;

impl ParserState {
    // =========================================================================
    // Statements
    // =========================================================================

    pub(crate) fn parse_statement(&mut self) -> NodeIndex {
        if !self.enter_nesting() {
            self.leave_nesting();
            self.resync_statement();
            return NodeIndex::NONE;
        }
        let statement = self.parse_statement_worker();
        let statement = self.parse_statement_modifiers(statement);
        self.leave_nesting();
        statement
    }

    fn parse_statement_worker(&mut self) -> NodeIndex {
        match self.token() {
            SyntaxKind::DefKeyword => self.parse_method(Visibility::Public),
            SyntaxKind::ClassKeyword => self.parse_class(),
            SyntaxKind::ModuleKeyword => self.parse_module(),
            SyntaxKind::ReturnKeyword | SyntaxKind::BreakKeyword | SyntaxKind::NextKeyword => {
                self.parse_jump()
            }
            SyntaxKind::InstanceVariable if self.at_glued_colon() => self.parse_ivar_declaration(),
            SyntaxKind::Identifier => self.parse_identifier_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    /// Next token is a `:` written directly after the current one.
    fn at_glued_colon(&mut self) -> bool {
        self.look_ahead(|p| {
            p.next_token();
            p.is_token(SyntaxKind::Colon) && !p.preceded_by_space()
        })
    }

    fn parse_identifier_statement(&mut self) -> NodeIndex {
        let value = self.token_value();
        match value.as_str() {
            "type" if self.peek_token() == SyntaxKind::Constant => return self.parse_type_alias(),
            "interface" if self.peek_token() == SyntaxKind::Constant => return self.parse_interface(),
            "attr_reader" | "attr_writer" | "attr_accessor"
                if self.peek_token() == SyntaxKind::SymbolLiteral =>
            {
                return self.parse_attr_declaration();
            }
            "private" | "public" | "protected" => {
                let visibility = match value.as_str() {
                    "private" => Visibility::Private,
                    "protected" => Visibility::Protected,
                    _ => Visibility::Public,
                };
                match self.peek_token() {
                    SyntaxKind::Newline
                    | SyntaxKind::Semicolon
                    | SyntaxKind::EndOfFile
                    | SyntaxKind::EndKeyword => {
                        let pos = self.token_pos();
                        self.next_token();
                        return self.finish_node(NodeKind::VisibilityMarker(visibility), pos);
                    }
                    SyntaxKind::DefKeyword => {
                        self.next_token();
                        return self.parse_method(visibility);
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        if self.at_label() {
            return self.parse_typed_local();
        }
        self.parse_expression_statement()
    }

    /// `stmt if cond`, `stmt unless cond`, `stmt while cond`, `stmt rescue value`
    fn parse_statement_modifiers(&mut self, mut statement: NodeIndex) -> NodeIndex {
        if statement.is_none() {
            return statement;
        }
        loop {
            let pos = self.node_pos(statement);
            statement = match self.token() {
                SyntaxKind::IfKeyword | SyntaxKind::UnlessKeyword => {
                    let form = if self.is_token(SyntaxKind::IfKeyword) {
                        IfForm::Modifier
                    } else {
                        IfForm::UnlessModifier
                    };
                    self.next_token();
                    let condition = self.parse_expression();
                    self.finish_node(
                        NodeKind::If {
                            condition,
                            then_branch: vec![statement],
                            else_branch: NodeList::new(),
                            form,
                        },
                        pos,
                    )
                }
                SyntaxKind::WhileKeyword | SyntaxKind::UntilKeyword => {
                    let until = self.is_token(SyntaxKind::UntilKeyword);
                    self.next_token();
                    let condition = self.parse_expression();
                    self.finish_node(
                        NodeKind::While {
                            condition,
                            body: vec![statement],
                            until,
                            modifier: true,
                        },
                        pos,
                    )
                }
                SyntaxKind::RescueKeyword => {
                    let rescue_pos = self.token_pos();
                    self.next_token();
                    let value = self.parse_expression();
                    self.finish_node(
                        NodeKind::Begin {
                            body: vec![statement],
                            rescues: vec![RescueClause {
                                classes: NodeList::new(),
                                binding: None,
                                body: vec![value],
                                pos: rescue_pos,
                            }],
                            else_branch: None,
                            ensure: None,
                            implicit: false,
                        },
                        pos,
                    )
                }
                _ => return statement,
            };
        }
    }

    fn parse_jump(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let keyword = self.token();
        self.next_token();
        let value = if self.at_terminator()
            || self.at_block_end()
            || matches!(
                self.token(),
                SyntaxKind::IfKeyword
                    | SyntaxKind::UnlessKeyword
                    | SyntaxKind::WhileKeyword
                    | SyntaxKind::UntilKeyword
            ) {
            NodeIndex::NONE
        } else {
            let value_pos = self.token_pos();
            let first = self.parse_expression();
            if self.is_token(SyntaxKind::Comma) {
                let mut elements = vec![first];
                while self.parse_optional(SyntaxKind::Comma) {
                    self.skip_newlines();
                    elements.push(self.parse_ternary());
                }
                self.finish_node(NodeKind::Array { elements }, value_pos)
            } else {
                first
            }
        };
        let kind = match keyword {
            SyntaxKind::ReturnKeyword => NodeKind::Return { value },
            SyntaxKind::BreakKeyword => NodeKind::Break { value },
            _ => NodeKind::Next { value },
        };
        self.finish_node(kind, pos)
    }

    // =========================================================================
    // Type-level declarations
    // =========================================================================

    /// `type Name = Type`
    fn parse_type_alias(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        let name = self.token_value();
        self.next_token();
        self.parse_expected(SyntaxKind::Eq);
        self.skip_newlines();
        let ty = self.parse_type();
        self.finish_node(NodeKind::TypeAlias { name, ty }, pos)
    }

    /// `interface Name` followed by method signatures and `end`.
    fn parse_interface(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        let name = self.parse_constant_path_name();
        let mut members = NodeList::new();
        loop {
            self.skip_terminators();
            if matches!(self.token(), SyntaxKind::EndKeyword | SyntaxKind::EndOfFile)
                || self.error_limit_reached()
            {
                break;
            }
            if self.is_token(SyntaxKind::DefKeyword) {
                members.push(self.parse_method_declaration(Visibility::Public, true));
            } else {
                let start = self.token_pos();
                self.unexpected_token();
                self.resync_statement();
                if self.token_pos() == start && !self.at_terminator() {
                    self.next_token();
                }
            }
        }
        self.parse_expected(SyntaxKind::EndKeyword);
        self.finish_node(NodeKind::Interface { name, members }, pos)
    }

    /// `attr_reader :name: String, :age: Integer`
    fn parse_attr_declaration(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let kind = match self.scanner.token_value() {
            "attr_writer" => AttrKind::Writer,
            "attr_accessor" => AttrKind::Accessor,
            _ => AttrKind::Reader,
        };
        self.next_token();
        let mut items = Vec::new();
        loop {
            if !self.is_token(SyntaxKind::SymbolLiteral) {
                self.parse_error_at_current_token(diagnostic_codes::IDENTIFIER_EXPECTED, &[]);
                break;
            }
            let item_pos = self.token_pos();
            let name = self.token_value();
            self.next_token();
            let ty = if self.parse_optional(SyntaxKind::Colon) {
                Some(self.parse_type())
            } else {
                None
            };
            items.push(AttrItem {
                name,
                ty,
                pos: item_pos,
                end: self.prev_token_end,
            });
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.finish_node(NodeKind::Attr { kind, items }, pos)
    }

    /// `@name: Type` or `@name: Type = value`
    fn parse_ivar_declaration(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let name = self.token_value();
        self.next_token();
        self.parse_expected(SyntaxKind::Colon);
        let ty = self.parse_type();
        let value = if self.parse_optional(SyntaxKind::Eq) {
            self.skip_newlines();
            self.parse_assignment_expression()
        } else {
            NodeIndex::NONE
        };
        self.finish_node(NodeKind::IvarDecl { name, ty, value }, pos)
    }

    /// `name: Type = value`
    fn parse_typed_local(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let name = self.token_value();
        self.next_token();
        self.parse_expected(SyntaxKind::Colon);
        let ty = self.parse_type();
        let value = if self.parse_optional(SyntaxKind::Eq) {
            self.skip_newlines();
            self.parse_assignment_expression()
        } else {
            NodeIndex::NONE
        };
        self.declare_local(&name);
        self.finish_node(NodeKind::TypedLocal { name, ty, value }, pos)
    }

    // =========================================================================
    // Classes and modules
    // =========================================================================

    /// `Foo` or `Foo::Bar` as a declaration name.
    fn parse_constant_path_name(&mut self) -> String {
        if !self.is_token(SyntaxKind::Constant) {
            self.parse_error_at_current_token(diagnostic_codes::IDENTIFIER_EXPECTED, &[]);
            return String::new();
        }
        let mut name = self.token_value();
        self.next_token();
        while self.is_token(SyntaxKind::ColonColon) && self.peek_token() == SyntaxKind::Constant {
            self.next_token();
            name.push_str("::");
            name.push_str(self.scanner.token_value());
            self.next_token();
        }
        name
    }

    fn parse_class(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        let name = self.parse_constant_path_name();
        let type_params = if self.is_token(SyntaxKind::Lt) && !self.preceded_by_space() {
            self.parse_type_parameters()
        } else {
            Vec::new()
        };
        let superclass = if self.parse_optional(SyntaxKind::Lt) {
            Some(self.parse_intersection_type())
        } else {
            None
        };
        self.push_scope(true);
        let body = self.parse_statements();
        self.pop_scope();
        self.parse_expected(SyntaxKind::EndKeyword);
        self.finish_node(
            NodeKind::Class {
                name,
                type_params,
                superclass,
                body,
            },
            pos,
        )
    }

    fn parse_module(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        let name = self.parse_constant_path_name();
        self.push_scope(true);
        let body = self.parse_statements();
        self.pop_scope();
        self.parse_expected(SyntaxKind::EndKeyword);
        self.finish_node(NodeKind::Module { name, body }, pos)
    }

    /// `<T, U>` after a class or method name.
    pub(crate) fn parse_type_parameters(&mut self) -> Vec<TypeParamDecl> {
        let mut params = Vec::new();
        self.next_token();
        loop {
            if !self.is_token(SyntaxKind::Constant) {
                self.parse_error_at_current_token(diagnostic_codes::IDENTIFIER_EXPECTED, &[]);
                break;
            }
            params.push(TypeParamDecl {
                name: self.token_value(),
                pos: self.token_pos(),
            });
            self.next_token();
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::Gt);
        params
    }

    // =========================================================================
    // Methods
    // =========================================================================

    pub(crate) fn parse_method(&mut self, visibility: Visibility) -> NodeIndex {
        let signature_only = self.options.declaration_mode;
        self.parse_method_declaration(visibility, signature_only)
    }

    pub(crate) fn parse_method_declaration(
        &mut self,
        visibility: Visibility,
        signature_only: bool,
    ) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();

        let mut singleton = false;
        if self.is_token(SyntaxKind::SelfKeyword) && self.peek_token() == SyntaxKind::Dot {
            self.next_token();
            self.next_token();
            singleton = true;
        }

        let name_pos = self.token_pos();
        let Some(name) = self.parse_method_name() else {
            self.parse_error_at_current_token(diagnostic_codes::IDENTIFIER_EXPECTED, &[]);
            self.resync_statement();
            return self.finish_node(NodeKind::Error, pos);
        };

        let type_params = if self.is_token(SyntaxKind::Lt) && !self.preceded_by_space() {
            self.parse_type_parameters()
        } else {
            Vec::new()
        };

        let mut has_parens = false;
        let params = if self.is_token(SyntaxKind::OpenParen) {
            has_parens = true;
            self.parse_parameter_list()
        } else if matches!(
            self.token(),
            SyntaxKind::Identifier | SyntaxKind::Star | SyntaxKind::StarStar | SyntaxKind::Amp
        ) && self.preceded_by_space()
        {
            self.parse_bare_parameter_list()
        } else {
            Vec::new()
        };

        let return_type = if self.parse_optional(SyntaxKind::Colon) {
            Some(self.parse_type())
        } else {
            None
        };

        let mut decl = MethodDecl {
            name,
            name_pos,
            singleton,
            type_params,
            params,
            has_parens,
            return_type,
            body: NodeList::new(),
            endless: false,
            signature_only,
            visibility,
        };
        if signature_only {
            return self.finish_node(NodeKind::Method(Box::new(decl)), pos);
        }

        self.push_scope(true);
        self.declare_params(&decl.params);
        if self.parse_optional(SyntaxKind::Eq) {
            self.skip_newlines();
            decl.endless = true;
            decl.body = vec![self.parse_expression_statement()];
        } else {
            decl.body = self.parse_body_until_end(pos);
        }
        self.pop_scope();
        self.finish_node(NodeKind::Method(Box::new(decl)), pos)
    }

    fn parse_method_name(&mut self) -> Option<String> {
        let name = match self.token() {
            SyntaxKind::Identifier | SyntaxKind::Constant => {
                let mut name = self.token_value();
                self.next_token();
                // Setter: `def name=(value)`
                if self.is_token(SyntaxKind::Eq)
                    && !self.preceded_by_space()
                    && self.peek_token() == SyntaxKind::OpenParen
                {
                    self.next_token();
                    name.push('=');
                }
                return Some(name);
            }
            SyntaxKind::OpenBracket => {
                self.next_token();
                if !self.is_token(SyntaxKind::CloseBracket) {
                    return None;
                }
                self.next_token();
                if self.is_token(SyntaxKind::Eq) && !self.preceded_by_space() {
                    self.next_token();
                    return Some("[]=".to_string());
                }
                return Some("[]".to_string());
            }
            SyntaxKind::Plus
            | SyntaxKind::Minus
            | SyntaxKind::Star
            | SyntaxKind::StarStar
            | SyntaxKind::Slash
            | SyntaxKind::Percent
            | SyntaxKind::EqEq
            | SyntaxKind::EqEqEq
            | SyntaxKind::BangEq
            | SyntaxKind::Lt
            | SyntaxKind::LtEq
            | SyntaxKind::Gt
            | SyntaxKind::GtEq
            | SyntaxKind::Spaceship
            | SyntaxKind::LtLt
            | SyntaxKind::Bang
            | SyntaxKind::EqTilde
            | SyntaxKind::Amp
            | SyntaxKind::Pipe
            | SyntaxKind::Caret
            | SyntaxKind::Tilde => self.token().text().to_string(),
            _ => return None,
        };
        self.next_token();
        Some(name)
    }

    /// `(a: Integer, b = 1, *rest, { name: String, age: Integer = 0 }, &block)`
    pub(crate) fn parse_parameter_list(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        self.next_token();
        self.skip_newlines();
        while !matches!(self.token(), SyntaxKind::CloseParen | SyntaxKind::EndOfFile) {
            let before = self.token_pos();
            self.parse_parameter(&mut params);
            self.skip_newlines();
            if !self.parse_optional(SyntaxKind::Comma) {
                if self.token_pos() == before {
                    self.next_token();
                }
                break;
            }
            self.skip_newlines();
        }
        self.skip_newlines();
        self.parse_expected(SyntaxKind::CloseParen);
        params
    }

    fn parse_bare_parameter_list(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        loop {
            self.parse_parameter(&mut params);
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        params
    }

    fn parse_parameter(&mut self, params: &mut Vec<Param>) {
        let pos = self.token_pos();
        let kind = match self.token() {
            SyntaxKind::OpenBrace => {
                self.parse_keyword_group(params);
                return;
            }
            SyntaxKind::Star => ParamKind::Rest,
            SyntaxKind::StarStar => ParamKind::KeywordRest,
            SyntaxKind::Amp => ParamKind::Block,
            SyntaxKind::Identifier => ParamKind::Positional,
            _ => {
                self.parse_error_at_current_token(diagnostic_codes::IDENTIFIER_EXPECTED, &[]);
                return;
            }
        };
        if kind != ParamKind::Positional {
            self.next_token();
        }
        let name = if self.is_token(SyntaxKind::Identifier) {
            let name = self.token_value();
            self.next_token();
            name
        } else {
            String::new()
        };

        let mut kind = kind;
        let mut ty = None;
        if self.parse_optional(SyntaxKind::Colon) {
            if kind == ParamKind::Positional
                && matches!(self.token(), SyntaxKind::Comma | SyntaxKind::CloseParen)
            {
                // Plain Ruby keyword parameter `name:`.
                kind = ParamKind::Keyword;
            } else {
                ty = Some(self.parse_type());
            }
        }
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
    }

    /// `{ name: String, age: Integer = 0 }` declares keyword parameters.
    fn parse_keyword_group(&mut self, params: &mut Vec<Param>) {
        self.next_token();
        self.skip_newlines();
        while self.is_token(SyntaxKind::Identifier) {
            let pos = self.token_pos();
            let name = self.token_value();
            self.next_token();
            let mut ty = None;
            if self.parse_optional(SyntaxKind::Colon)
                && !matches!(
                    self.token(),
                    SyntaxKind::Comma | SyntaxKind::CloseBrace | SyntaxKind::Eq
                )
            {
                ty = Some(self.parse_type());
            }
            let default = if self.parse_optional(SyntaxKind::Eq) {
                self.parse_ternary()
            } else {
                NodeIndex::NONE
            };
            params.push(Param {
                name,
                kind: ParamKind::Keyword,
                ty,
                default,
                pos,
                end: self.prev_token_end,
            });
            self.skip_newlines();
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.skip_newlines();
        self.parse_expected(SyntaxKind::CloseBrace);
    }

    /// Body statements up to `end`, with optional `rescue`/`else`/`ensure`.
    pub(crate) fn parse_body_until_end(&mut self, pos: u32) -> NodeList {
        let body = self.parse_statements();
        let body = if matches!(
            self.token(),
            SyntaxKind::RescueKeyword | SyntaxKind::EnsureKeyword | SyntaxKind::ElseKeyword
        ) {
            vec![self.parse_rescue_tail(body, pos, true)]
        } else {
            body
        };
        self.parse_expected(SyntaxKind::EndKeyword);
        body
    }

    fn parse_rescue_tail(&mut self, body: NodeList, pos: u32, implicit: bool) -> NodeIndex {
        let mut rescues = Vec::new();
        while self.is_token(SyntaxKind::RescueKeyword) {
            let rescue_pos = self.token_pos();
            self.next_token();
            let mut classes = NodeList::new();
            while !self.at_terminator()
                && !matches!(self.token(), SyntaxKind::FatArrow | SyntaxKind::ThenKeyword)
            {
                classes.push(self.parse_ternary());
                if !self.parse_optional(SyntaxKind::Comma) {
                    break;
                }
                self.skip_newlines();
            }
            let binding = if self.parse_optional(SyntaxKind::FatArrow) {
                if self.is_token(SyntaxKind::Identifier) {
                    let name = self.token_value();
                    self.declare_local(&name);
                    self.next_token();
                    Some(name)
                } else {
                    self.parse_error_at_current_token(diagnostic_codes::IDENTIFIER_EXPECTED, &[]);
                    None
                }
            } else {
                None
            };
            self.parse_optional(SyntaxKind::ThenKeyword);
            let body = self.parse_statements();
            rescues.push(RescueClause {
                classes,
                binding,
                body,
                pos: rescue_pos,
            });
        }
        let else_branch = if self.parse_optional(SyntaxKind::ElseKeyword) {
            Some(self.parse_statements())
        } else {
            None
        };
        let ensure = if self.parse_optional(SyntaxKind::EnsureKeyword) {
            Some(self.parse_statements())
        } else {
            None
        };
        self.finish_node(
            NodeKind::Begin {
                body,
                rescues,
                else_branch,
                ensure,
                implicit,
            },
            pos,
        )
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    pub(crate) fn parse_if(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let unless = self.is_token(SyntaxKind::UnlessKeyword);
        self.next_token();
        let condition = self.parse_expression();
        self.parse_optional(SyntaxKind::ThenKeyword);
        let then_branch = self.parse_statements();
        let else_branch = self.parse_else_chain(unless);
        self.parse_expected(SyntaxKind::EndKeyword);
        let form = if unless { IfForm::Unless } else { IfForm::If };
        self.finish_node(
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
                form,
            },
            pos,
        )
    }

    /// `elsif ...` / `else ...` up to (not including) the closing `end`.
    fn parse_else_chain(&mut self, unless: bool) -> NodeList {
        match self.token() {
            SyntaxKind::ElsifKeyword if !unless => {
                let pos = self.token_pos();
                self.next_token();
                let condition = self.parse_expression();
                self.parse_optional(SyntaxKind::ThenKeyword);
                let then_branch = self.parse_statements();
                let else_branch = self.parse_else_chain(false);
                vec![self.finish_node(
                    NodeKind::If {
                        condition,
                        then_branch,
                        else_branch,
                        form: IfForm::Elsif,
                    },
                    pos,
                )]
            }
            SyntaxKind::ElseKeyword => {
                self.next_token();
                self.parse_statements()
            }
            _ => NodeList::new(),
        }
    }

    pub(crate) fn parse_while(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let until = self.is_token(SyntaxKind::UntilKeyword);
        self.next_token();
        let saved = self.no_do_block;
        self.no_do_block = true;
        let condition = self.parse_expression();
        self.no_do_block = saved;
        self.parse_optional(SyntaxKind::DoKeyword);
        let body = self.parse_statements();
        self.parse_expected(SyntaxKind::EndKeyword);
        self.finish_node(
            NodeKind::While {
                condition,
                body,
                until,
                modifier: false,
            },
            pos,
        )
    }

    pub(crate) fn parse_case(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        let subject = if self.at_terminator() {
            NodeIndex::NONE
        } else {
            self.parse_expression()
        };
        self.skip_terminators();

        if self.is_token(SyntaxKind::InKeyword) {
            return self.parse_case_in(pos, subject);
        }

        let mut whens = Vec::new();
        while self.is_token(SyntaxKind::WhenKeyword) {
            let when_pos = self.token_pos();
            self.next_token();
            let mut values = NodeList::new();
            loop {
                values.push(self.parse_argument());
                if !self.parse_optional(SyntaxKind::Comma) {
                    break;
                }
                self.skip_newlines();
            }
            self.parse_optional(SyntaxKind::ThenKeyword);
            let body = self.parse_statements();
            whens.push(WhenClause {
                values,
                body,
                pos: when_pos,
            });
        }
        if whens.is_empty() {
            self.parse_error_at_current_token(diagnostic_codes::EXPECTED, &["when"]);
        }
        let else_branch = if self.parse_optional(SyntaxKind::ElseKeyword) {
            Some(self.parse_statements())
        } else {
            None
        };
        self.parse_expected(SyntaxKind::EndKeyword);
        self.finish_node(
            NodeKind::Case {
                subject,
                whens,
                else_branch,
            },
            pos,
        )
    }

    fn parse_case_in(&mut self, pos: u32, subject: NodeIndex) -> NodeIndex {
        let mut clauses = Vec::new();
        while self.is_token(SyntaxKind::InKeyword) {
            let clause_pos = self.token_pos();
            self.next_token();
            let pattern = self.parse_top_pattern();
            let guard = match self.token() {
                SyntaxKind::IfKeyword | SyntaxKind::UnlessKeyword => {
                    let unless = self.is_token(SyntaxKind::UnlessKeyword);
                    self.next_token();
                    let condition = self.parse_expression();
                    Some(Guard { condition, unless })
                }
                _ => None,
            };
            self.parse_optional(SyntaxKind::ThenKeyword);
            let body = self.parse_statements();
            clauses.push(InClause {
                pattern,
                guard,
                body,
                pos: clause_pos,
            });
        }
        let else_branch = if self.parse_optional(SyntaxKind::ElseKeyword) {
            Some(self.parse_statements())
        } else {
            None
        };
        self.parse_expected(SyntaxKind::EndKeyword);
        self.finish_node(
            NodeKind::CaseIn {
                subject,
                clauses,
                else_branch,
            },
            pos,
        )
    }

    pub(crate) fn parse_begin(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        let body = self.parse_statements();
        let node = self.parse_rescue_tail(body, pos, false);
        self.parse_expected(SyntaxKind::EndKeyword);
        if let Some(node) = self.arena.get_mut(node) {
            node.end = self.prev_token_end;
        }
        node
    }
}
