//! AST node definitions.
//!
//! Nodes live in a [`NodeArena`] and refer to each other by [`NodeIndex`].
//! Every node records the byte span it was parsed from, so later phases can
//! report diagnostics and the emitter can reuse literal source text.

use super::base::{NodeIndex, NodeList};
use super::type_expr::TypeExpr;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub pos: u32,
    pub end: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AttrKind {
    Reader,
    Writer,
    Accessor,
}

impl AttrKind {
    pub fn keyword(self) -> &'static str {
        match self {
            AttrKind::Reader => "attr_reader",
            AttrKind::Writer => "attr_writer",
            AttrKind::Accessor => "attr_accessor",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttrItem {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub pos: u32,
    pub end: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ParamKind {
    Positional,
    /// `*rest`
    Rest,
    /// `**opts`
    KeywordRest,
    /// `&block`
    Block,
    /// Declared inside a `{ ... }` keyword group, or Ruby-style `name:`.
    Keyword,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub ty: Option<TypeExpr>,
    /// Default value expression, `NONE` when the parameter is required.
    pub default: NodeIndex,
    pub pos: u32,
    pub end: u32,
}

impl Param {
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypeParamDecl {
    pub name: String,
    pub pos: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub name_pos: u32,
    /// `def self.name`
    pub singleton: bool,
    pub type_params: Vec<TypeParamDecl>,
    pub params: Vec<Param>,
    pub has_parens: bool,
    pub return_type: Option<TypeExpr>,
    pub body: NodeList,
    /// `def name(args) = expr`
    pub endless: bool,
    /// Declared without a body (interface members and prelude declarations).
    pub signature_only: bool,
    pub visibility: Visibility,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum IfForm {
    If,
    Elsif,
    Unless,
    /// `stmt if cond`
    Modifier,
    /// `stmt unless cond`
    UnlessModifier,
    /// `cond ? a : b`
    Ternary,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WhenClause {
    pub values: NodeList,
    pub body: NodeList,
    pub pos: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Guard {
    pub condition: NodeIndex,
    pub unless: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InClause {
    pub pattern: Pattern,
    pub guard: Option<Guard>,
    pub body: NodeList,
    pub pos: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RescueClause {
    pub classes: NodeList,
    pub binding: Option<String>,
    pub body: NodeList,
    pub pos: u32,
}

/// The rest element of an array or hash pattern.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum RestPattern {
    /// `*` or `**` with no name.
    Anonymous,
    Named(String),
    /// `**nil`
    NoRest,
}

/// `case/in` patterns.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Pattern {
    /// A literal, range, or other expression matched with `===`.
    Value(NodeIndex),
    /// A constant, optionally followed by `(...)` or `[...]`.
    Const {
        constant: NodeIndex,
        sub: Option<Box<Pattern>>,
    },
    /// A bare identifier binds the matched value.
    Bind { name: String, pos: u32 },
    /// `^name` or `^(expr)`
    Pin(NodeIndex),
    Array {
        pre: Vec<Pattern>,
        rest: Option<RestPattern>,
        post: Vec<Pattern>,
    },
    Hash {
        entries: Vec<HashPatternEntry>,
        rest: Option<RestPattern>,
    },
    Alternatives(Vec<Pattern>),
    /// `pattern => name`
    Capture {
        pattern: Box<Pattern>,
        name: String,
        pos: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HashPatternEntry {
    pub key: String,
    /// `None` for `key:` which binds a local of the same name.
    pub value: Option<Pattern>,
    pub pos: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum StringPart {
    Text(String),
    Code(NodeIndex),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum HashKey {
    /// `name: value`
    Label(String),
    /// `name:` with the value taken from the local `name`.
    Shorthand(String),
    /// `key => value`
    Expr(NodeIndex),
    /// `**other`
    DoubleSplat,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HashEntry {
    pub key: HashKey,
    pub value: NodeIndex,
    pub pos: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CallData {
    pub receiver: NodeIndex,
    pub method: String,
    pub method_pos: u32,
    pub args: NodeList,
    pub block: NodeIndex,
    /// `recv&.method`
    pub safe_nav: bool,
    pub has_parens: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    CaseEq,
    Match,
    NotMatch,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Cmp,
    Shl,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    /// `and`
    AndWord,
    /// `or`
    OrWord,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::CaseEq => "===",
            BinaryOp::Match => "=~",
            BinaryOp::NotMatch => "!~",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Cmp => "<=>",
            BinaryOp::Shl => "<<",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::AndWord => "and",
            BinaryOp::OrWord => "or",
        }
    }

    pub fn is_logical(self) -> bool {
        matches!(
            self,
            BinaryOp::And | BinaryOp::Or | BinaryOp::AndWord | BinaryOp::OrWord
        )
    }

    /// Operators that always produce a boolean.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::CaseEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
                | BinaryOp::NotMatch
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    /// `not`
    NotWord,
    Neg,
    Pos,
    BitNot,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::NotWord => "not ",
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::BitNot => "~",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Or,
    And,
    Shl,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
            AssignOp::Pow => "**=",
            AssignOp::Or => "||=",
            AssignOp::And => "&&=",
            AssignOp::Shl => "<<=",
        }
    }

    /// The binary operator applied by the compound assignment.
    pub fn binary(self) -> BinaryOp {
        match self {
            AssignOp::Add => BinaryOp::Add,
            AssignOp::Sub => BinaryOp::Sub,
            AssignOp::Mul => BinaryOp::Mul,
            AssignOp::Div => BinaryOp::Div,
            AssignOp::Mod => BinaryOp::Mod,
            AssignOp::Pow => BinaryOp::Pow,
            AssignOp::Or => BinaryOp::Or,
            AssignOp::And => BinaryOp::And,
            AssignOp::Shl => BinaryOp::Shl,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum NodeKind {
    SourceFile {
        statements: NodeList,
    },

    // Declarations
    TypeAlias {
        name: String,
        ty: TypeExpr,
    },
    Interface {
        name: String,
        members: NodeList,
    },
    Class {
        name: String,
        type_params: Vec<TypeParamDecl>,
        superclass: Option<TypeExpr>,
        body: NodeList,
    },
    Module {
        name: String,
        body: NodeList,
    },
    Method(Box<MethodDecl>),
    /// `@name: Type` with an optional initializer.
    IvarDecl {
        name: String,
        ty: TypeExpr,
        value: NodeIndex,
    },
    Attr {
        kind: AttrKind,
        items: Vec<AttrItem>,
    },
    /// A bare `private` / `public` / `protected` line.
    VisibilityMarker(Visibility),

    // Statements
    /// `name: Type = value`
    TypedLocal {
        name: String,
        ty: TypeExpr,
        value: NodeIndex,
    },
    Assign {
        target: NodeIndex,
        value: NodeIndex,
    },
    OpAssign {
        target: NodeIndex,
        op: AssignOp,
        value: NodeIndex,
    },
    MultiAssign {
        targets: NodeList,
        value: NodeIndex,
    },
    If {
        condition: NodeIndex,
        then_branch: NodeList,
        else_branch: NodeList,
        form: IfForm,
    },
    While {
        condition: NodeIndex,
        body: NodeList,
        until: bool,
        modifier: bool,
    },
    Case {
        subject: NodeIndex,
        whens: Vec<WhenClause>,
        else_branch: Option<NodeList>,
    },
    CaseIn {
        subject: NodeIndex,
        clauses: Vec<InClause>,
        else_branch: Option<NodeList>,
    },
    Begin {
        body: NodeList,
        rescues: Vec<RescueClause>,
        else_branch: Option<NodeList>,
        ensure: Option<NodeList>,
        /// Rescue clauses attached directly to a method or block body.
        implicit: bool,
    },
    Return {
        value: NodeIndex,
    },
    Break {
        value: NodeIndex,
    },
    Next {
        value: NodeIndex,
    },
    Yield {
        args: NodeList,
        has_parens: bool,
    },

    // Expressions
    Nil,
    True,
    False,
    SelfRef,
    Integer {
        value: i64,
    },
    Float {
        value: f64,
    },
    Str {
        parts: Vec<StringPart>,
        /// Single-quoted.
        raw: bool,
    },
    Symbol {
        name: String,
    },
    Regex,
    Array {
        elements: NodeList,
    },
    Hash {
        entries: Vec<HashEntry>,
        /// False for trailing `key: value` call arguments.
        braces: bool,
    },
    Range {
        start: NodeIndex,
        end: NodeIndex,
        exclusive: bool,
    },
    /// A local variable or an argument-less receiverless call.
    Identifier {
        name: String,
    },
    InstanceVar {
        name: String,
    },
    ClassVar {
        name: String,
    },
    GlobalVar {
        name: String,
    },
    Constant {
        scope: NodeIndex,
        name: String,
        /// `::Name`
        top_level: bool,
    },
    Call(Box<CallData>),
    Index {
        receiver: NodeIndex,
        args: NodeList,
    },
    Super {
        args: NodeList,
        has_parens: bool,
        block: NodeIndex,
    },
    Block {
        params: Vec<Param>,
        body: NodeList,
        brace: bool,
    },
    /// `&value` argument; `value` is `NONE` for anonymous forwarding.
    BlockPass {
        value: NodeIndex,
    },
    Lambda {
        params: Vec<Param>,
        has_parens: bool,
        body: NodeList,
        brace: bool,
    },
    Binary {
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    },
    Unary {
        op: UnaryOp,
        operand: NodeIndex,
    },
    Paren {
        statements: NodeList,
    },
    Splat {
        value: NodeIndex,
    },
    DoubleSplat {
        value: NodeIndex,
    },
    Error,
}

impl NodeKind {
    /// Whether the node can appear on the left of `=`.
    pub fn is_assignable(&self) -> bool {
        match self {
            NodeKind::Identifier { .. }
            | NodeKind::InstanceVar { .. }
            | NodeKind::ClassVar { .. }
            | NodeKind::GlobalVar { .. }
            | NodeKind::Constant { .. }
            | NodeKind::Index { .. } => true,
            NodeKind::Call(call) => {
                call.receiver.is_some() && call.args.is_empty() && call.block.is_none() && !call.has_parens
            }
            _ => false,
        }
    }

    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::TypeAlias { .. }
                | NodeKind::Interface { .. }
                | NodeKind::Class { .. }
                | NodeKind::Module { .. }
                | NodeKind::Method(_)
                | NodeKind::IvarDecl { .. }
                | NodeKind::Attr { .. }
                | NodeKind::VisibilityMarker(_)
        )
    }
}
