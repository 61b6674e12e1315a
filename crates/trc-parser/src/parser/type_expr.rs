//! Syntactic type annotations.
//!
//! A `TypeExpr` is what the user wrote after a `:`; the binder resolves it
//! to an interned type.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub pos: u32,
    pub end: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum LiteralType {
    String(String),
    Integer(i64),
    /// Source text of a float literal.
    Float(String),
    Symbol(String),
    Bool(bool),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordField {
    pub name: String,
    pub ty: TypeExpr,
    /// `name?: T`
    pub optional: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TypeExprKind {
    /// `String`, `Array<T>`, `Foo::Bar`, `untyped`, ...
    Name { name: String, args: Vec<TypeExpr> },
    Literal(LiteralType),
    Nil,
    SelfType,
    /// `T?`
    Optional(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
    Intersection(Vec<TypeExpr>),
    /// `{ name: String, age?: Integer }`
    Record(Vec<RecordField>),
    /// A type the parser could not read; already reported.
    Error,
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, pos: u32, end: u32) -> Self {
        TypeExpr { kind, pos, end }
    }

    pub fn name(name: impl Into<String>, pos: u32, end: u32) -> Self {
        TypeExpr::new(
            TypeExprKind::Name {
                name: name.into(),
                args: Vec::new(),
            },
            pos,
            end,
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TypeExprKind::Error)
    }

    /// Visit every named reference in the annotation.
    pub fn for_each_name(&self, f: &mut impl FnMut(&str)) {
        match &self.kind {
            TypeExprKind::Name { name, args } => {
                f(name);
                for arg in args {
                    arg.for_each_name(f);
                }
            }
            TypeExprKind::Optional(inner) => inner.for_each_name(f),
            TypeExprKind::Union(members) | TypeExprKind::Intersection(members) => {
                for member in members {
                    member.for_each_name(f);
                }
            }
            TypeExprKind::Record(fields) => {
                for field in fields {
                    field.ty.for_each_name(f);
                }
            }
            TypeExprKind::Literal(_)
            | TypeExprKind::Nil
            | TypeExprKind::SelfType
            | TypeExprKind::Error => {}
        }
    }
}
