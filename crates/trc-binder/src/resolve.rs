//! Lowering of syntactic annotations to interned types.
//!
//! The same lowering serves the binder (where aliases resolve lazily and may
//! be part of a cycle) and the checker (which resolves annotations inside
//! method bodies against the finished table). The two differ only in how a
//! name is looked up, which is the [`NameLookup`] seam.

use smallvec::SmallVec;
use trc_common::interner::Atom;
use trc_parser::{LiteralType, TypeExpr, TypeExprKind};
use trc_solver::{FunctionShape, ParamInfo, ParamKind, RecordField, TypeId, TypeInterner};

use crate::errors::ResolveError;

/// Names visible while resolving an annotation.
#[derive(Clone, Copy, Debug, Default)]
pub struct TypeScope<'a> {
    /// Generic parameters of the enclosing class and method.
    pub type_params: &'a [Atom],
    /// Qualified name of the enclosing class or module, `""` at top level.
    pub namespace: &'a str,
}

impl<'a> TypeScope<'a> {
    pub fn new(type_params: &'a [Atom], namespace: &'a str) -> Self {
        TypeScope {
            type_params,
            namespace,
        }
    }
}

/// What a type name refers to.
pub(crate) enum NameBinding {
    /// An alias, already resolved.
    Type(TypeId),
    Class { name: Atom, arity: usize },
    Interface(Atom),
    Unknown,
}

pub(crate) trait NameLookup {
    fn interner(&self) -> &TypeInterner;

    fn lookup_type_name(&mut self, name: &str, namespace: &str) -> NameBinding;

    /// Called for every intersection built, with its resolved members.
    fn note_intersection(&mut self, _members: &[TypeId], _pos: u32, _end: u32) {}
}

/// Qualified names `name` may refer to from inside `namespace`, innermost
/// first. A leading `::` makes the name absolute.
pub(crate) fn namespace_candidates(name: &str, namespace: &str) -> SmallVec<[String; 4]> {
    let mut out = SmallVec::new();
    if let Some(absolute) = name.strip_prefix("::") {
        out.push(absolute.to_string());
        return out;
    }
    let mut prefix = namespace;
    while !prefix.is_empty() {
        out.push(format!("{prefix}::{name}"));
        prefix = prefix.rfind("::").map_or("", |at| &prefix[..at]);
    }
    out.push(name.to_string());
    out
}

pub(crate) fn resolve_type_expr<L: NameLookup>(
    lookup: &mut L,
    expr: &TypeExpr,
    scope: &TypeScope<'_>,
) -> Result<TypeId, ResolveError> {
    match &expr.kind {
        TypeExprKind::Error => Ok(TypeId::ERROR),
        TypeExprKind::Nil => Ok(TypeId::NIL),
        TypeExprKind::SelfType => Ok(TypeId::SELF),
        TypeExprKind::Literal(literal) => {
            let interner = lookup.interner();
            Ok(match literal {
                LiteralType::String(value) => interner.literal_string(value),
                LiteralType::Integer(value) => interner.literal_integer(*value),
                LiteralType::Float(text) => interner.literal_float(text),
                LiteralType::Symbol(name) => interner.literal_symbol(name),
                LiteralType::Bool(value) => interner.literal_bool(*value),
            })
        }
        TypeExprKind::Optional(inner) => {
            let inner = resolve_type_expr(lookup, inner, scope)?;
            Ok(lookup.interner().optional(inner))
        }
        TypeExprKind::Union(members) => {
            let members = resolve_all(lookup, members, scope)?;
            Ok(lookup.interner().union(members))
        }
        TypeExprKind::Intersection(members) => {
            let members = resolve_all(lookup, members, scope)?;
            lookup.note_intersection(&members, expr.pos, expr.end);
            Ok(lookup.interner().intersection(members))
        }
        TypeExprKind::Record(fields) => {
            let mut resolved = Vec::with_capacity(fields.len());
            for field in fields {
                let ty = resolve_type_expr(lookup, &field.ty, scope)?;
                resolved.push(RecordField {
                    name: lookup.interner().intern_string(&field.name),
                    ty,
                    optional: field.optional,
                });
            }
            Ok(lookup.interner().record(resolved))
        }
        TypeExprKind::Name { name, args } => resolve_named(lookup, name, args, expr, scope),
    }
}

fn resolve_all<L: NameLookup>(
    lookup: &mut L,
    exprs: &[TypeExpr],
    scope: &TypeScope<'_>,
) -> Result<Vec<TypeId>, ResolveError> {
    exprs
        .iter()
        .map(|expr| resolve_type_expr(lookup, expr, scope))
        .collect()
}

fn resolve_named<L: NameLookup>(
    lookup: &mut L,
    name: &str,
    args: &[TypeExpr],
    expr: &TypeExpr,
    scope: &TypeScope<'_>,
) -> Result<TypeId, ResolveError> {
    let builtin = match name {
        "untyped" | "Any" | "any" => Some(TypeId::ANY),
        "void" => Some(TypeId::VOID),
        "never" | "bot" => Some(TypeId::NEVER),
        "bool" | "boolean" | "Boolean" => Some(TypeId::BOOLEAN),
        "self" => Some(TypeId::SELF),
        "nil" | "NilClass" => Some(TypeId::NIL),
        _ => None,
    };
    if let Some(ty) = builtin {
        return Ok(ty);
    }
    if name == "Proc" {
        return resolve_proc(lookup, args, scope);
    }

    let atom = lookup.interner().intern_string(name);
    if scope.type_params.contains(&atom) {
        return expect_no_args(name, args, expr).map(|()| lookup.interner().type_param(atom));
    }

    match lookup.lookup_type_name(name, scope.namespace) {
        NameBinding::Type(ty) => expect_no_args(name, args, expr).map(|()| ty),
        NameBinding::Interface(interface) => {
            expect_no_args(name, args, expr).map(|()| lookup.interner().interface(interface))
        }
        NameBinding::Class { name: class, arity } => {
            let resolved = if args.is_empty() {
                vec![TypeId::ANY; arity]
            } else if args.len() != arity {
                return Err(ResolveError::TypeArgumentCount {
                    name: name.to_string(),
                    expected: arity,
                    found: args.len(),
                    pos: expr.pos,
                    end: expr.end,
                });
            } else {
                resolve_all(lookup, args, scope)?
            };
            Ok(lookup.interner().instance(class, resolved))
        }
        NameBinding::Unknown => Err(ResolveError::UnresolvedType {
            name: name.to_string(),
            pos: expr.pos,
            end: expr.end,
        }),
    }
}

/// `Proc<A, B, R>` is a proc taking `A` and `B` and returning `R`. A bare
/// `Proc` accepts anything.
fn resolve_proc<L: NameLookup>(
    lookup: &mut L,
    args: &[TypeExpr],
    scope: &TypeScope<'_>,
) -> Result<TypeId, ResolveError> {
    let Some((ret, params)) = args.split_last() else {
        let rest = ParamInfo {
            name: None,
            ty: TypeId::ANY,
            kind: ParamKind::Rest,
        };
        return Ok(lookup
            .interner()
            .function(FunctionShape::new(vec![rest], TypeId::ANY)));
    };
    let params = resolve_all(lookup, params, scope)?;
    let ret = resolve_type_expr(lookup, ret, scope)?;
    Ok(lookup.interner().proc_type(params, ret))
}

fn expect_no_args(name: &str, args: &[TypeExpr], expr: &TypeExpr) -> Result<(), ResolveError> {
    if args.is_empty() {
        return Ok(());
    }
    Err(ResolveError::TypeArgumentCount {
        name: name.to_string(),
        expected: 0,
        found: args.len(),
        pos: expr.pos,
        end: expr.end,
    })
}
