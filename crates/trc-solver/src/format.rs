//! Human-readable type names for diagnostics, in `.trb` annotation syntax.

use crate::intern::TypeInterner;
use crate::types::{IntrinsicKind, LiteralValue, ParamKind, TypeId, TypeKey};

const MAX_FORMAT_DEPTH: u32 = 20;

pub struct TypeFormatter<'a> {
    interner: &'a TypeInterner,
    depth: u32,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(interner: &'a TypeInterner) -> Self {
        TypeFormatter { interner, depth: 0 }
    }

    pub fn format(&mut self, ty: TypeId) -> String {
        if self.depth > MAX_FORMAT_DEPTH {
            return "...".to_string();
        }
        self.depth += 1;
        let text = self.format_key(ty);
        self.depth -= 1;
        text
    }

    fn format_key(&mut self, ty: TypeId) -> String {
        let Some(key) = self.interner.lookup(ty) else {
            return "untyped".to_string();
        };
        match key {
            TypeKey::Intrinsic(kind) => match kind {
                IntrinsicKind::Error | IntrinsicKind::Any => "untyped".to_string(),
                IntrinsicKind::Void => "void".to_string(),
                IntrinsicKind::Never => "never".to_string(),
                IntrinsicKind::Nil => "nil".to_string(),
                IntrinsicKind::SelfType => "self".to_string(),
                _ => kind.class_name().unwrap_or("untyped").to_string(),
            },
            TypeKey::Literal(value) => self.format_literal(&value),
            TypeKey::Union(members) => {
                let non_nil: Vec<TypeId> = members.iter().copied().filter(|m| *m != TypeId::NIL).collect();
                let has_nil = non_nil.len() < members.len();
                if has_nil && non_nil.len() == 1 {
                    return format!("{}?", self.format_operand(non_nil[0]));
                }
                let mut parts: Vec<String> = non_nil.iter().map(|m| self.format_operand(*m)).collect();
                if has_nil {
                    parts.push("nil".to_string());
                }
                parts.join(" | ")
            }
            TypeKey::Intersection(members) => members
                .iter()
                .map(|m| self.format_operand(*m))
                .collect::<Vec<_>>()
                .join(" & "),
            TypeKey::Instance(name, args) => {
                let name = self.interner.resolve_atom(name);
                if args.is_empty() {
                    return name.to_string();
                }
                let args: Vec<String> = args.iter().map(|a| self.format(*a)).collect();
                format!("{name}<{}>", args.join(", "))
            }
            TypeKey::Singleton(name) => format!("singleton({})", self.interner.resolve_atom(name)),
            TypeKey::Interface(name) | TypeKey::TypeParam(name) => self.interner.resolve_atom(name).to_string(),
            TypeKey::Record(fields) => {
                if fields.is_empty() {
                    return "{}".to_string();
                }
                let fields: Vec<String> = fields
                    .iter()
                    .map(|f| {
                        let name = self.interner.resolve_atom(f.name);
                        let optional = if f.optional { "?" } else { "" };
                        format!("{name}{optional}: {}", self.format(f.ty))
                    })
                    .collect();
                format!("{{ {} }}", fields.join(", "))
            }
            TypeKey::Function(id) => {
                let Some(shape) = self.interner.function_shape(id) else {
                    return "Proc".to_string();
                };
                let plain = shape.params.iter().all(|p| p.kind == ParamKind::Required && p.name.is_none());
                if plain && shape.block.is_none() {
                    let mut parts: Vec<String> = shape.params.iter().map(|p| self.format(p.ty)).collect();
                    parts.push(self.format(shape.return_type));
                    return format!("Proc<{}>", parts.join(", "));
                }
                let params: Vec<String> = shape
                    .params
                    .iter()
                    .map(|p| {
                        let ty = self.format(p.ty);
                        let name = p.name.map(|n| self.interner.resolve_atom(n).to_string()).unwrap_or_default();
                        match p.kind {
                            ParamKind::Required => ty,
                            ParamKind::Optional => format!("?{ty}"),
                            ParamKind::Rest => format!("*{ty}"),
                            ParamKind::Keyword => format!("{name}: {ty}"),
                            ParamKind::OptionalKeyword => format!("?{name}: {ty}"),
                            ParamKind::KeywordRest => format!("**{ty}"),
                        }
                    })
                    .collect();
                format!("({}) -> {}", params.join(", "), self.format(shape.return_type))
            }
        }
    }

    /// Format a union or intersection member, parenthesizing composites.
    fn format_operand(&mut self, ty: TypeId) -> String {
        let text = self.format(ty);
        match self.interner.lookup(ty) {
            Some(TypeKey::Union(_) | TypeKey::Intersection(_)) => format!("({text})"),
            Some(TypeKey::Function(_)) if text.starts_with('(') => format!("({text})"),
            _ => text,
        }
    }

    fn format_literal(&self, value: &LiteralValue) -> String {
        match value {
            LiteralValue::String(atom) => format!("{:?}", &*self.interner.resolve_atom(*atom)),
            LiteralValue::Integer(n) => n.to_string(),
            LiteralValue::Float(atom) => self.interner.resolve_atom(*atom).to_string(),
            LiteralValue::Symbol(atom) => format!(":{}", self.interner.resolve_atom(*atom)),
            LiteralValue::Bool(b) => b.to_string(),
        }
    }
}
