//! Type names in RBS syntax.

use trc_solver::types::{FunctionShape, ParamKind, TypeKey};
use trc_solver::{IntrinsicKind, LiteralValue, TypeId, TypeInterner};

const MAX_DEPTH: u32 = 24;

pub struct RbsTypePrinter<'a> {
    interner: &'a TypeInterner,
    depth: u32,
}

impl<'a> RbsTypePrinter<'a> {
    pub fn new(interner: &'a TypeInterner) -> Self {
        RbsTypePrinter { interner, depth: 0 }
    }

    pub fn print(&mut self, ty: TypeId) -> String {
        if self.depth > MAX_DEPTH {
            return "untyped".to_string();
        }
        self.depth += 1;
        let text = self.print_key(ty);
        self.depth -= 1;
        text
    }

    fn print_key(&mut self, ty: TypeId) -> String {
        let Some(key) = self.interner.lookup(ty) else {
            return "untyped".to_string();
        };
        match key {
            TypeKey::Intrinsic(kind) => intrinsic_name(kind).to_string(),
            TypeKey::Literal(value) => self.print_literal(&value),
            TypeKey::Union(members) => {
                let non_nil: Vec<TypeId> = members.iter().copied().filter(|&m| m != TypeId::NIL).collect();
                let optional = non_nil.len() < members.len();
                if optional && non_nil.len() == 1 {
                    return format!("{}?", self.print_operand(non_nil[0]));
                }
                let union = non_nil
                    .iter()
                    .map(|&m| self.print_operand(m))
                    .collect::<Vec<_>>()
                    .join(" | ");
                if optional { format!("({union})?") } else { union }
            }
            TypeKey::Intersection(members) => members
                .iter()
                .map(|&m| self.print_operand(m))
                .collect::<Vec<_>>()
                .join(" & "),
            TypeKey::Instance(name, args) => {
                let name = self.interner.resolve_atom(name);
                if args.is_empty() {
                    return name.to_string();
                }
                let args: Vec<String> = args.iter().map(|&a| self.print(a)).collect();
                format!("{name}[{}]", args.join(", "))
            }
            TypeKey::Singleton(name) => format!("singleton({})", self.interner.resolve_atom(name)),
            TypeKey::Interface(name) => interface_name(&self.interner.resolve_atom(name)),
            TypeKey::TypeParam(name) => self.interner.resolve_atom(name).to_string(),
            TypeKey::Record(fields) => {
                if fields.is_empty() {
                    return "{ }".to_string();
                }
                let fields: Vec<String> = fields
                    .iter()
                    .map(|field| {
                        let optional = if field.optional { "?" } else { "" };
                        let name = self.interner.resolve_atom(field.name);
                        format!("{optional}{name}: {}", self.print(field.ty))
                    })
                    .collect();
                format!("{{ {} }}", fields.join(", "))
            }
            TypeKey::Function(id) => match self.interner.function_shape(id) {
                Some(shape) => format!("^{}", self.print_function(&shape, false)),
                None => "Proc".to_string(),
            },
        }
    }

    /// `(Integer a, ?String b, *Symbol rest, name: String) { (T) -> U } -> R`,
    /// prefixed by `[T] ` when the shape is generic. Parameter names are
    /// only printed for method signatures.
    pub fn print_function(&mut self, shape: &FunctionShape, named: bool) -> String {
        let mut text = String::new();
        if !shape.type_params.is_empty() {
            let params: Vec<String> = shape
                .type_params
                .iter()
                .map(|&p| self.interner.resolve_atom(p).to_string())
                .collect();
            text.push_str(&format!("[{}] ", params.join(", ")));
        }
        let params: Vec<String> = shape
            .params
            .iter()
            .map(|param| {
                let ty = self.print(param.ty);
                let name = param
                    .name
                    .map(|n| self.interner.resolve_atom(n).to_string())
                    .unwrap_or_default();
                let suffix = if named && !name.is_empty() {
                    format!(" {name}")
                } else {
                    String::new()
                };
                match param.kind {
                    ParamKind::Required => format!("{ty}{suffix}"),
                    ParamKind::Optional => format!("?{ty}{suffix}"),
                    ParamKind::Rest => format!("*{ty}{suffix}"),
                    ParamKind::Keyword => format!("{name}: {ty}"),
                    ParamKind::OptionalKeyword => format!("?{name}: {ty}"),
                    ParamKind::KeywordRest => format!("**{ty}{suffix}"),
                }
            })
            .collect();
        text.push_str(&format!("({})", params.join(", ")));
        if let Some(block) = shape.block {
            text.push_str(&self.print_block(block));
        }
        text.push_str(" -> ");
        text.push_str(&self.print_return(shape.return_type));
        text
    }

    /// A method's block, as ` { (A) -> R }`.
    fn print_block(&mut self, block: TypeId) -> String {
        let shape = match self.interner.lookup(block) {
            Some(TypeKey::Function(id)) => self.interner.function_shape(id),
            _ => None,
        };
        match shape {
            Some(shape) => format!(" {{ {} }}", self.print_function(&shape, false)),
            None => " { (*untyped) -> untyped }".to_string(),
        }
    }

    /// Return position: bare unions read ambiguously after `->` inside a
    /// block or proc, so they are parenthesized.
    fn print_return(&mut self, ty: TypeId) -> String {
        let text = self.print(ty);
        match self.interner.lookup(ty) {
            Some(TypeKey::Union(members)) if !(members.len() == 2 && members.contains(&TypeId::NIL)) => {
                format!("({text})")
            }
            Some(TypeKey::Intersection(_)) => format!("({text})"),
            _ => text,
        }
    }

    fn print_operand(&mut self, ty: TypeId) -> String {
        let text = self.print(ty);
        match self.interner.lookup(ty) {
            Some(TypeKey::Union(_) | TypeKey::Intersection(_) | TypeKey::Function(_)) => format!("({text})"),
            _ => text,
        }
    }

    fn print_literal(&self, value: &LiteralValue) -> String {
        match value {
            LiteralValue::String(atom) => format!("{:?}", &*self.interner.resolve_atom(*atom)),
            LiteralValue::Integer(n) => n.to_string(),
            LiteralValue::Float(atom) => self.interner.resolve_atom(*atom).to_string(),
            LiteralValue::Symbol(atom) => format!(":{}", self.interner.resolve_atom(*atom)),
            LiteralValue::Bool(b) => b.to_string(),
        }
    }
}

fn intrinsic_name(kind: IntrinsicKind) -> &'static str {
    match kind {
        IntrinsicKind::Error | IntrinsicKind::Any => "untyped",
        IntrinsicKind::Void => "void",
        IntrinsicKind::Never => "bot",
        IntrinsicKind::Nil => "nil",
        IntrinsicKind::SelfType => "self",
        IntrinsicKind::Boolean => "bool",
        IntrinsicKind::String => "String",
        IntrinsicKind::Integer => "Integer",
        IntrinsicKind::Float => "Float",
        IntrinsicKind::Symbol => "Symbol",
    }
}

/// RBS interface names start with an underscore: `Admin::Greeter` becomes
/// `Admin::_Greeter`.
pub fn interface_name(name: &str) -> String {
    match name.rsplit_once("::") {
        Some((namespace, last)) => format!("{namespace}::_{last}"),
        None => format!("_{name}"),
    }
}

/// RBS alias names are lowercase: `UserId` becomes `user_id`.
pub fn alias_name(name: &str) -> String {
    let (namespace, last) = match name.rsplit_once("::") {
        Some((namespace, last)) => (Some(namespace), last),
        None => (None, name),
    };
    let mut snake = String::with_capacity(last.len() + 4);
    let mut previous_lower = false;
    for ch in last.chars() {
        if ch.is_ascii_uppercase() {
            if previous_lower {
                snake.push('_');
            }
            snake.push(ch.to_ascii_lowercase());
            previous_lower = false;
        } else {
            previous_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            snake.push(ch);
        }
    }
    match namespace {
        Some(namespace) => format!("{namespace}::{snake}"),
        None => snake,
    }
}

#[cfg(test)]
#[path = "../../tests/rbs_type_tests.rs"]
mod rbs_type_tests;
