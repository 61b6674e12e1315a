//! Type representation.
//!
//! Types are interned: a [`TypeId`] is a handle into the [`TypeInterner`],
//! and two types are equal exactly when their handles are equal. The
//! structure behind a handle is a [`TypeKey`].
//!
//! [`TypeInterner`]: crate::TypeInterner

use serde::Serialize;
use trc_common::interner::Atom;

/// Interned type handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Internal error sentinel. Behaves like `ANY` and prints as `untyped`;
    /// used where a diagnostic has already been reported.
    pub const ERROR: TypeId = TypeId(0);
    pub const ANY: TypeId = TypeId(1);
    pub const VOID: TypeId = TypeId(2);
    pub const NEVER: TypeId = TypeId(3);
    pub const NIL: TypeId = TypeId(4);
    pub const STRING: TypeId = TypeId(5);
    pub const INTEGER: TypeId = TypeId(6);
    pub const FLOAT: TypeId = TypeId(7);
    pub const BOOLEAN: TypeId = TypeId(8);
    pub const SYMBOL: TypeId = TypeId(9);
    /// The enclosing class's instance type; substituted at call sites.
    pub const SELF: TypeId = TypeId(10);

    /// First id handed out for non-intrinsic types.
    pub const FIRST_USER: u32 = 100;

    pub fn is_intrinsic(self) -> bool {
        self.0 < Self::FIRST_USER
    }

    /// `ANY` or `ERROR`: the gradual escape hatch.
    pub fn is_any_like(self) -> bool {
        self == Self::ANY || self == Self::ERROR
    }

    /// A primitive value type: one of the core classes with an intrinsic id.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::NIL | Self::STRING | Self::INTEGER | Self::FLOAT | Self::BOOLEAN | Self::SYMBOL
        )
    }
}

/// Built-in types with a fixed id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IntrinsicKind {
    Error,
    Any,
    Void,
    Never,
    Nil,
    String,
    Integer,
    Float,
    Boolean,
    Symbol,
    SelfType,
}

impl IntrinsicKind {
    pub const ALL: [IntrinsicKind; 11] = [
        IntrinsicKind::Error,
        IntrinsicKind::Any,
        IntrinsicKind::Void,
        IntrinsicKind::Never,
        IntrinsicKind::Nil,
        IntrinsicKind::String,
        IntrinsicKind::Integer,
        IntrinsicKind::Float,
        IntrinsicKind::Boolean,
        IntrinsicKind::Symbol,
        IntrinsicKind::SelfType,
    ];

    pub fn type_id(self) -> TypeId {
        match self {
            IntrinsicKind::Error => TypeId::ERROR,
            IntrinsicKind::Any => TypeId::ANY,
            IntrinsicKind::Void => TypeId::VOID,
            IntrinsicKind::Never => TypeId::NEVER,
            IntrinsicKind::Nil => TypeId::NIL,
            IntrinsicKind::String => TypeId::STRING,
            IntrinsicKind::Integer => TypeId::INTEGER,
            IntrinsicKind::Float => TypeId::FLOAT,
            IntrinsicKind::Boolean => TypeId::BOOLEAN,
            IntrinsicKind::Symbol => TypeId::SYMBOL,
            IntrinsicKind::SelfType => TypeId::SELF,
        }
    }

    /// Name of the core class backing a primitive.
    pub fn class_name(self) -> Option<&'static str> {
        match self {
            IntrinsicKind::Nil => Some("NilClass"),
            IntrinsicKind::String => Some("String"),
            IntrinsicKind::Integer => Some("Integer"),
            IntrinsicKind::Float => Some("Float"),
            IntrinsicKind::Boolean => Some("Boolean"),
            IntrinsicKind::Symbol => Some("Symbol"),
            _ => None,
        }
    }
}

/// Value of a literal type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum LiteralValue {
    String(Atom),
    Integer(i64),
    /// Source text; floats are compared textually.
    Float(Atom),
    Symbol(Atom),
    Bool(bool),
}

impl LiteralValue {
    /// The primitive a literal widens to.
    pub fn primitive(&self) -> TypeId {
        match self {
            LiteralValue::String(_) => TypeId::STRING,
            LiteralValue::Integer(_) => TypeId::INTEGER,
            LiteralValue::Float(_) => TypeId::FLOAT,
            LiteralValue::Symbol(_) => TypeId::SYMBOL,
            LiteralValue::Bool(_) => TypeId::BOOLEAN,
        }
    }
}

/// Interned function shape handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionShapeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ParamKind {
    Required,
    Optional,
    Rest,
    Keyword,
    OptionalKeyword,
    KeywordRest,
}

impl ParamKind {
    pub fn is_positional(self) -> bool {
        matches!(self, ParamKind::Required | ParamKind::Optional | ParamKind::Rest)
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            ParamKind::Keyword | ParamKind::OptionalKeyword | ParamKind::KeywordRest
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ParamInfo {
    pub name: Option<Atom>,
    pub ty: TypeId,
    pub kind: ParamKind,
}

impl ParamInfo {
    pub fn unnamed(ty: TypeId) -> Self {
        ParamInfo {
            name: None,
            ty,
            kind: ParamKind::Required,
        }
    }
}

/// A method signature or proc type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionShape {
    pub type_params: Vec<Atom>,
    pub params: Vec<ParamInfo>,
    pub return_type: TypeId,
    /// Type of the block parameter (a proc type), when the signature takes one.
    pub block: Option<TypeId>,
}

impl FunctionShape {
    pub fn new(params: Vec<ParamInfo>, return_type: TypeId) -> Self {
        FunctionShape {
            type_params: Vec::new(),
            params,
            return_type,
            block: None,
        }
    }

    /// Number of positional arguments that must be supplied.
    pub fn required_positional(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::Required)
            .count()
    }

    /// Maximum positional arguments, or `None` with a rest parameter.
    pub fn max_positional(&self) -> Option<usize> {
        if self.params.iter().any(|p| p.kind == ParamKind::Rest) {
            return None;
        }
        Some(
            self.params
                .iter()
                .filter(|p| matches!(p.kind, ParamKind::Required | ParamKind::Optional))
                .count(),
        )
    }

    pub fn has_keywords(&self) -> bool {
        self.params.iter().any(|p| p.kind.is_keyword())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RecordField {
    pub name: Atom,
    pub ty: TypeId,
    pub optional: bool,
}

/// Structure of an interned type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKey {
    Intrinsic(IntrinsicKind),
    Literal(LiteralValue),
    /// Normalized: flat, deduplicated, sorted, at least two members.
    Union(Vec<TypeId>),
    /// Normalized like unions.
    Intersection(Vec<TypeId>),
    /// Instance of a class or module, with type arguments (`Array<T>`).
    Instance(Atom, Vec<TypeId>),
    /// The class object itself.
    Singleton(Atom),
    /// A structural interface, looked up by name.
    Interface(Atom),
    /// Hash literal type `{ name: String }`.
    Record(Vec<RecordField>),
    /// Proc type or method signature.
    Function(FunctionShapeId),
    /// A generic parameter of a class or method.
    TypeParam(Atom),
}
