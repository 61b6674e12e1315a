//! Type algebra for typed Ruby.
//!
//! - **Interning**: every type is a [`TypeId`] handle; structurally equal
//!   types share a handle, so equality and hashing are O(1).
//! - **Normalization**: unions and intersections are flattened, deduplicated
//!   and sorted when built.
//! - **Subtyping**: nominal for classes, structural for interfaces and
//!   records, gradual (`Any`-aware) for the checker.
//! - **Narrowing helpers**: the type operations behind flow-sensitive
//!   refinement and branch joins.

mod format;
mod instantiate;
mod intern;
pub mod narrowing;
pub mod recursion;
mod subtype;
mod subtype_rules;
pub mod types;
pub mod visitor;

pub use format::TypeFormatter;
pub use instantiate::{TypeInstantiator, TypeSubstitution, instantiate_type, substitute_self_type};
pub use intern::TypeInterner;
pub use narrowing::{
    exclude_type, falsy_type, narrow_to_type, remove_nil, truthy_type, widen, widen_literal,
};
pub use subtype::{
    AnyPropagationMode, NoopResolver, SubtypeChecker, SubtypeResult, TypeResolver,
    is_assignable_to, is_subtype_of,
};
pub use types::{
    FunctionShape, FunctionShapeId, IntrinsicKind, LiteralValue, ParamInfo, ParamKind,
    RecordField, TypeId, TypeKey,
};
pub use visitor::{
    array_element_type, class_name_of, contains_nil, function_shape_of, hash_key_value_types,
    instance_parts, interface_name, is_union_type, literal_value, record_fields, union_members,
};

/// Render a type for a diagnostic message.
pub fn format_type(interner: &TypeInterner, ty: TypeId) -> String {
    TypeFormatter::new(interner).format(ty)
}
