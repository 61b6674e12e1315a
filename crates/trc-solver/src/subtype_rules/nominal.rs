//! Nominal subtyping for class instances and class objects.
//!
//! A value's class is found from its type (primitives and literals use their
//! core class, records are `Hash`, procs are `Proc`), then the resolver's
//! ancestor list is searched for the target class. Type arguments are
//! compared covariantly; a missing argument list on either side matches
//! anything.

use trc_common::interner::Atom;

use crate::types::{TypeId, TypeKey};
use crate::visitor::instance_parts;

use super::super::{SubtypeChecker, SubtypeResult, TypeResolver};

impl<'a, R: TypeResolver> SubtypeChecker<'a, R> {
    pub(crate) fn check_instance(
        &mut self,
        source: TypeId,
        source_key: Option<&TypeKey>,
        target_name: Atom,
        target_args: &[TypeId],
    ) -> SubtypeResult {
        let target_text = self.interner.resolve_atom(target_name);
        if matches!(&*target_text, "Object" | "BasicObject") {
            return SubtypeResult::from_bool(source != TypeId::VOID && source != TypeId::SELF);
        }

        let (source_name, source_args) = match source_key {
            Some(TypeKey::Intrinsic(kind)) => match kind.class_name() {
                Some(name) => (self.interner.intern_string(name), Vec::new()),
                None => return SubtypeResult::False,
            },
            Some(TypeKey::Instance(name, args)) => (*name, args.clone()),
            Some(TypeKey::Record(fields)) => {
                if &*target_text == "Hash" {
                    let field_types: Vec<TypeId> = fields.iter().map(|f| f.ty).collect();
                    return self.check_record_as_hash(&field_types, target_args);
                }
                (self.interner.intern_string("Hash"), Vec::new())
            }
            Some(TypeKey::Function(_)) => (self.interner.intern_string("Proc"), Vec::new()),
            Some(TypeKey::Singleton(_)) => (self.interner.intern_string("Class"), Vec::new()),
            _ => return SubtypeResult::False,
        };

        if source_name == target_name {
            return self.check_type_arguments(&source_args, target_args);
        }
        for ancestor in self.resolver.ancestors(source_name, &source_args) {
            if let Some((name, args)) = instance_parts(self.interner, ancestor) {
                if name == target_name {
                    return self.check_type_arguments(&args, target_args);
                }
            }
        }
        SubtypeResult::False
    }

    pub(crate) fn check_singleton(&mut self, source_key: Option<&TypeKey>, target_name: Atom) -> SubtypeResult {
        let Some(TypeKey::Singleton(source_name)) = source_key else {
            return SubtypeResult::False;
        };
        if *source_name == target_name {
            return SubtypeResult::True;
        }
        let reaches = self
            .resolver
            .ancestors(*source_name, &[])
            .into_iter()
            .filter_map(|ancestor| instance_parts(self.interner, ancestor))
            .any(|(name, _)| name == target_name);
        SubtypeResult::from_bool(reaches)
    }

    fn check_type_arguments(&mut self, source_args: &[TypeId], target_args: &[TypeId]) -> SubtypeResult {
        if source_args.is_empty() || target_args.is_empty() {
            return SubtypeResult::True;
        }
        for (index, &target_arg) in target_args.iter().enumerate() {
            let source_arg = source_args.get(index).copied().unwrap_or(TypeId::ANY);
            if self.check_subtype(source_arg, target_arg).is_false() {
                return SubtypeResult::False;
            }
        }
        SubtypeResult::True
    }

    /// `{ k: V1, j: V2 } <: Hash<K, V>` when `Symbol <: K` and every field
    /// type is below `V`.
    fn check_record_as_hash(&mut self, field_types: &[TypeId], target_args: &[TypeId]) -> SubtypeResult {
        let key = target_args.first().copied().unwrap_or(TypeId::ANY);
        let value = target_args.get(1).copied().unwrap_or(TypeId::ANY);
        if self.check_subtype(TypeId::SYMBOL, key).is_false() {
            return SubtypeResult::False;
        }
        for &field in field_types {
            if self.check_subtype(field, value).is_false() {
                return SubtypeResult::False;
            }
        }
        SubtypeResult::True
    }
}
