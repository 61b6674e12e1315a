//! Structural subtyping: interfaces, records and function signatures.

use trc_common::interner::Atom;

use crate::types::{FunctionShapeId, ParamKind, RecordField, TypeId, TypeKey};

use super::super::{SubtypeChecker, SubtypeResult, TypeResolver};

impl<'a, R: TypeResolver> SubtypeChecker<'a, R> {
    /// A value satisfies an interface when it has every member with a
    /// compatible signature: same arity, invariant parameters, covariant
    /// return.
    pub(crate) fn check_interface(&mut self, source: TypeId, interface: Atom) -> SubtypeResult {
        if let Some(TypeKey::Interface(name)) = self.interner.lookup(source) {
            if name == interface {
                return SubtypeResult::True;
            }
        }
        let mut result = SubtypeResult::True;
        for (member, required) in self.resolver.interface_members(interface) {
            let Some(found) = self.resolver.find_method(source, member) else {
                return SubtypeResult::False;
            };
            if found.is_any_like() || required.is_any_like() {
                continue;
            }
            let (Some(TypeKey::Function(found_shape)), Some(TypeKey::Function(required_shape))) =
                (self.interner.lookup(found), self.interner.lookup(required))
            else {
                return SubtypeResult::False;
            };
            match self.check_function(found_shape, required_shape, true) {
                SubtypeResult::False => return SubtypeResult::False,
                SubtypeResult::CycleDetected => result = SubtypeResult::CycleDetected,
                SubtypeResult::True => {}
            }
        }
        result
    }

    /// Width and depth: every required target field must exist in the
    /// source with a subtype; an optional source field cannot fill a
    /// required one.
    pub(crate) fn check_record(&mut self, source: &[RecordField], target: &[RecordField]) -> SubtypeResult {
        for field in target {
            match source.iter().find(|s| s.name == field.name) {
                Some(found) => {
                    if found.optional && !field.optional {
                        return SubtypeResult::False;
                    }
                    if self.check_subtype(found.ty, field.ty).is_false() {
                        return SubtypeResult::False;
                    }
                }
                None if field.optional => {}
                None => return SubtypeResult::False,
            }
        }
        SubtypeResult::True
    }

    /// Compare two signatures. Member signatures of interfaces compare
    /// parameters invariantly; proc values compare them contravariantly.
    pub(crate) fn check_function(
        &mut self,
        source: FunctionShapeId,
        target: FunctionShapeId,
        invariant_params: bool,
    ) -> SubtypeResult {
        if source == target {
            return SubtypeResult::True;
        }
        let (Some(source), Some(target)) = (
            self.interner.function_shape(source),
            self.interner.function_shape(target),
        ) else {
            return SubtypeResult::False;
        };
        if source.required_positional() != target.required_positional()
            || source.max_positional() != target.max_positional()
        {
            return SubtypeResult::False;
        }

        let source_positional = source.params.iter().filter(|p| p.kind.is_positional());
        let target_positional = target.params.iter().filter(|p| p.kind.is_positional());
        for (s, t) in source_positional.zip(target_positional) {
            if !self.parameter_compatible(s.ty, t.ty, invariant_params) {
                return SubtypeResult::False;
            }
        }

        let source_has_keyword_rest = source.params.iter().any(|p| p.kind == ParamKind::KeywordRest);
        for t in target.params.iter().filter(|p| p.kind.is_keyword() && p.kind != ParamKind::KeywordRest) {
            match source.params.iter().find(|s| s.kind.is_keyword() && s.name == t.name) {
                Some(s) => {
                    if !self.parameter_compatible(s.ty, t.ty, invariant_params) {
                        return SubtypeResult::False;
                    }
                }
                None if source_has_keyword_rest => {}
                None => return SubtypeResult::False,
            }
        }
        let target_names: Vec<_> = target.params.iter().filter(|p| p.kind.is_keyword()).map(|p| p.name).collect();
        let target_has_keyword_rest = target.params.iter().any(|p| p.kind == ParamKind::KeywordRest);
        for s in source.params.iter().filter(|p| p.kind == ParamKind::Keyword) {
            if !target_names.contains(&s.name) && !target_has_keyword_rest {
                return SubtypeResult::False;
            }
        }

        self.check_subtype(source.return_type, target.return_type)
    }

    fn parameter_compatible(&mut self, source: TypeId, target: TypeId, invariant: bool) -> bool {
        if invariant {
            self.types_equivalent(source, target)
        } else {
            self.check_subtype(target, source).is_true()
        }
    }
}
