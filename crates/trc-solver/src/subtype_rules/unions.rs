//! Union and intersection subtype checking.
//!
//! - A union source must have every member below the target.
//! - A union target needs the source below at least one member.
//! - An intersection target needs the source below every member.
//! - An intersection source needs one member below the target; an interface
//!   target may also be satisfied by the members together.

use crate::types::{TypeId, TypeKey};

use super::super::{SubtypeChecker, SubtypeResult, TypeResolver};

impl<'a, R: TypeResolver> SubtypeChecker<'a, R> {
    pub(crate) fn check_union_source(&mut self, members: &[TypeId], target: TypeId) -> SubtypeResult {
        let mut saw_cycle = false;
        for &member in members {
            match self.check_subtype(member, target) {
                SubtypeResult::False => return SubtypeResult::False,
                SubtypeResult::CycleDetected => saw_cycle = true,
                SubtypeResult::True => {}
            }
        }
        if saw_cycle {
            SubtypeResult::CycleDetected
        } else {
            SubtypeResult::True
        }
    }

    pub(crate) fn check_union_target(
        &mut self,
        source: TypeId,
        source_key: Option<&TypeKey>,
        members: &[TypeId],
    ) -> SubtypeResult {
        // `Boolean` fits a union that spells out both literals.
        if source == TypeId::BOOLEAN {
            let has_true = members.contains(&self.interner.literal_bool(true));
            let has_false = members.contains(&self.interner.literal_bool(false));
            if has_true && has_false {
                return SubtypeResult::True;
            }
        }
        // A literal whose primitive is a member is already covered below;
        // check it directly so the common case stays cheap.
        if let Some(TypeKey::Literal(value)) = source_key {
            if members.contains(&value.primitive()) {
                return SubtypeResult::True;
            }
        }
        for &member in members {
            let result = self.check_subtype(source, member);
            if result.is_true() {
                return result;
            }
        }
        SubtypeResult::False
    }

    pub(crate) fn check_intersection_target(&mut self, source: TypeId, members: &[TypeId]) -> SubtypeResult {
        for &member in members {
            if self.check_subtype(source, member).is_false() {
                return SubtypeResult::False;
            }
        }
        SubtypeResult::True
    }

    pub(crate) fn check_intersection_source(
        &mut self,
        source: TypeId,
        members: &[TypeId],
        target: TypeId,
        target_key: Option<&TypeKey>,
    ) -> SubtypeResult {
        for &member in members {
            let result = self.check_subtype(member, target);
            if result.is_true() {
                return result;
            }
        }
        if let Some(TypeKey::Interface(name)) = target_key {
            let name = *name;
            return self.guarded(source, target, |this| this.check_interface(source, name));
        }
        SubtypeResult::False
    }
}
