//! `case/in` pattern matching.
//!
//! Each clause binds its pattern's names against the subject type and
//! narrows the subject itself when the pattern names a class. A `case/in`
//! without `else` raises `NoMatchingPatternError` on no match, so it never
//! produces `nil` on its own.

use trc_parser::{InClause, NodeIndex, Pattern, RestPattern};
use trc_solver::{
    TypeId, array_element_type, hash_key_value_types, narrow_to_type, record_fields, widen_literal,
};

use crate::state::CheckerState;
use crate::statements::merge_branch_facts;

impl<'a> CheckerState<'a> {
    pub(crate) fn check_case_in(
        &mut self,
        subject: NodeIndex,
        clauses: &[InClause],
        else_branch: Option<&[NodeIndex]>,
    ) -> TypeId {
        let subject_ty = self.check_expr(subject);
        let subject_key = self.reference_key(subject);
        let before = self.ctx.facts.clone();
        let mut branches = Vec::with_capacity(clauses.len() + 1);

        for clause in clauses {
            self.ctx.facts = before.clone();
            let narrowed = self.bind_pattern(&clause.pattern, subject_ty, clause.pos);
            if let Some(key) = &subject_key
                && narrowed != subject_ty
            {
                self.ctx.facts.set(key.clone(), narrowed);
            }
            if let Some(guard) = &clause.guard {
                self.check_expr(guard.condition);
                self.assume_condition(guard.condition, !guard.unless);
            }
            let ty = self.check_statements(&clause.body);
            branches.push((ty, std::mem::take(&mut self.ctx.facts)));
        }
        if let Some(body) = else_branch {
            self.ctx.facts = before.clone();
            let ty = self.check_statements(body);
            branches.push((ty, std::mem::take(&mut self.ctx.facts)));
        }

        let ty = self.ctx.interner.union(branches.iter().map(|(ty, _)| *ty).collect());
        self.ctx.facts = merge_branch_facts(before, branches);
        ty
    }

    /// Bind the names in `pattern` for a value of type `ty` and return the
    /// type the value has when the pattern matches. `pos` locates names
    /// that carry no position of their own (`*rest`).
    fn bind_pattern(&mut self, pattern: &Pattern, ty: TypeId, pos: u32) -> TypeId {
        let interner = self.ctx.interner;
        match pattern {
            Pattern::Value(node) => {
                let value_ty = self.check_expr(*node);
                if value_ty == TypeId::NIL { TypeId::NIL } else { ty }
            }
            Pattern::Pin(node) => {
                self.check_expr(*node);
                ty
            }
            Pattern::Const { constant, sub } => {
                self.check_expr(*constant);
                let narrowed = match self.class_instance_for_constant(*constant) {
                    Some(target) => narrow_to_type(interner, self.ctx.table, ty, target),
                    None => ty,
                };
                if let Some(sub) = sub {
                    self.bind_pattern(sub, narrowed, pos);
                }
                narrowed
            }
            Pattern::Bind { name, pos } => {
                self.bind_pattern_local(name, *pos, ty);
                ty
            }
            Pattern::Array { pre, rest, post } => {
                let element = array_element_type(interner, ty).unwrap_or(TypeId::ANY);
                for sub in pre.iter().chain(post) {
                    self.bind_pattern(sub, element, pos);
                }
                if let Some(RestPattern::Named(name)) = rest {
                    self.bind_pattern_local(name, pos, interner.array(element));
                }
                ty
            }
            Pattern::Hash { entries, rest } => {
                for entry in entries {
                    let field_ty = self.pattern_field_type(ty, &entry.key);
                    match &entry.value {
                        Some(sub) => {
                            self.bind_pattern(sub, field_ty, entry.pos);
                        }
                        None => self.bind_pattern_local(&entry.key, entry.pos, field_ty),
                    }
                }
                if let Some(RestPattern::Named(name)) = rest {
                    let value_ty = hash_key_value_types(interner, ty).map_or(TypeId::ANY, |(_, value)| value);
                    self.bind_pattern_local(name, pos, interner.hash(TypeId::SYMBOL, value_ty));
                }
                ty
            }
            Pattern::Alternatives(alternatives) => {
                let narrowed = alternatives
                    .iter()
                    .map(|alternative| self.bind_pattern(alternative, ty, pos))
                    .collect();
                interner.union(narrowed)
            }
            Pattern::Capture { pattern, name, pos } => {
                let narrowed = self.bind_pattern(pattern, ty, *pos);
                self.bind_pattern_local(name, *pos, narrowed);
                narrowed
            }
        }
    }

    /// Type under `key:` in a hash pattern: the record field, the hash's
    /// value type, or `Any`.
    fn pattern_field_type(&self, ty: TypeId, key: &str) -> TypeId {
        let interner = self.ctx.interner;
        if let Some(fields) = record_fields(interner, ty) {
            let key = self.atom(key);
            return match fields.iter().find(|field| field.name == key) {
                Some(field) if field.optional => interner.optional(field.ty),
                Some(field) => field.ty,
                None => TypeId::ANY,
            };
        }
        hash_key_value_types(interner, ty).map_or(TypeId::ANY, |(_, value)| value)
    }

    fn bind_pattern_local(&mut self, name: &str, pos: u32, ty: TypeId) {
        let interner = self.ctx.interner;
        self.ctx.facts.kill(name);
        match self.ctx.scopes.lookup(name) {
            Some(id) => {
                let declared = self.ctx.scopes.get(id).and_then(|symbol| symbol.declared);
                if declared.is_none() {
                    let widened = widen_literal(interner, ty);
                    if let Some(symbol) = self.ctx.scopes.get_mut(id) {
                        symbol.ty = interner.union2(symbol.ty, widened);
                    }
                    self.ctx.facts.set(name.to_string(), widened);
                }
            }
            None => {
                let end = pos + name.len() as u32;
                self.declare_local(name, None, widen_literal(interner, ty), (pos, end), false);
            }
        }
    }
}
