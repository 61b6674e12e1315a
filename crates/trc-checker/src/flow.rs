//! Flow narrowing.
//!
//! A fact maps a reference expression (a local, an ivar, an index
//! expression or an argument-less call chain) to the type it has inside a
//! guarded branch. References are keyed by a normalized rendering of the
//! expression, so `users[0]` in a condition and `users[0]` in the branch
//! body share a key.
//!
//! Facts live for one branch and are discarded at the join, except when
//! the other branch always exits. Assigning to a variable kills every fact
//! whose key mentions it.

use rustc_hash::FxHashMap;
use trc_parser::{BinaryOp, NodeArena, NodeIndex, NodeKind, UnaryOp};
use trc_solver::{TypeId, exclude_type, falsy_type, narrow_to_type, remove_nil, truthy_type};

use crate::state::CheckerState;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct FlowFacts {
    facts: FxHashMap<String, TypeId>,
}

impl FlowFacts {
    pub(crate) fn get(&self, key: &str) -> Option<TypeId> {
        self.facts.get(key).copied()
    }

    pub(crate) fn set(&mut self, key: String, ty: TypeId) {
        self.facts.insert(key, ty);
    }

    /// Forget every fact that depends on the value of `name`.
    pub(crate) fn kill(&mut self, name: &str) {
        self.facts.retain(|key, _| !mentions(key, name));
    }

    /// Facts that hold after both branches: the ones both agree on.
    pub(crate) fn join(&self, other: &FlowFacts) -> FlowFacts {
        let facts = self
            .facts
            .iter()
            .filter(|(key, ty)| other.facts.get(*key) == Some(*ty))
            .map(|(key, ty)| (key.clone(), *ty))
            .collect();
        FlowFacts { facts }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '@' | '$' | '?' | '!')
}

/// Whether `key` reads the variable `name` (not a method of that name).
pub(crate) fn mentions(key: &str, name: &str) -> bool {
    let variable = name.starts_with('@') || name.starts_with('$');
    let mut search = 0;
    while let Some(offset) = key[search..].find(name) {
        let start = search + offset;
        let end = start + name.len();
        let before = key[..start].chars().next_back();
        let after = key[end..].chars().next();
        let starts_word = match before {
            None => true,
            Some('.') => variable,
            Some(c) => !is_name_char(c),
        };
        let ends_word = after.is_none_or(|c| !is_name_char(c));
        if starts_word && ends_word {
            return true;
        }
        search = end;
    }
    false
}

/// Key of a reference expression, `None` for anything else.
pub(crate) fn reference_key(arena: &NodeArena, source: &str, node: NodeIndex) -> Option<String> {
    match arena.kind(node)? {
        NodeKind::Identifier { name }
        | NodeKind::InstanceVar { name }
        | NodeKind::ClassVar { name }
        | NodeKind::GlobalVar { name } => Some(name.clone()),
        NodeKind::SelfRef => Some("self".to_string()),
        NodeKind::Paren { statements } if statements.len() == 1 => {
            reference_key(arena, source, statements[0])
        }
        NodeKind::Index { receiver, args } => {
            let base = reference_key(arena, source, *receiver)?;
            let mut key = base;
            key.push('[');
            for (i, &arg) in args.iter().enumerate() {
                if i > 0 {
                    key.push(',');
                }
                key.push_str(&argument_key(arena, source, arg)?);
            }
            key.push(']');
            Some(key)
        }
        NodeKind::Call(call) if call.args.is_empty() && call.block.is_none() && call.receiver.is_some() => {
            let base = reference_key(arena, source, call.receiver)?;
            let dot = if call.safe_nav { "&." } else { "." };
            Some(format!("{base}{dot}{}", call.method))
        }
        _ => None,
    }
}

/// Index arguments must be literals or references to form a key.
fn argument_key(arena: &NodeArena, source: &str, node: NodeIndex) -> Option<String> {
    match arena.kind(node)? {
        NodeKind::Integer { .. }
        | NodeKind::Float { .. }
        | NodeKind::Symbol { .. }
        | NodeKind::Nil
        | NodeKind::True
        | NodeKind::False
        | NodeKind::Str { .. } => {
            let (pos, end) = arena.span(node);
            let text = source.get(pos as usize..end as usize)?;
            Some(text.split_whitespace().collect())
        }
        _ => reference_key(arena, source, node),
    }
}

fn is_nil_literal(arena: &NodeArena, node: NodeIndex) -> bool {
    matches!(arena.kind(node), Some(NodeKind::Nil))
}

impl<'a> CheckerState<'a> {
    pub(crate) fn reference_key(&self, node: NodeIndex) -> Option<String> {
        reference_key(&self.ctx.file.arena, &self.ctx.file.source, node)
    }

    /// The narrowed type of a reference, if a fact covers it.
    pub(crate) fn fact_for(&self, node: NodeIndex) -> Option<TypeId> {
        let key = self.reference_key(node)?;
        self.ctx.facts.get(&key)
    }

    /// Make `condition` (already checked) hold, or fail, for the code that
    /// follows: add the facts it implies.
    pub(crate) fn assume_condition(&mut self, condition: NodeIndex, holds: bool) {
        for (key, ty) in self.condition_facts(condition, holds) {
            self.ctx.facts.set(key, ty);
        }
    }

    fn condition_facts(&self, condition: NodeIndex, holds: bool) -> Vec<(String, TypeId)> {
        let arena = &self.ctx.file.arena;
        let Some(kind) = arena.kind(condition) else {
            return Vec::new();
        };
        match kind {
            NodeKind::Paren { statements } if statements.len() == 1 => {
                self.condition_facts(statements[0], holds)
            }
            NodeKind::Unary {
                op: UnaryOp::Not | UnaryOp::NotWord,
                operand,
            } => self.condition_facts(*operand, !holds),
            NodeKind::Binary { op, left, right } => match op {
                // Both sides hold only when `a && b` holds; both fail only
                // when `a || b` fails.
                BinaryOp::And | BinaryOp::AndWord if holds => {
                    let mut facts = self.condition_facts(*left, true);
                    facts.extend(self.condition_facts(*right, true));
                    facts
                }
                BinaryOp::Or | BinaryOp::OrWord if !holds => {
                    let mut facts = self.condition_facts(*left, false);
                    facts.extend(self.condition_facts(*right, false));
                    facts
                }
                BinaryOp::Eq | BinaryOp::NotEq => {
                    let subject = if is_nil_literal(arena, *right) {
                        *left
                    } else if is_nil_literal(arena, *left) {
                        *right
                    } else {
                        return Vec::new();
                    };
                    let is_nil = holds == (*op == BinaryOp::Eq);
                    self.nil_fact(subject, is_nil).into_iter().collect()
                }
                _ => Vec::new(),
            },
            NodeKind::Call(call) if call.receiver.is_some() => match call.method.as_str() {
                "nil?" if call.args.is_empty() => self.nil_fact(call.receiver, holds).into_iter().collect(),
                "is_a?" | "kind_of?" | "instance_of?" if call.args.len() == 1 => self
                    .class_fact(call.receiver, call.args[0], holds)
                    .into_iter()
                    .collect(),
                _ => self.truthiness_fact(condition, holds).into_iter().collect(),
            },
            _ => self.truthiness_fact(condition, holds).into_iter().collect(),
        }
    }

    fn current_type(&self, node: NodeIndex) -> Option<TypeId> {
        self.ctx.types.node_type(node)
    }

    fn truthiness_fact(&self, node: NodeIndex, holds: bool) -> Option<(String, TypeId)> {
        let key = self.reference_key(node)?;
        let current = self.current_type(node)?;
        let interner = self.ctx.interner;
        let narrowed = if holds {
            truthy_type(interner, current)
        } else {
            falsy_type(interner, current)
        };
        Some((key, narrowed))
    }

    fn nil_fact(&self, node: NodeIndex, is_nil: bool) -> Option<(String, TypeId)> {
        let key = self.reference_key(node)?;
        let current = self.current_type(node)?;
        let narrowed = if is_nil {
            TypeId::NIL
        } else {
            remove_nil(self.ctx.interner, current)
        };
        Some((key, narrowed))
    }

    fn class_fact(&self, node: NodeIndex, class_node: NodeIndex, holds: bool) -> Option<(String, TypeId)> {
        let key = self.reference_key(node)?;
        let current = self.current_type(node)?;
        let target = self.class_instance_for_constant(class_node)?;
        let (interner, table) = (self.ctx.interner, self.ctx.table);
        let narrowed = if holds {
            narrow_to_type(interner, table, current, target)
        } else {
            exclude_type(interner, table, current, target)
        };
        Some((key, narrowed))
    }

    /// `case subject when Foo, Bar` narrows `subject` to `Foo | Bar`.
    pub(crate) fn assume_when_classes(&mut self, subject: NodeIndex, values: &[NodeIndex]) {
        let Some(key) = self.reference_key(subject) else {
            return;
        };
        let Some(current) = self.current_type(subject) else {
            return;
        };
        let mut targets = Vec::with_capacity(values.len());
        for &value in values {
            match self.class_instance_for_constant(value) {
                Some(target) => targets.push(target),
                None => return,
            }
        }
        let target = self.ctx.interner.union(targets);
        let narrowed = narrow_to_type(self.ctx.interner, self.ctx.table, current, target);
        self.ctx.facts.set(key, narrowed);
    }

    /// An assignment to `target` invalidates what was known about it.
    pub(crate) fn kill_facts_for_target(&mut self, target: NodeIndex) {
        let name = match self.ctx.file.arena.kind(target) {
            Some(
                NodeKind::Identifier { name }
                | NodeKind::InstanceVar { name }
                | NodeKind::ClassVar { name }
                | NodeKind::GlobalVar { name },
            ) => name.clone(),
            _ => {
                if let Some(key) = self.reference_key(target) {
                    self.ctx.facts.kill(&key);
                }
                return;
            }
        };
        self.ctx.facts.kill(&name);
    }
}

#[cfg(test)]
#[path = "../tests/flow_tests.rs"]
mod flow_tests;
