//! `case/in`, printed natively or lowered for targets without pattern
//! matching.
//!
//! Lowering evaluates the subject once into a temporary and turns every
//! `in` clause into a `when` whose condition tests the pattern with
//! `===`, `is_a?`, `length` and `key?`:
//!
//! ```ruby
//! case point
//! in [Integer => x, y] if x > 0
//!   x + y
//! end
//! ```
//!
//! becomes
//!
//! ```ruby
//! __case_subject_1 = point
//! case
//! when __case_subject_1.is_a?(Array) && __case_subject_1.length == 2 && Integer === __case_subject_1[0] && (x = __case_subject_1[0]; y = __case_subject_1[1]; true) && (x > 0)
//!   x + y
//! else
//!   raise NoMatchingPatternError, __case_subject_1.inspect
//! end
//! ```
//!
//! Bindings move into the condition only when a guard needs them;
//! otherwise they open the clause body.

use trc_parser::{Guard, HashPatternEntry, InClause, NodeIndex, NodeKind, Pattern, RestPattern};
use tracing::trace;

use super::RubyPrinter;

/// Tests and bindings for one pattern against one access path.
#[derive(Default)]
struct LoweredPattern {
    tests: Vec<String>,
    bindings: Vec<(String, String)>,
}

impl LoweredPattern {
    fn condition(&self) -> String {
        if self.tests.is_empty() {
            "true".to_string()
        } else {
            self.tests.join(" && ")
        }
    }
}

impl<'a> RubyPrinter<'a> {
    // =========================================================================
    // Native
    // =========================================================================

    pub(crate) fn emit_native_case_in(
        &mut self,
        subject: NodeIndex,
        clauses: &[InClause],
        else_branch: Option<&[NodeIndex]>,
        end: u32,
    ) {
        self.writer.write("case ");
        self.emit_expression(subject);
        self.writer.ensure_line();
        for (i, clause) in clauses.iter().enumerate() {
            self.writer.write("in ");
            self.write_pattern(&clause.pattern);
            if let Some(guard) = &clause.guard {
                self.writer.write(if guard.unless { " unless " } else { " if " });
                self.emit_expression(guard.condition);
            }
            let next = self.next_clause_pos(clauses, i, else_branch, end);
            self.emit_body(&clause.body, next);
        }
        if let Some(else_branch) = else_branch {
            self.writer.write("else");
            self.emit_body(else_branch, end);
        }
        self.writer.write("end");
    }

    fn next_clause_pos(&self, clauses: &[InClause], index: usize, else_branch: Option<&[NodeIndex]>, end: u32) -> u32 {
        clauses
            .get(index + 1)
            .map(|c| c.pos)
            .or_else(|| else_branch.and_then(|b| b.first()).map(|&e| self.arena.span(e).0))
            .unwrap_or(end)
    }

    fn write_pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Value(node) => self.emit_expression(*node),
            Pattern::Pin(node) => {
                self.writer.write("^");
                self.emit_expression(*node);
            }
            Pattern::Const { constant, sub } => {
                self.emit_expression(*constant);
                if let Some(sub) = sub {
                    self.writer.write("(");
                    match sub.as_ref() {
                        Pattern::Array { pre, rest, post } => self.write_array_items(pre, rest.as_ref(), post),
                        Pattern::Hash { entries, rest } => self.write_hash_items(entries, rest.as_ref()),
                        other => self.write_pattern(other),
                    }
                    self.writer.write(")");
                }
            }
            Pattern::Bind { name, .. } => self.writer.write(name),
            Pattern::Array { pre, rest, post } => {
                self.writer.write("[");
                self.write_array_items(pre, rest.as_ref(), post);
                self.writer.write("]");
            }
            Pattern::Hash { entries, rest } => {
                if entries.is_empty() && rest.is_none() {
                    self.writer.write("{}");
                    return;
                }
                self.writer.write("{ ");
                self.write_hash_items(entries, rest.as_ref());
                self.writer.write(" }");
            }
            Pattern::Alternatives(alternatives) => {
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        self.writer.write(" | ");
                    }
                    self.write_pattern(alternative);
                }
            }
            Pattern::Capture { pattern, name, .. } => {
                self.write_pattern(pattern);
                self.writer.write(" => ");
                self.writer.write(name);
            }
        }
    }

    fn write_array_items(&mut self, pre: &[Pattern], rest: Option<&RestPattern>, post: &[Pattern]) {
        let mut first = true;
        let mut separator = |printer: &mut Self| {
            if !first {
                printer.writer.write(", ");
            }
            first = false;
        };
        for pattern in pre {
            separator(self);
            self.write_pattern(pattern);
        }
        if let Some(rest) = rest {
            separator(self);
            self.writer.write("*");
            if let RestPattern::Named(name) = rest {
                self.writer.write(name);
            }
        }
        for pattern in post {
            separator(self);
            self.write_pattern(pattern);
        }
    }

    fn write_hash_items(&mut self, entries: &[HashPatternEntry], rest: Option<&RestPattern>) {
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                self.writer.write(", ");
            }
            self.writer.write(&entry.key);
            self.writer.write(":");
            if let Some(value) = &entry.value {
                self.writer.write_space();
                self.write_pattern(value);
            }
        }
        if let Some(rest) = rest {
            if !entries.is_empty() {
                self.writer.write(", ");
            }
            self.writer.write("**");
            match rest {
                RestPattern::Named(name) => self.writer.write(name),
                RestPattern::NoRest => self.writer.write("nil"),
                RestPattern::Anonymous => {}
            }
        }
    }

    // =========================================================================
    // Lowered
    // =========================================================================

    /// In expression position the temporary and the `case` are wrapped in
    /// `begin ... end` so the whole construct stays one expression.
    pub(crate) fn emit_lowered_case_in(
        &mut self,
        subject: NodeIndex,
        clauses: &[InClause],
        else_branch: Option<&[NodeIndex]>,
        end: u32,
        statement: bool,
    ) {
        let temp = self.next_temp("case_subject");
        trace!(temp = %temp, clauses = clauses.len(), "lowering case/in");
        if !statement {
            self.writer.write("begin");
            self.writer.write_line();
            self.writer.increase_indent();
        }
        self.writer.write(&temp);
        self.writer.write(" = ");
        self.emit_expression(subject);
        self.writer.write_line();
        self.writer.write("case");
        self.writer.write_line();

        for (i, clause) in clauses.iter().enumerate() {
            let mut lowered = LoweredPattern::default();
            self.lower_pattern(&clause.pattern, &temp, true, &mut lowered);
            self.writer.write("when ");
            let inline_bindings = clause.guard.is_some();
            self.write_clause_condition(&lowered, clause.guard.as_ref());

            let next = self.next_clause_pos(clauses, i, else_branch, end);
            self.writer.write_line();
            self.writer.increase_indent();
            if !inline_bindings {
                for (name, access) in &lowered.bindings {
                    self.writer.write(name);
                    self.writer.write(" = ");
                    self.writer.write(access);
                    self.writer.write_line();
                }
            }
            self.emit_statements(&clause.body);
            self.emit_comments_before(next);
            self.writer.decrease_indent();
            self.writer.ensure_line();
        }

        self.writer.write("else");
        match else_branch {
            Some(else_branch) => self.emit_body(else_branch, end),
            None => {
                self.writer.write_line();
                self.writer.increase_indent();
                let error = if self.target.has_no_matching_pattern_error() {
                    "NoMatchingPatternError"
                } else {
                    "ArgumentError"
                };
                self.writer.write(&format!("raise {error}, {temp}.inspect"));
                self.writer.write_line();
                self.writer.decrease_indent();
            }
        }
        self.writer.write("end");

        if !statement {
            self.writer.write_line();
            self.writer.decrease_indent();
            self.writer.write("end");
        }
    }

    fn write_clause_condition(&mut self, lowered: &LoweredPattern, guard: Option<&Guard>) {
        let Some(guard) = guard else {
            self.writer.write(&lowered.condition());
            return;
        };
        let mut parts = lowered.tests.clone();
        if !lowered.bindings.is_empty() {
            let assignments: Vec<String> = lowered
                .bindings
                .iter()
                .map(|(name, access)| format!("{name} = {access}"))
                .collect();
            parts.push(format!("({}; true)", assignments.join("; ")));
        }
        let condition = self.expression_text(guard.condition);
        parts.push(if guard.unless {
            format!("!({condition})")
        } else {
            format!("({condition})")
        });
        self.writer.write(&parts.join(" && "));
    }

    /// `check_type` is false under a constant, which has already tested the
    /// value's class.
    fn lower_pattern(&mut self, pattern: &Pattern, access: &str, check_type: bool, out: &mut LoweredPattern) {
        match pattern {
            Pattern::Value(node) | Pattern::Pin(node) => {
                let value = self.operand_text(*node);
                out.tests.push(format!("{value} === {access}"));
            }
            Pattern::Const { constant, sub } => {
                let constant_text = self.expression_text(*constant);
                out.tests.push(format!("{constant_text} === {access}"));
                let Some(sub) = sub else {
                    return;
                };
                match sub.as_ref() {
                    Pattern::Array { pre, rest, post } => {
                        let base = if constant_text == "Array" {
                            access.to_string()
                        } else {
                            format!("{access}.deconstruct")
                        };
                        self.lower_array(pre, rest.as_ref(), post, &base, false, out);
                    }
                    Pattern::Hash { entries, rest } => {
                        let base = if constant_text == "Hash" {
                            access.to_string()
                        } else {
                            format!("{access}.deconstruct_keys(nil)")
                        };
                        self.lower_hash(entries, rest.as_ref(), &base, false, out);
                    }
                    other => self.lower_pattern(other, access, false, out),
                }
            }
            Pattern::Bind { name, .. } => {
                if name != "_" {
                    out.bindings.push((name.clone(), access.to_string()));
                }
            }
            Pattern::Array { pre, rest, post } => {
                self.lower_array(pre, rest.as_ref(), post, access, check_type, out);
            }
            Pattern::Hash { entries, rest } => {
                self.lower_hash(entries, rest.as_ref(), access, check_type, out);
            }
            Pattern::Alternatives(alternatives) => {
                let conditions: Vec<String> = alternatives
                    .iter()
                    .map(|alternative| {
                        let mut lowered = LoweredPattern::default();
                        self.lower_pattern(alternative, access, check_type, &mut lowered);
                        lowered.condition()
                    })
                    .collect();
                out.tests.push(format!("({})", conditions.join(" || ")));
            }
            Pattern::Capture { pattern, name, .. } => {
                self.lower_pattern(pattern, access, check_type, out);
                out.bindings.push((name.clone(), access.to_string()));
            }
        }
    }

    fn lower_array(
        &mut self,
        pre: &[Pattern],
        rest: Option<&RestPattern>,
        post: &[Pattern],
        access: &str,
        check_type: bool,
        out: &mut LoweredPattern,
    ) {
        if check_type {
            out.tests.push(format!("{access}.is_a?(Array)"));
        }
        let fixed = pre.len() + post.len();
        out.tests.push(match rest {
            None => format!("{access}.length == {fixed}"),
            Some(_) => format!("{access}.length >= {fixed}"),
        });
        for (i, pattern) in pre.iter().enumerate() {
            self.lower_pattern(pattern, &format!("{access}[{i}]"), true, out);
        }
        if let Some(RestPattern::Named(name)) = rest {
            let slice = format!("{access}[{}..-{}]", pre.len(), post.len() + 1);
            out.bindings.push((name.clone(), slice));
        }
        for (i, pattern) in post.iter().enumerate() {
            let from_end = post.len() - i;
            self.lower_pattern(pattern, &format!("{access}[-{from_end}]"), true, out);
        }
    }

    fn lower_hash(
        &mut self,
        entries: &[HashPatternEntry],
        rest: Option<&RestPattern>,
        access: &str,
        check_type: bool,
        out: &mut LoweredPattern,
    ) {
        if check_type {
            out.tests.push(format!("{access}.is_a?(Hash)"));
        }
        for entry in entries {
            out.tests.push(format!("{access}.key?(:{})", entry.key));
            let value_access = format!("{access}[:{}]", entry.key);
            match &entry.value {
                Some(pattern) => self.lower_pattern(pattern, &value_access, true, out),
                None => out.bindings.push((entry.key.clone(), value_access)),
            }
        }
        match rest {
            Some(RestPattern::NoRest) => out.tests.push(format!("{access}.size == {}", entries.len())),
            Some(RestPattern::Named(name)) => {
                let keys: Vec<String> = entries.iter().map(|e| format!(":{}", e.key)).collect();
                let remaining = format!("{access}.reject {{ |key, _| [{}].include?(key) }}", keys.join(", "));
                out.bindings.push((name.clone(), remaining));
            }
            Some(RestPattern::Anonymous) | None => {}
        }
    }

    /// Expression text safe on the left of `===`.
    fn operand_text(&mut self, node: NodeIndex) -> String {
        let text = self.expression_text(node);
        match self.arena.kind(node) {
            Some(NodeKind::Range { .. } | NodeKind::Binary { .. } | NodeKind::Unary { .. }) => format!("({text})"),
            _ => text,
        }
    }
}
