//! Error reporting (`error_*` for type errors, `report_*` for strictness
//! checks and hints).
//!
//! Every diagnostic goes through [`ErrorReporter`], which stops recording
//! errors once the per-file limit is reached but keeps counting them.

use trc_common::diagnostics::{Diagnostic, DiagnosticCategory, diagnostic_codes};
use trc_common::options::CheckName;
use trc_common::position::LineMap;
use trc_parser::NodeIndex;
use trc_solver::{TypeId, contains_nil};

use crate::state::CheckerState;

pub(crate) struct ErrorReporter {
    file_name: String,
    max_errors: usize,
    /// Off while inferring a method of another file or a speculative body.
    enabled: bool,
    error_count: usize,
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReporter {
    pub(crate) fn new(file_name: &str, max_errors: usize, enabled: bool) -> Self {
        ErrorReporter {
            file_name: file_name.to_string(),
            max_errors,
            enabled,
            error_count: 0,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn file_name(&self) -> &str {
        &self.file_name
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn reporting on or off, returning the previous setting.
    pub(crate) fn set_enabled(&mut self, enabled: bool) -> bool {
        std::mem::replace(&mut self.enabled, enabled)
    }

    pub(crate) fn push(&mut self, mut diagnostic: Diagnostic, line_map: &LineMap) {
        if !self.enabled {
            return;
        }
        let duplicate = self.diagnostics.iter().any(|d| {
            d.code == diagnostic.code && d.start == diagnostic.start && d.length == diagnostic.length
        });
        if duplicate {
            return;
        }
        if diagnostic.is_error() {
            self.error_count += 1;
            if self.max_errors > 0 && self.error_count > self.max_errors {
                return;
            }
        }
        diagnostic.locate(line_map);
        self.diagnostics.push(diagnostic);
    }

    /// Errors found, including those past the reporting limit.
    pub(crate) fn error_count(&self) -> usize {
        self.error_count
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Emission
    // =========================================================================

    fn emit(&mut self, code: u32, pos: u32, end: u32, args: &[&str], category: Option<DiagnosticCategory>) {
        let file_name = self.ctx.reporter.file_name().to_string();
        let mut diagnostic = Diagnostic::from_code(code, file_name, pos, end.saturating_sub(pos), args);
        if let Some(category) = category {
            diagnostic = diagnostic.with_category(category);
        }
        self.ctx.reporter.push(diagnostic, &self.ctx.file.line_map);
    }

    pub(crate) fn error_at_node(&mut self, node: NodeIndex, code: u32, args: &[&str]) {
        let (pos, end) = self.ctx.file.arena.span(node);
        self.emit(code, pos, end, args, None);
    }

    pub(crate) fn error_at_span(&mut self, pos: u32, end: u32, code: u32, args: &[&str]) {
        self.emit(code, pos, end, args, None);
    }

    /// Report a strictness check at the severity the configuration gives it.
    /// Does nothing when the check is off.
    pub(crate) fn report_check(&mut self, check: CheckName, pos: u32, end: u32, code: u32, args: &[&str]) {
        let Some(category) = self.ctx.options.strictness.severity(check) else {
            return;
        };
        self.emit(code, pos, end, args, Some(category));
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.ctx.reporter.push(diagnostic, &self.ctx.file.line_map);
    }

    // =========================================================================
    // Type errors
    // =========================================================================

    /// `value` of type `source` flows into a slot of type `target`.
    ///
    /// An unguarded `Array#[]` / `Hash#[]` result is reported as an unsafe
    /// indexed access rather than a plain mismatch.
    pub(crate) fn error_not_assignable(&mut self, value: NodeIndex, source: TypeId, target: TypeId) {
        let (pos, end) = self.ctx.file.arena.span(value);
        if self.is_unchecked_index(value) && contains_nil(self.ctx.interner, source) {
            let text = self.ctx.file.node_text(value).to_string();
            let target = self.format_type(target);
            self.report_check(
                CheckName::NoUncheckedIndexedAccess,
                pos,
                end,
                diagnostic_codes::UNSAFE_INDEXED_ACCESS,
                &[&text, &target],
            );
        } else {
            let source = self.format_type(source);
            let target = self.format_type(target);
            self.emit(diagnostic_codes::TYPE_NOT_ASSIGNABLE, pos, end, &[&source, &target], None);
        }
        self.retype_on_error(value);
    }

    pub(crate) fn error_argument_not_assignable(
        &mut self,
        arg: NodeIndex,
        source: TypeId,
        param: &str,
        target: TypeId,
    ) {
        if self.is_unchecked_index(arg) && contains_nil(self.ctx.interner, source) {
            self.error_not_assignable(arg, source, target);
            return;
        }
        let source = self.format_type(source);
        let target = self.format_type(target);
        self.error_at_node(arg, diagnostic_codes::ARGUMENT_NOT_ASSIGNABLE, &[&source, param, &target]);
        self.retype_on_error(arg);
    }

    pub(crate) fn error_undefined_method(&mut self, pos: u32, end: u32, name: &str, receiver: TypeId) {
        let receiver = self.format_type(receiver);
        self.emit(diagnostic_codes::UNDEFINED_METHOD, pos, end, &[name, &receiver], None);
    }

    /// A method called on a value that may be nil. Unguarded indexed
    /// accesses report under `no_unchecked_indexed_access`, everything else
    /// under `strict_nil`.
    pub(crate) fn error_possibly_nil_receiver(
        &mut self,
        receiver_node: NodeIndex,
        pos: u32,
        end: u32,
        name: &str,
        receiver: TypeId,
    ) {
        let check = if self.is_unchecked_index(receiver_node) {
            CheckName::NoUncheckedIndexedAccess
        } else {
            CheckName::StrictNil
        };
        let receiver = self.format_type(receiver);
        self.report_check(check, pos, end, diagnostic_codes::METHOD_ON_POSSIBLY_NIL, &[name, &receiver]);
    }

    pub(crate) fn error_argument_count(&mut self, pos: u32, end: u32, expected: &str, found: usize) {
        let found = found.to_string();
        self.emit(diagnostic_codes::WRONG_ARGUMENT_COUNT, pos, end, &[expected, &found], None);
    }

    pub(crate) fn report_dynamic_dispatch(&mut self, pos: u32, end: u32, name: &str) {
        self.emit(diagnostic_codes::DYNAMIC_DISPATCH, pos, end, &[name], None);
    }

    /// With `allow_errors`, the node at a mismatch continues as `Any`.
    fn retype_on_error(&mut self, node: NodeIndex) {
        if self.ctx.options.allow_errors {
            self.ctx.types.node_types.insert(node, TypeId::ANY);
        }
    }
}
