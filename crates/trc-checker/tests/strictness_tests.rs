use std::sync::Arc;

use trc_binder::{FileId, bind_program};
use trc_checker::{CheckResult, check_file};
use trc_common::diagnostics::{DiagnosticCategory, diagnostic_codes};
use trc_common::options::{CheckName, CompilationContext, StrictnessConfig, StrictnessLevel};
use trc_parser::{ParseOptions, parse_source};
use trc_solver::TypeInterner;

fn check_with(source: &str, options: &CompilationContext) -> CheckResult {
    let file = Arc::new(parse_source("main.trb", source, ParseOptions::default()));
    assert!(file.diagnostics.is_empty(), "syntax errors: {:?}", file.diagnostics);
    let bound = bind_program(Arc::new(TypeInterner::new()), &[file]);
    check_file(&bound.table, FileId::input(0), options)
}

fn level(level: StrictnessLevel) -> CompilationContext {
    CompilationContext::with_strictness(level)
}

fn only(check: CheckName, enabled: bool) -> CompilationContext {
    CompilationContext {
        strictness: StrictnessConfig::new(StrictnessLevel::Standard).with_check(check, enabled),
        ..CompilationContext::default()
    }
}

fn count(result: &CheckResult, code: u32) -> usize {
    result.diagnostics.iter().filter(|d| d.code == code).count()
}

// =============================================================================
// no_implicit_any
// =============================================================================

#[test]
fn strict_reports_the_unannotated_parameter_once() {
    let source = "def f(x)\n  x\nend\n";
    let result = check_with(source, &level(StrictnessLevel::Strict));
    assert_eq!(count(&result, diagnostic_codes::IMPLICIT_ANY_PARAMETER), 1);
    let diagnostic = result
        .diagnostics
        .iter()
        .find(|d| d.code == diagnostic_codes::IMPLICIT_ANY_PARAMETER)
        .expect("implicit any");
    assert_eq!(diagnostic.category, DiagnosticCategory::Error);
    assert_eq!(diagnostic.start, 6);
}

#[test]
fn permissive_reports_nothing_for_unannotated_code() {
    let source = "def f(x)\n  x\nend\nf(1)\n";
    let result = check_with(source, &level(StrictnessLevel::Permissive));
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn standard_warns_on_implicit_any() {
    let result = check_with("def f(x): Integer\n  x\nend\n", &level(StrictnessLevel::Standard));
    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.code, diagnostic_codes::IMPLICIT_ANY_PARAMETER);
    assert_eq!(diagnostic.category, DiagnosticCategory::Warning);
    assert_eq!(result.error_count, 0);
}

#[test]
fn untyped_attributes_are_implicit_any() {
    let source = "class User\n  attr_reader :name\nend\n";
    let result = check_with(source, &level(StrictnessLevel::Strict));
    assert_eq!(count(&result, diagnostic_codes::IMPLICIT_ANY_ATTRIBUTE), 1);
}

// =============================================================================
// strict_nil
// =============================================================================

const FIND: &str = "class User\nend\ndef find(id: Integer): User\n  return nil if id < 0\n  User.new\nend\n";

#[test]
fn nil_exit_from_non_nil_return_type_is_reported_once() {
    let result = check_with(FIND, &only(CheckName::StrictNil, true));
    assert_eq!(count(&result, diagnostic_codes::NIL_NOT_IN_RETURN_TYPE), 1);
    assert_eq!(count(&result, diagnostic_codes::RETURN_TYPE_MISMATCH), 0);
    assert_eq!(result.error_count, 1);
}

#[test]
fn nil_exit_is_accepted_without_strict_nil() {
    let result = check_with(FIND, &only(CheckName::StrictNil, false));
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn optional_return_type_accepts_nil() {
    let source = "class User\nend\ndef find(id: Integer): User?\n  return nil if id < 0\n  User.new\nend\n";
    let result = check_with(source, &only(CheckName::StrictNil, true));
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

// =============================================================================
// no_unchecked_indexed_access
// =============================================================================

const USERS: &str = "class User\n  attr_reader :name: String\n  def initialize(name: String)\n    @name = name\n  end\nend\nusers: Array<User> = [User.new(\"a\")]\n";

#[test]
fn unguarded_index_is_possibly_nil() {
    let source = format!("{USERS}users[0].name\n");
    let result = check_with(&source, &level(StrictnessLevel::Standard));
    assert_eq!(count(&result, diagnostic_codes::METHOD_ON_POSSIBLY_NIL), 1);
    assert_eq!(result.error_count, 1);
}

#[test]
fn truthiness_guard_covers_the_same_expression() {
    let source = format!("{USERS}if users[0]\n  users[0].name\nend\n");
    let result = check_with(&source, &level(StrictnessLevel::Standard));
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn guard_does_not_outlive_its_branch() {
    let source = format!("{USERS}if users[0]\n  users[0].name\nend\nusers[0].name\n");
    let result = check_with(&source, &level(StrictnessLevel::Standard));
    assert_eq!(count(&result, diagnostic_codes::METHOD_ON_POSSIBLY_NIL), 1);
}

#[test]
fn unguarded_index_into_a_non_optional_slot() {
    let source = format!("{USERS}first: User = users[0]\nfirst.name\n");
    let result = check_with(&source, &level(StrictnessLevel::Standard));
    assert_eq!(count(&result, diagnostic_codes::UNSAFE_INDEXED_ACCESS), 1);
    assert_eq!(count(&result, diagnostic_codes::TYPE_NOT_ASSIGNABLE), 0);
}

#[test]
fn permissive_indexing_yields_the_element_type() {
    let source = format!("{USERS}users[0].name\n");
    let result = check_with(&source, &level(StrictnessLevel::Permissive));
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

// =============================================================================
// no_unused_vars and require_return_types
// =============================================================================

#[test]
fn unused_locals_warn_unless_underscored() {
    let source = "def f(a: Integer, _b: Integer): Integer\n  c = 1\n  _d = 2\n  3\nend\n";
    let result = check_with(source, &level(StrictnessLevel::Standard));
    let unused: Vec<&str> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == diagnostic_codes::UNUSED_VARIABLE)
        .map(|d| d.message_text.as_str())
        .collect();
    assert_eq!(unused.len(), 2, "{unused:?}");
    assert!(unused.iter().any(|m| m.contains("'a'")));
    assert!(unused.iter().any(|m| m.contains("'c'")));
    assert!(result.diagnostics.iter().all(|d| d.category == DiagnosticCategory::Warning));
}

#[test]
fn strict_requires_return_types_on_public_methods() {
    let source = "class Greeter\n  def hello(name: String)\n    name\n  end\n\n  private\n\n  def helper(name: String)\n    name\n  end\nend\n";
    let result = check_with(source, &level(StrictnessLevel::Strict));
    assert_eq!(count(&result, diagnostic_codes::MISSING_RETURN_TYPE), 1);

    let result = check_with(source, &level(StrictnessLevel::Standard));
    assert_eq!(count(&result, diagnostic_codes::MISSING_RETURN_TYPE), 0);
}
