use std::sync::Arc;

use trc_binder::{FileId, bind_program};
use trc_checker::{CheckResult, check_file};
use trc_common::diagnostics::diagnostic_codes;
use trc_common::options::CompilationContext;
use trc_parser::{ParseOptions, parse_source};
use trc_solver::TypeInterner;

fn check(source: &str) -> CheckResult {
    let file = Arc::new(parse_source("main.trb", source, ParseOptions::default()));
    assert!(file.diagnostics.is_empty(), "syntax errors: {:?}", file.diagnostics);
    let bound = bind_program(Arc::new(TypeInterner::new()), &[file]);
    check_file(&bound.table, FileId::input(0), &CompilationContext::default())
}

fn codes(result: &CheckResult) -> Vec<u32> {
    result.diagnostics.iter().map(|d| d.code).collect()
}

fn count(result: &CheckResult, code: u32) -> usize {
    result.diagnostics.iter().filter(|d| d.code == code).count()
}

#[test]
fn nil_check_narrows_both_branches() {
    let source = "def shout(name: String?): String\n  if name.nil?\n    \"nobody\"\n  else\n    name.upcase\n  end\nend\n";
    let result = check(source);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn unguarded_optional_receiver_is_reported() {
    let source = "def shout(name: String?)\n  name.upcase\nend\n";
    let result = check(source);
    assert_eq!(count(&result, diagnostic_codes::METHOD_ON_POSSIBLY_NIL), 1);
}

#[test]
fn truthiness_guard_narrows_the_then_branch() {
    let source = "def shout(name: String?)\n  if name\n    name.upcase\n  end\nend\n";
    let result = check(source);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn is_a_narrows_to_the_class_and_excludes_it_otherwise() {
    let source = "def describe(value: String | Integer): String\n  if value.is_a?(String)\n    value.upcase\n  else\n    value.to_s\n  end\nend\n";
    let result = check(source);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

    let source = "def describe(value: String | Integer)\n  if value.is_a?(String)\n    value.upcase\n  else\n    value.upcase\n  end\nend\n";
    let result = check(source);
    assert_eq!(codes(&result), vec![diagnostic_codes::UNDEFINED_METHOD]);
}

#[test]
fn narrowing_ends_with_the_branch() {
    let source = "def shout(name: String?)\n  if name\n    name.upcase\n  end\n  name.upcase\nend\n";
    let result = check(source);
    assert_eq!(count(&result, diagnostic_codes::METHOD_ON_POSSIBLY_NIL), 1);
}

#[test]
fn early_return_narrows_the_rest_of_the_method() {
    let source = "def size(name: String?): Integer\n  return 0 if name.nil?\n  name.length\nend\n";
    let result = check(source);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn assignment_discards_narrowing() {
    let source = "def shout(name: String?, other: String?)\n  if name\n    name = other\n    name.upcase\n  end\nend\n";
    let result = check(source);
    assert_eq!(count(&result, diagnostic_codes::METHOD_ON_POSSIBLY_NIL), 1);
}

#[test]
fn or_assign_removes_nil() {
    let source = "def shout(name: String?): String\n  name ||= \"anonymous\"\n  name.upcase\nend\n";
    let result = check(source);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn case_when_narrows_by_class() {
    let source = "def describe(value: String | Integer)\n  case value\n  when String\n    value.upcase\n  when Integer\n    value.abs\n  end\nend\n";
    let result = check(source);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

    let source = "def describe(value: String | Integer)\n  case value\n  when Integer\n    value.upcase\n  end\nend\n";
    let result = check(source);
    assert_eq!(codes(&result), vec![diagnostic_codes::UNDEFINED_METHOD]);
}

#[test]
fn case_in_binds_and_narrows() {
    let source = "def describe(value: String | Integer)\n  case value\n  in String => text\n    text.upcase\n  in Integer\n    value.abs\n  end\nend\n";
    let result = check(source);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}
