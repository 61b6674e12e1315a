//! Syntax lowering for older Ruby targets.

use trc_common::options::{CompilationContext, ExperimentalFeature, RubyVersion};
use trc_emitter::emit_ruby;
use trc_parser::{ParseOptions, parse_source};

fn emit_for(source: &str, target: RubyVersion) -> String {
    emit_with(source, CompilationContext {
        target,
        ..CompilationContext::default()
    })
}

fn emit_with(source: &str, options: CompilationContext) -> String {
    let file = parse_source("main.trb", source, ParseOptions::default());
    assert!(file.diagnostics.is_empty(), "syntax errors: {:?}", file.diagnostics);
    emit_ruby(&file, &options)
}

const CASE_IN: &str = "case value\nin Integer => n\n  n.succ\nin String\n  0\nend\n";

#[test]
fn case_in_stays_native_on_ruby_3() {
    assert_eq!(emit_for(CASE_IN, RubyVersion::V3_0), CASE_IN);
}

#[test]
fn case_in_is_lowered_below_ruby_3() {
    let expected = "\
__case_subject_1 = value
case
when Integer === __case_subject_1
  n = __case_subject_1
  n.succ
when String === __case_subject_1
  0
else
  raise NoMatchingPatternError, __case_subject_1.inspect
end
";
    assert_eq!(emit_for(CASE_IN, RubyVersion::V2_7), expected);
}

#[test]
fn lowered_case_in_raises_argument_error_before_2_7() {
    let output = emit_for(CASE_IN, RubyVersion::V2_6);
    assert!(output.contains("raise ArgumentError, __case_subject_1.inspect"), "{output}");
    assert!(!output.contains("NoMatchingPatternError"));
}

#[test]
fn experimental_flag_keeps_case_in_native_on_2_7() {
    let options = CompilationContext {
        target: RubyVersion::V2_7,
        experimental: vec![ExperimentalFeature::NativePatternMatching],
        ..CompilationContext::default()
    };
    assert_eq!(emit_with(CASE_IN, options), CASE_IN);
}

#[test]
fn explicit_else_replaces_the_raise() {
    let source = "case value\nin [x, *]\n  x\nelse\n  nil\nend\n";
    let output = emit_for(source, RubyVersion::V2_6);
    assert!(
        output.contains(
            "when __case_subject_1.is_a?(Array) && __case_subject_1.length >= 1\n  x = __case_subject_1[0]\n"
        ),
        "{output}"
    );
    assert!(output.ends_with("else\n  nil\nend\n"), "{output}");
    assert!(!output.contains("raise"));
}

#[test]
fn hash_pattern_checks_keys() {
    let source = "case config\nin { name: String => name }\n  name\nend\n";
    let output = emit_for(source, RubyVersion::V2_7);
    assert!(
        output.contains(
            "when __case_subject_1.is_a?(Hash) && __case_subject_1.key?(:name) && String === __case_subject_1[:name]\n"
        ),
        "{output}"
    );
    assert!(output.contains("  name = __case_subject_1[:name]\n"), "{output}");
}

#[test]
fn guard_inlines_bindings_into_the_condition() {
    let source = "case value\nin Integer => n if n > 0\n  n\nend\n";
    let output = emit_for(source, RubyVersion::V2_7);
    assert!(
        output.contains("when Integer === __case_subject_1 && (n = __case_subject_1; true) && (n > 0)\n"),
        "{output}"
    );
}

#[test]
fn each_lowered_case_gets_its_own_temporary() {
    let source = format!("{CASE_IN}{CASE_IN}");
    let output = emit_for(&source, RubyVersion::V2_7);
    assert!(output.contains("__case_subject_1 = value\n"));
    assert!(output.contains("__case_subject_2 = value\n"));
}

#[test]
fn endless_method_on_each_side_of_3_0() {
    let source = "def double(x: Integer): Integer = x * 2\n";
    assert_eq!(emit_for(source, RubyVersion::V3_0), "def double(x) = x * 2\n");
    assert_eq!(emit_for(source, RubyVersion::V2_7), "def double(x)\n  x * 2\nend\n");
}

#[test]
fn hash_shorthand_expands_before_3_1() {
    let source = "name = 1\nfoo(name:)\n";
    assert_eq!(emit_for(source, RubyVersion::V3_1), "name = 1\nfoo(name:)\n");
    assert_eq!(emit_for(source, RubyVersion::V3_0), "name = 1\nfoo(name: name)\n");
}
