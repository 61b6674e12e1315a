//! End-to-end scenarios: source in, diagnostics and both artifacts out.

use trc::common::diagnostics::diagnostic_codes;
use trc::common::{CheckName, CompilationContext, DiagnosticKind, StrictnessConfig, StrictnessLevel};
use trc::{Compilation, EmitSettings, SourceInput, compile};

fn run(source: &str, options: &CompilationContext) -> Compilation {
    compile(&[SourceInput::new("main.trb", source)], options, EmitSettings::default())
}

#[test]
fn typed_method_erases_to_ruby_and_signs_to_rbs() {
    let result = run(
        "def add(a: Integer, b: Integer): Integer; a+b; end\n",
        &CompilationContext::default(),
    );
    assert!(!result.summary.has_errors());
    let file = &result.files[0];
    assert_eq!(file.ruby.as_deref(), Some("def add(a, b)\n  a + b\nend\n"));
    assert_eq!(file.rbs.as_deref(), Some("def add: (Integer a, Integer b) -> Integer\n"));
}

#[test]
fn nil_return_blocks_emission_under_strict_nil() {
    let source = "class User\nend\ndef find(id: Integer): User\n  return nil if id < 0\n  User.new\nend\n";
    let options = CompilationContext {
        strictness: StrictnessConfig::new(StrictnessLevel::Standard).with_check(CheckName::StrictNil, true),
        ..CompilationContext::default()
    };
    let result = run(source, &options);
    assert_eq!(result.summary.errors, 1);
    assert_eq!(result.summary.syntax_errors, 0);
    let diagnostic = result.files[0]
        .diagnostics
        .iter()
        .find(|d| d.is_error())
        .expect("nil return error");
    assert_eq!(diagnostic.kind, DiagnosticKind::MissingReturnTypeError);
    assert_eq!(diagnostic.line, 3);
    // Errors block emission unless allowed.
    assert!(result.files[0].ruby.is_none());
    assert!(result.files[0].rbs.is_none());
}

const USERS: &str = "class User\n  attr_reader :name: String\n  def initialize(name: String)\n    @name = name\n  end\nend\nusers: Array<User> = [User.new(\"a\")]\n";

#[test]
fn unguarded_index_is_optional_until_checked() {
    let options = CompilationContext::default();
    let result = run(&format!("{USERS}users[0].name\n"), &options);
    assert_eq!(result.summary.errors, 1);
    assert_eq!(result.files[0].diagnostics[0].kind, DiagnosticKind::TypeMismatchError);

    let guarded = run(&format!("{USERS}if users[0]\n  users[0].name\nend\n"), &options);
    assert!(!guarded.summary.has_errors(), "{:?}", guarded.files[0].diagnostics);

    let after = run(&format!("{USERS}if users[0]\n  users[0].name\nend\nusers[0].name\n"), &options);
    assert_eq!(after.summary.errors, 1);
    assert_eq!(after.files[0].diagnostics[0].line, 11);
}

#[test]
fn permissive_accepts_untyped_code() {
    let source = "def f(x); x; end\n";
    let result = run(source, &CompilationContext::with_strictness(StrictnessLevel::Permissive));
    assert!(result.files[0].diagnostics.is_empty(), "{:?}", result.files[0].diagnostics);
    assert_eq!(result.files[0].rbs.as_deref(), Some("def f: (untyped x) -> untyped\n"));
    assert_eq!(result.files[0].ruby.as_deref(), Some("def f(x)\n  x\nend\n"));
}

#[test]
fn strict_reports_one_implicit_any_at_parameter() {
    let source = "def f(x); x; end\n";
    let result = run(source, &CompilationContext::with_strictness(StrictnessLevel::Strict));
    let implicit: Vec<_> = result.files[0]
        .diagnostics
        .iter()
        .filter(|d| d.code == diagnostic_codes::IMPLICIT_ANY_PARAMETER)
        .collect();
    assert_eq!(implicit.len(), 1);
    assert_eq!(implicit[0].kind, DiagnosticKind::ImplicitAnyError);
    assert_eq!((implicit[0].line, implicit[0].column), (1, 7));
}
