//! Multi-file compilation through the public driver.

use trc::common::{CompilationContext, DiagnosticKind, RubyVersion};
use trc::{DiagnosticSink, EmitSettings, SourceInput, compile};

const USER: &str = "class User\n  attr_reader :name: String\n  def initialize(name: String)\n    @name = name\n  end\nend\n";
const GREET: &str = "def greet(user: User): String\n  user.name\nend\n";

fn serial() -> EmitSettings {
    EmitSettings {
        parallel: false,
        ..EmitSettings::default()
    }
}

#[test]
fn declarations_are_visible_across_files() {
    let inputs = [SourceInput::new("user.trb", USER), SourceInput::new("greet.trb", GREET)];
    let result = compile(&inputs, &CompilationContext::default(), EmitSettings::default());
    assert!(!result.summary.has_errors(), "{:?}", result.diagnostics().collect::<Vec<_>>());
    assert_eq!(result.summary.files, 2);
    assert_eq!(result.summary.emitted, 2);
    let greet = result.file("greet.trb").expect("greet output");
    assert_eq!(greet.rbs.as_deref(), Some("def greet: (User user) -> String\n"));
}

#[test]
fn outputs_keep_input_order() {
    let inputs = [SourceInput::new("b.trb", "x = 1\n"), SourceInput::new("a.trb", "y = 2\n")];
    let result = compile(&inputs, &CompilationContext::default(), EmitSettings::default());
    let names: Vec<&str> = result.files.iter().map(|f| f.file.as_str()).collect();
    assert_eq!(names, ["b.trb", "a.trb"]);
}

#[test]
fn parallel_and_serial_runs_agree() {
    let broken = "def f(x: Integer): String\n  x\nend\nundefined_thing.call\n";
    let inputs = [
        SourceInput::new("user.trb", USER),
        SourceInput::new("greet.trb", GREET),
        SourceInput::new("broken.trb", broken),
    ];
    let options = CompilationContext::default();
    let parallel = compile(&inputs, &options, EmitSettings::default());
    let serial = compile(&inputs, &options, serial());
    assert_eq!(parallel.summary, serial.summary);
    for (p, s) in parallel.files.iter().zip(&serial.files) {
        assert_eq!(p.diagnostics, s.diagnostics);
        assert_eq!(p.ruby, s.ruby);
    }
}

#[test]
fn syntax_errors_are_counted_separately() {
    let inputs = [SourceInput::new("bad.trb", "x = )\n")];
    let result = compile(&inputs, &CompilationContext::default(), EmitSettings::default());
    assert!(result.summary.syntax_errors >= 1);
    assert!(result.files[0].has_syntax_errors());
    assert!(result.files[0].diagnostics.iter().any(|d| d.kind == DiagnosticKind::SyntaxError));
    assert!(result.files[0].ruby.is_none());
}

#[test]
fn unresolved_annotation_is_reported_by_file() {
    let inputs = [
        SourceInput::new("ok.trb", "_ok = 1\n"),
        SourceInput::new("missing.trb", "def f(a: Missing): Integer\n  1\nend\n"),
    ];
    let result = compile(&inputs, &CompilationContext::default(), serial());
    assert!(result.files[0].diagnostics.is_empty());
    let diagnostic = result.files[1]
        .diagnostics
        .iter()
        .find(|d| d.kind == DiagnosticKind::UnresolvedTypeError)
        .expect("unresolved type");
    assert_eq!(diagnostic.file, "missing.trb");
}

#[test]
fn allow_errors_still_emits() {
    let source = "def f(x: Integer): String\n  x\nend\n";
    let inputs = [SourceInput::new("main.trb", source)];
    let options = CompilationContext {
        allow_errors: true,
        ..CompilationContext::default()
    };
    let result = compile(&inputs, &options, serial());
    assert!(result.summary.has_errors());
    assert_eq!(result.files[0].ruby.as_deref(), Some("def f(x)\n  x\nend\n"));
}

#[test]
fn emit_settings_select_artifacts() {
    let inputs = [SourceInput::new("main.trb", "x: Integer = 1\n")];
    let settings = EmitSettings {
        ruby: true,
        rbs: false,
        parallel: false,
    };
    let result = compile(&inputs, &CompilationContext::default(), settings);
    assert_eq!(result.files[0].ruby.as_deref(), Some("x = 1\n"));
    assert!(result.files[0].rbs.is_none());
}

#[test]
fn target_version_reaches_the_emitter() {
    let source = "def double(x: Integer): Integer = x * 2\n";
    let options = CompilationContext {
        target: RubyVersion::V2_7,
        ..CompilationContext::default()
    };
    let result = compile(&[SourceInput::new("main.trb", source)], &options, serial());
    assert_eq!(result.files[0].ruby.as_deref(), Some("def double(x)\n  x * 2\nend\n"));
}

#[test]
fn sink_orders_diagnostics_by_position() {
    use trc::common::Diagnostic;

    let sink = DiagnosticSink::new();
    sink.push(Diagnostic::error("a.trb", 10, 1, "late".to_string(), 3001));
    sink.push(Diagnostic::error("a.trb", 2, 1, "early".to_string(), 3001));
    sink.push(Diagnostic::error("b.trb", 0, 1, "other".to_string(), 3001));
    assert_eq!(sink.len(), 3);

    let a = sink.take("a.trb");
    let messages: Vec<&str> = a.iter().map(|d| d.message_text.as_str()).collect();
    assert_eq!(messages, ["early", "late"]);
    assert!(sink.take("a.trb").is_empty());
    assert_eq!(sink.len(), 1);
}
