use trc::common::{CompilationContext, LineMap};
use trc::{EmitSettings, SourceInput, compile};

use crate::args::ReportFormat;
use crate::reporter::Reporter;

const SOURCE: &str = "def f(x: Integer): String\n  x\nend\n";

fn reporter_for(source: &str, limit: Option<usize>) -> (Reporter, trc::Compilation) {
    let settings = EmitSettings {
        parallel: false,
        ..EmitSettings::default()
    };
    let compilation = compile(&[SourceInput::new("main.trb", source)], &CompilationContext::default(), settings);
    let mut reporter = Reporter::new(false).with_limit(limit);
    reporter.add_source("main.trb", source);
    (reporter, compilation)
}

#[test]
fn text_report_has_location_code_and_underline() {
    let (reporter, compilation) = reporter_for(SOURCE, None);
    let text = reporter.render(ReportFormat::Text, &compilation.files, &compilation.summary);
    let diagnostic = &compilation.files[0].diagnostics[0];

    let header = format!("main.trb:{}:{} - error TRC{}:", diagnostic.line, diagnostic.column, diagnostic.code);
    assert!(text.starts_with(&header), "{text}");
    assert!(text.contains("~"), "{text}");
    assert!(text.trim_end().ends_with("Found 1 error in 1 file."), "{text}");
}

#[test]
fn underline_sits_under_the_span() {
    let mut diagnostic = trc::common::Diagnostic::error("main.trb", 8, 7, "bad".to_string(), 3001);
    diagnostic.locate(&LineMap::build("x = 1\ny = foo.bar\n"));
    let mut reporter = Reporter::new(false);
    reporter.add_source("main.trb", "x = 1\ny = foo.bar\n");

    let text = reporter.format_diagnostic(&diagnostic);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "main.trb:2:3 - error TRC3001: bad");
    let code_line = lines.iter().find(|l| l.ends_with("y = foo.bar")).expect("source line");
    let underline = lines.last().expect("underline");
    let code_start = code_line.len() - "y = foo.bar".len();
    assert_eq!(&underline[code_start..], "  ~~~~~~~");
}

#[test]
fn clean_run_summary() {
    let (reporter, compilation) = reporter_for("_x = 1\n", None);
    let text = reporter.render_text(&compilation.files, &compilation.summary);
    assert_eq!(text, "Checked 1 file. No errors.\n");
}

#[test]
fn limit_truncates_display_but_not_counts() {
    let source = "a: Integer = \"s\"\nb: Integer = \"s\"\nc: Integer = \"s\"\na\nb\nc\n";
    let (reporter, compilation) = reporter_for(source, Some(1));
    assert_eq!(compilation.summary.errors, 3);

    let text = reporter.render_text(&compilation.files, &compilation.summary);
    assert_eq!(text.matches(" - error ").count(), 1, "{text}");
    assert!(text.contains("2 more diagnostics not shown"), "{text}");
    assert!(text.contains("Found 3 errors"), "{text}");

    let json: serde_json::Value =
        serde_json::from_str(&reporter.render_json(&compilation.files, &compilation.summary)).expect("valid json");
    assert_eq!(json["diagnostics"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["notShown"], 2);
    assert_eq!(json["summary"]["errors"], 3);
}

#[test]
fn json_report_names_kinds() {
    let (reporter, compilation) = reporter_for(SOURCE, None);
    let json: serde_json::Value =
        serde_json::from_str(&reporter.render_json(&compilation.files, &compilation.summary)).expect("valid json");
    assert_eq!(json["diagnostics"][0]["kind"], "TypeMismatchError");
    assert_eq!(json["diagnostics"][0]["category"], "error");
    assert_eq!(json["diagnostics"][0]["file"], "main.trb");
    assert!(json.get("notShown").is_none());
}

#[test]
fn junit_report_has_a_failure_per_error() {
    let (reporter, compilation) = reporter_for(SOURCE, None);
    let xml = reporter.render_junit(&compilation.files, &compilation.summary);
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("<testcase name=\"main.trb\" classname=\"trc\">"), "{xml}");
    assert_eq!(xml.matches("<failure type=\"TypeMismatchError\"").count(), 1, "{xml}");
    assert!(xml.trim_end().ends_with("</testsuites>"));
}

#[test]
fn junit_clean_file_is_an_empty_testcase() {
    let (reporter, compilation) = reporter_for("_ok = 1\n", None);
    let xml = reporter.render_junit(&compilation.files, &compilation.summary);
    assert!(xml.contains("<testcase name=\"main.trb\" classname=\"trc\"/>"), "{xml}");
    assert!(xml.contains("failures=\"0\""));
}
