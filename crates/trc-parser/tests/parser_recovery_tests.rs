//! Error recovery: one file yields every syntax error it contains, up to the
//! configured limit, and still produces a tree for the rest.

use trc_common::diagnostics::diagnostic_codes;
use trc_parser::{NodeKind, ParseOptions, parse_source};

#[test]
fn parsing_resumes_after_each_error() {
    let file = parse_source("broken.trb", "a = )\nb = 2\nc = ]\nd = 3\n", ParseOptions::default());
    let codes: Vec<u32> = file.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(
        codes,
        [diagnostic_codes::EXPRESSION_EXPECTED, diagnostic_codes::EXPRESSION_EXPECTED]
    );
    assert_eq!(file.diagnostics[0].line, 1);
    assert_eq!(file.diagnostics[1].line, 3);
    assert_eq!(file.statements().len(), 4);
    assert!(file.has_syntax_errors());
}

#[test]
fn valid_statements_survive_a_broken_neighbour() {
    let file = parse_source("broken.trb", "x = ]\ndef ok: Integer\n  1\nend\n", ParseOptions::default());
    assert_eq!(file.diagnostics.len(), 1);
    let has_method = file
        .statements()
        .iter()
        .any(|s| matches!(file.arena.kind(*s), Some(NodeKind::Method(decl)) if decl.name == "ok"));
    assert!(has_method);
}

#[test]
fn error_count_is_bounded_by_max_errors() {
    let source = "x = ]\n".repeat(10);
    let options = ParseOptions {
        max_errors: 3,
        ..ParseOptions::default()
    };
    let file = parse_source("many.trb", &source, options);
    assert_eq!(file.diagnostics.len(), 3);
}

#[test]
fn errors_inside_interpolation_use_file_offsets() {
    let file = parse_source("interp.trb", "x = \"a #{)} b\"\n", ParseOptions::default());
    assert_eq!(file.diagnostics.len(), 1);
    assert_eq!(file.diagnostics[0].start, 9);
    assert_eq!(file.diagnostics[0].column, 10);
}

#[test]
fn deep_nesting_is_reported_instead_of_overflowing() {
    let handle = std::thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(|| {
            let depth = 1000;
            let source = format!("{}1{}\n", "(".repeat(depth), ")".repeat(depth));
            parse_source("deep.trb", &source, ParseOptions::default())
        })
        .expect("spawn parser thread");
    let file = handle.join().expect("parser thread");
    assert!(
        file.diagnostics
            .iter()
            .any(|d| d.code == diagnostic_codes::NESTING_TOO_DEEP)
    );
}

#[test]
fn empty_source_has_no_statements() {
    let file = parse_source("empty.trb", "", ParseOptions::default());
    assert!(file.diagnostics.is_empty());
    assert!(file.statements().is_empty());
}
