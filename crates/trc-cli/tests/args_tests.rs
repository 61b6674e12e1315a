use clap::Parser;

use crate::args::{CliArgs, ReportFormat};
use trc_common::limits::DEFAULT_DEBOUNCE_MS;

#[test]
fn parses_defaults() {
    let args = CliArgs::try_parse_from(["trc"]).expect("default args should parse");

    assert!(args.inputs.is_empty());
    assert!(args.project.is_none());
    assert!(args.strictness.is_none());
    assert!(args.checks.is_empty());
    assert!(!args.allow_errors);
    assert!(!args.parallel());
    assert!(!args.no_emit);
    assert!(!args.watch);
    assert_eq!(args.format, ReportFormat::Text);
    assert_eq!(args.pretty, None);
    assert_eq!(args.debounce_ms, DEFAULT_DEBOUNCE_MS);
}

#[test]
fn parses_common_flags() {
    let args = CliArgs::try_parse_from([
        "trc",
        "--strictness",
        "strict",
        "--check",
        "strict_nil=false",
        "--check",
        "no_unused_vars=true",
        "--target",
        "2.7",
        "--experimental",
        "native_pattern_matching",
        "--max-errors",
        "5",
        "--out-dir",
        "build",
        "--rbs-dir",
        "sig",
        "--format",
        "junit",
        "-w",
        "--debounce-ms",
        "250",
        "src",
        "lib/extra.trb",
    ])
    .expect("flagged args should parse");

    assert_eq!(args.strictness.as_deref(), Some("strict"));
    assert_eq!(args.checks, ["strict_nil=false", "no_unused_vars=true"]);
    assert_eq!(args.target.as_deref(), Some("2.7"));
    assert_eq!(args.experimental, ["native_pattern_matching"]);
    assert_eq!(args.max_errors, Some(5));
    assert_eq!(args.out_dir.as_deref(), Some(std::path::Path::new("build")));
    assert_eq!(args.rbs_dir.as_deref(), Some(std::path::Path::new("sig")));
    assert_eq!(args.format, ReportFormat::Junit);
    assert!(args.watch);
    assert_eq!(args.debounce_ms, 250);
    assert_eq!(args.inputs.len(), 2);
}

#[test]
fn jobs_imply_parallel() {
    let args = CliArgs::try_parse_from(["trc", "--jobs", "4"]).expect("jobs should parse");
    assert_eq!(args.jobs, Some(4));
    assert!(args.parallel());
}

#[test]
fn pretty_accepts_an_optional_value() {
    let bare = CliArgs::try_parse_from(["trc", "--pretty"]).expect("bare flag");
    assert_eq!(bare.pretty, Some(true));
    let off = CliArgs::try_parse_from(["trc", "--pretty", "false"]).expect("explicit value");
    assert_eq!(off.pretty, Some(false));
}

#[test]
fn rejects_unknown_format() {
    assert!(CliArgs::try_parse_from(["trc", "--format", "xml"]).is_err());
}
