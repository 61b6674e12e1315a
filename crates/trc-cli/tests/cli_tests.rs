//! End-to-end runs of the driver and the `trc` binary against temporary
//! projects.

use clap::Parser;
use std::path::Path;
use std::process::Command;

use trc_cli::args::CliArgs;
use trc_cli::driver::{self, EXIT_COMPILE_ERROR, EXIT_CONFIG_ERROR, EXIT_SUCCESS, EXIT_TYPE_ERROR};

const ADD: &str = "def add(a: Integer, b: Integer): Integer; a+b; end\n";
const MISMATCH: &str = "def f(x: Integer): String\n  x\nend\n";

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create dir");
    }
    std::fs::write(path, text).expect("write fixture");
}

fn run(root: &Path, argv: &[&str]) -> (i32, String) {
    let mut full = vec!["trc", "--pretty", "false"];
    full.extend_from_slice(argv);
    let args = CliArgs::try_parse_from(full).expect("args should parse");
    let mut out = Vec::new();
    let code = match driver::run(&args, root, &mut out) {
        Ok(code) => code,
        Err(err) => {
            out.extend_from_slice(format!("{err:#}").as_bytes());
            driver::exit_code_for_error(&err)
        }
    };
    (code, String::from_utf8(out).expect("utf-8 report"))
}

#[test]
fn compiles_a_directory_next_to_inputs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "src/math.trb", ADD);

    let (code, report) = run(root, &["src"]);
    assert_eq!(code, EXIT_SUCCESS, "{report}");
    let ruby = std::fs::read_to_string(root.join("src/math.rb")).expect("ruby output");
    assert_eq!(ruby, "def add(a, b)\n  a + b\nend\n");
    let rbs = std::fs::read_to_string(root.join("src/math.rbs")).expect("rbs output");
    assert_eq!(rbs, "def add: (Integer a, Integer b) -> Integer\n");
    assert!(report.contains("No errors"), "{report}");
}

#[test]
fn out_dirs_mirror_the_source_tree() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "lib/util/math.trb", ADD);

    let (code, report) = run(root, &["--out-dir", "build", "--rbs-dir", "sig"]);
    assert_eq!(code, EXIT_SUCCESS, "{report}");
    assert!(root.join("build/lib/util/math.rb").is_file());
    assert!(root.join("sig/lib/util/math.rbs").is_file());
    assert!(!root.join("lib/util/math.rb").exists());
}

#[test]
fn type_errors_exit_with_two_and_block_emit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "main.trb", MISMATCH);

    let (code, report) = run(root, &["main.trb"]);
    assert_eq!(code, EXIT_TYPE_ERROR, "{report}");
    assert!(report.contains("main.trb:2:3 - error TRC"), "{report}");
    assert!(!root.join("main.rb").exists());

    let (code, _) = run(root, &["--allow-errors", "main.trb"]);
    assert_eq!(code, EXIT_TYPE_ERROR);
    assert!(root.join("main.rb").exists());
}

#[test]
fn syntax_errors_exit_with_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "bad.trb", "def (\n");
    let (code, report) = run(root, &["bad.trb"]);
    assert_eq!(code, EXIT_COMPILE_ERROR, "{report}");
}

#[test]
fn configuration_errors_exit_with_three() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "main.trb", ADD);

    let (code, report) = run(root, &["--strictness", "loose"]);
    assert_eq!(code, EXIT_CONFIG_ERROR, "{report}");
    assert!(report.contains("loose"), "{report}");

    write(root, "trc.json", "{ not json");
    let (code, _) = run(root, &[]);
    assert_eq!(code, EXIT_CONFIG_ERROR);

    let empty = tempfile::tempdir().expect("tempdir");
    let (code, report) = run(empty.path(), &[]);
    assert_eq!(code, EXIT_CONFIG_ERROR);
    assert!(report.contains("no input files"), "{report}");
}

#[test]
fn project_file_selects_files_and_options() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "app/main.trb", "def f(x); x; end\n");
    write(root, "vendor/skip.trb", MISMATCH);
    write(
        root,
        "trc.json",
        r#"{
            "include": ["app/**"],
            "rbsDir": "sig",
            "compilerOptions": { "strictness": "permissive" }
        }"#,
    );

    let (code, report) = run(root, &[]);
    assert_eq!(code, EXIT_SUCCESS, "{report}");
    assert_eq!(
        std::fs::read_to_string(root.join("sig/app/main.rbs")).expect("rbs"),
        "def f: (untyped x) -> untyped\n"
    );
    assert!(!root.join("vendor/skip.rb").exists());

    let (code, _) = run(root, &["--strictness", "strict", "--no-emit"]);
    assert_eq!(code, EXIT_TYPE_ERROR);
}

#[test]
fn json_report_is_machine_readable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "main.trb", MISMATCH);

    let (code, report) = run(root, &["--format", "json", "--no-emit", "main.trb"]);
    assert_eq!(code, EXIT_TYPE_ERROR);
    let json: serde_json::Value = serde_json::from_str(&report).expect("json report");
    assert_eq!(json["summary"]["errors"], 1);
    assert_eq!(json["diagnostics"][0]["kind"], "TypeMismatchError");
}

#[test]
fn unknown_experimental_feature_warns_but_compiles() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "main.trb", ADD);
    let (code, report) = run(root, &["--experimental", "warp_drive", "--no-emit"]);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(report.starts_with("warning: unknown experimental feature 'warp_drive'"), "{report}");
}

#[test]
fn parallel_jobs_match_serial_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    for i in 0..6 {
        write(root, &format!("f{i}.trb"), if i % 2 == 0 { ADD } else { MISMATCH });
    }
    let (serial_code, serial) = run(root, &["--no-emit"]);
    let (parallel_code, parallel) = run(root, &["--no-emit", "--jobs", "3"]);
    assert_eq!(serial_code, parallel_code);
    assert_eq!(serial, parallel);
}

#[test]
fn binary_reports_exit_codes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "main.trb", MISMATCH);

    let output = Command::new(env!("CARGO_BIN_EXE_trc"))
        .args(["--format", "json", "--no-emit", "main.trb"])
        .current_dir(root)
        .env_remove("TRC_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("run trc");
    assert_eq!(output.status.code(), Some(EXIT_TYPE_ERROR));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json on stdout");
    assert_eq!(json["summary"]["files"], 1);
}
