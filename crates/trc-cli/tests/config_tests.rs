use clap::Parser;
use std::path::Path;

use crate::args::CliArgs;
use crate::config::{ConfigError, parse_check_flag, parse_config, resolve};
use trc_common::{CheckName, ExperimentalFeature, RubyVersion, StrictnessLevel};

fn args(extra: &[&str]) -> CliArgs {
    let mut argv = vec!["trc"];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).expect("args should parse")
}

#[test]
fn parses_project_file() {
    let config = parse_config(
        r#"{
            "include": ["app/**/*.trb"],
            "exclude": ["app/vendor/**"],
            "outDir": "build",
            "rbsDir": "sig",
            "compilerOptions": {
                "strictness": "strict",
                "checks": { "strictNil": false, "no_unused_vars": "true" },
                "target": "3.0",
                "allowErrors": "yes",
                "maxErrors": 20
            }
        }"#,
    )
    .expect("config should parse");

    assert_eq!(config.include.as_deref(), Some(&["app/**/*.trb".to_string()][..]));
    assert_eq!(config.out_dir.as_deref(), Some("build"));
    let options = config.compiler_options.expect("compiler options");
    assert_eq!(options.allow_errors, Some(true));
    assert_eq!(options.max_errors, Some(20));
    assert_eq!(options.checks.map(|checks| checks.len()), Some(2));
}

#[test]
fn rejects_invalid_boolean_strings() {
    let err = parse_config(r#"{ "compilerOptions": { "allowErrors": "maybe" } }"#);
    assert!(err.is_err());
}

#[test]
fn project_values_apply_and_flags_override() {
    let config = parse_config(
        r#"{
            "outDir": "build",
            "compilerOptions": {
                "strictness": "permissive",
                "checks": { "strictNil": true },
                "target": "2.7",
                "experimental": ["native_pattern_matching"]
            }
        }"#,
    )
    .expect("config should parse");

    let base = Path::new("/project");
    let resolved = resolve(&config, &args(&[]), base, base).expect("resolves");
    let context = &resolved.context;
    assert_eq!(context.strictness.level, StrictnessLevel::Permissive);
    assert!(context.is_enabled(CheckName::StrictNil));
    assert_eq!(context.target, RubyVersion::V2_7);
    assert!(context.has_feature(ExperimentalFeature::NativePatternMatching));
    assert_eq!(resolved.out_dir.as_deref(), Some(Path::new("/project/build")));

    let overridden = resolve(
        &config,
        &args(&["--strictness", "strict", "--check", "strict_nil=false", "--target", "3.3"]),
        base,
        Path::new("/elsewhere"),
    )
    .expect("resolves");
    assert_eq!(overridden.context.strictness.level, StrictnessLevel::Strict);
    assert!(!overridden.context.is_enabled(CheckName::StrictNil));
    assert_eq!(overridden.context.target, RubyVersion::V3_3);
}

#[test]
fn unknown_values_are_configuration_errors() {
    let base = Path::new("/project");
    let bad_level = resolve(&Default::default(), &args(&["--strictness", "loose"]), base, base);
    assert!(matches!(bad_level, Err(ConfigError::Option(_))));

    let bad_target = resolve(&Default::default(), &args(&["--target", "1.9"]), base, base);
    assert!(matches!(bad_target, Err(ConfigError::Option(_))));

    let config = parse_config(r#"{ "compilerOptions": { "checks": { "noSuchCheck": true } } }"#)
        .expect("config should parse");
    assert!(resolve(&config, &args(&[]), base, base).is_err());
}

#[test]
fn unknown_experimental_feature_only_warns() {
    let base = Path::new("/project");
    let resolved = resolve(&Default::default(), &args(&["--experimental", "time_travel"]), base, base)
        .expect("unknown features are not fatal");
    assert!(resolved.context.experimental.is_empty());
    assert_eq!(resolved.warnings.len(), 1);
    assert!(resolved.warnings[0].contains("time_travel"));
}

#[test]
fn check_flags() {
    assert_eq!(parse_check_flag("strict_nil=false").ok(), Some((CheckName::StrictNil, false)));
    assert_eq!(parse_check_flag("no-implicit-any").ok(), Some((CheckName::NoImplicitAny, true)));
    assert!(matches!(parse_check_flag("strict_nil=sometimes"), Err(ConfigError::CheckSyntax(_))));
}

#[test]
fn allow_errors_and_max_errors_resolve() {
    let base = Path::new("/project");
    let resolved = resolve(&Default::default(), &args(&["--allow-errors", "--max-errors", "3"]), base, base)
        .expect("resolves");
    assert!(resolved.context.allow_errors);
    assert_eq!(resolved.context.max_errors, 3);
    assert_eq!(resolved.max_errors, Some(3));
}
