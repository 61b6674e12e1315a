use super::*;

#[test]
fn standard_level_defaults() {
    let config = StrictnessConfig::new(StrictnessLevel::Standard);
    assert!(config.is_enabled(CheckName::NoImplicitAny));
    assert!(config.is_enabled(CheckName::StrictNil));
    assert!(config.is_enabled(CheckName::NoUnusedVars));
    assert!(config.is_enabled(CheckName::NoUncheckedIndexedAccess));
    assert!(!config.is_enabled(CheckName::RequireReturnTypes));
    assert_eq!(
        config.severity(CheckName::NoImplicitAny),
        Some(DiagnosticCategory::Warning)
    );
    assert_eq!(
        config.severity(CheckName::StrictNil),
        Some(DiagnosticCategory::Error)
    );
}

#[test]
fn strict_level_turns_everything_into_errors_except_unused() {
    let config = StrictnessConfig::new(StrictnessLevel::Strict);
    for check in CheckName::ALL {
        assert!(config.is_enabled(check), "{check} should be on under strict");
    }
    assert_eq!(
        config.severity(CheckName::NoImplicitAny),
        Some(DiagnosticCategory::Error)
    );
    assert_eq!(
        config.severity(CheckName::NoUnusedVars),
        Some(DiagnosticCategory::Warning)
    );
}

#[test]
fn permissive_overrides_warn() {
    let config = StrictnessConfig::new(StrictnessLevel::Permissive);
    assert_eq!(config.severity(CheckName::StrictNil), None);

    let config = config.with_check(CheckName::StrictNil, true);
    assert_eq!(
        config.severity(CheckName::StrictNil),
        Some(DiagnosticCategory::Warning)
    );
}

#[test]
fn override_can_disable_a_level_default() {
    let config = StrictnessConfig::new(StrictnessLevel::Strict)
        .with_check(CheckName::RequireReturnTypes, false);
    assert_eq!(config.severity(CheckName::RequireReturnTypes), None);
    assert!(config.is_enabled(CheckName::StrictNil));
}

#[test]
fn check_names_parse_in_both_spellings() {
    assert_eq!("strict_nil".parse::<CheckName>(), Ok(CheckName::StrictNil));
    assert_eq!(
        "noUncheckedIndexedAccess".parse::<CheckName>(),
        Ok(CheckName::NoUncheckedIndexedAccess)
    );
    assert!(matches!(
        "no_such_check".parse::<CheckName>(),
        Err(OptionParseError::UnknownCheck(_))
    ));
}

#[test]
fn ruby_versions_parse_and_gate_features() {
    assert_eq!("3.3".parse::<RubyVersion>(), Ok(RubyVersion::V3_3));
    assert_eq!("2.7.8".parse::<RubyVersion>(), Ok(RubyVersion::V2_7));
    assert!("1.9".parse::<RubyVersion>().is_err());
    assert!("three".parse::<RubyVersion>().is_err());

    assert!(!RubyVersion::V2_7.supports_pattern_matching());
    assert!(RubyVersion::V3_0.supports_pattern_matching());
    assert!(!RubyVersion::V3_0.supports_hash_shorthand());
    assert!(RubyVersion::V3_1.supports_hash_shorthand());
    assert!(!RubyVersion::V2_6.has_no_matching_pattern_error());
    assert_eq!(RubyVersion::default(), RubyVersion::V3_3);
}

#[test]
fn fingerprint_tracks_effective_options() {
    let base = CompilationContext::default();
    let same = CompilationContext {
        strictness: StrictnessConfig::new(StrictnessLevel::Standard)
            .with_check(CheckName::StrictNil, true),
        ..CompilationContext::default()
    };
    // An override that matches the level default does not change outputs.
    assert_eq!(base.fingerprint(), same.fingerprint());

    let other_target = CompilationContext {
        target: RubyVersion::V2_6,
        ..CompilationContext::default()
    };
    assert_ne!(base.fingerprint(), other_target.fingerprint());
}

#[test]
fn context_deserializes_from_json() {
    let json = r#"{
        "strictness": { "level": "strict", "checks": { "no_unused_vars": false } },
        "target": "3.0",
        "experimental": ["native_pattern_matching"],
        "allow_errors": true,
        "max_errors": 5
    }"#;
    let ctx: CompilationContext = serde_json::from_str(json).unwrap();
    assert_eq!(ctx.strictness.level, StrictnessLevel::Strict);
    assert!(!ctx.is_enabled(CheckName::NoUnusedVars));
    assert_eq!(ctx.target, RubyVersion::V3_0);
    assert!(ctx.has_feature(ExperimentalFeature::NativePatternMatching));
    assert_eq!(ctx.max_errors, 5);
}
