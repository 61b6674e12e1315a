//! Compilation options.
//!
//! A `CompilationContext` is built once (by the CLI or a test) and passed by
//! reference to every phase. Nothing in the compiler reads process-wide
//! configuration.

use crate::diagnostics::DiagnosticCategory;
use crate::limits::DEFAULT_MAX_ERRORS;
use indexmap::IndexMap;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Errors from parsing option values given as strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionParseError {
    #[error("unknown strictness level '{0}' (expected strict, standard or permissive)")]
    UnknownStrictness(String),
    #[error("unknown check '{0}'")]
    UnknownCheck(String),
    #[error("unsupported Ruby target '{0}' (supported: 2.6 to 3.4)")]
    UnsupportedTarget(String),
    #[error("unknown experimental feature '{0}'")]
    UnknownFeature(String),
}

// =============================================================================
// Strictness
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictnessLevel {
    Strict,
    #[default]
    Standard,
    Permissive,
}

impl StrictnessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            StrictnessLevel::Strict => "strict",
            StrictnessLevel::Standard => "standard",
            StrictnessLevel::Permissive => "permissive",
        }
    }
}

impl FromStr for StrictnessLevel {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(StrictnessLevel::Strict),
            "standard" => Ok(StrictnessLevel::Standard),
            "permissive" => Ok(StrictnessLevel::Permissive),
            _ => Err(OptionParseError::UnknownStrictness(s.to_string())),
        }
    }
}

impl fmt::Display for StrictnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Individually switchable checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    NoImplicitAny,
    StrictNil,
    NoUnusedVars,
    NoUncheckedIndexedAccess,
    RequireReturnTypes,
}

impl CheckName {
    pub const ALL: [CheckName; 5] = [
        CheckName::NoImplicitAny,
        CheckName::StrictNil,
        CheckName::NoUnusedVars,
        CheckName::NoUncheckedIndexedAccess,
        CheckName::RequireReturnTypes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CheckName::NoImplicitAny => "no_implicit_any",
            CheckName::StrictNil => "strict_nil",
            CheckName::NoUnusedVars => "no_unused_vars",
            CheckName::NoUncheckedIndexedAccess => "no_unchecked_indexed_access",
            CheckName::RequireReturnTypes => "require_return_types",
        }
    }

    /// Whether the level turns this check on when no override is given.
    pub fn enabled_by_default(self, level: StrictnessLevel) -> bool {
        match level {
            StrictnessLevel::Strict => true,
            StrictnessLevel::Standard => self != CheckName::RequireReturnTypes,
            StrictnessLevel::Permissive => false,
        }
    }
}

impl FromStr for CheckName {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept camelCase spellings from JSON config as well.
        let normalized: String = s
            .trim()
            .chars()
            .flat_map(|c| {
                if c.is_ascii_uppercase() {
                    vec!['_', c.to_ascii_lowercase()]
                } else if c == '-' {
                    vec!['_']
                } else {
                    vec![c]
                }
            })
            .collect();
        CheckName::ALL
            .into_iter()
            .find(|check| check.as_str() == normalized)
            .ok_or_else(|| OptionParseError::UnknownCheck(s.to_string()))
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strictness level plus per-check overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrictnessConfig {
    pub level: StrictnessLevel,
    #[serde(default)]
    pub checks: IndexMap<CheckName, bool>,
}

impl StrictnessConfig {
    pub fn new(level: StrictnessLevel) -> Self {
        Self {
            level,
            checks: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_check(mut self, check: CheckName, enabled: bool) -> Self {
        self.checks.insert(check, enabled);
        self
    }

    pub fn is_enabled(&self, check: CheckName) -> bool {
        self.checks
            .get(&check)
            .copied()
            .unwrap_or_else(|| check.enabled_by_default(self.level))
    }

    /// Severity a check reports at, or `None` when the check is off.
    ///
    /// `no_unused_vars` always warns. `no_implicit_any` is an error only under
    /// `strict`. Under `permissive`, an explicitly enabled check warns.
    pub fn severity(&self, check: CheckName) -> Option<DiagnosticCategory> {
        if !self.is_enabled(check) {
            return None;
        }
        let category = match (check, self.level) {
            (CheckName::NoUnusedVars, _) => DiagnosticCategory::Warning,
            (_, StrictnessLevel::Permissive) => DiagnosticCategory::Warning,
            (CheckName::NoImplicitAny, StrictnessLevel::Standard) => DiagnosticCategory::Warning,
            _ => DiagnosticCategory::Error,
        };
        Some(category)
    }
}

// =============================================================================
// Target Ruby version
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RubyVersion {
    pub major: u8,
    pub minor: u8,
}

impl RubyVersion {
    pub const V2_6: RubyVersion = RubyVersion::new(2, 6);
    pub const V2_7: RubyVersion = RubyVersion::new(2, 7);
    pub const V3_0: RubyVersion = RubyVersion::new(3, 0);
    pub const V3_1: RubyVersion = RubyVersion::new(3, 1);
    pub const V3_2: RubyVersion = RubyVersion::new(3, 2);
    pub const V3_3: RubyVersion = RubyVersion::new(3, 3);
    pub const V3_4: RubyVersion = RubyVersion::new(3, 4);

    pub const SUPPORTED: [RubyVersion; 7] = [
        Self::V2_6,
        Self::V2_7,
        Self::V3_0,
        Self::V3_1,
        Self::V3_2,
        Self::V3_3,
        Self::V3_4,
    ];

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// `case/in` is stable syntax.
    pub fn supports_pattern_matching(self) -> bool {
        self >= Self::V3_0
    }

    /// `def name(args) = expr`.
    pub fn supports_endless_methods(self) -> bool {
        self >= Self::V3_0
    }

    /// `{x:}` meaning `{x: x}`.
    pub fn supports_hash_shorthand(self) -> bool {
        self >= Self::V3_1
    }

    /// `NoMatchingPatternError` exists at runtime.
    pub fn has_no_matching_pattern_error(self) -> bool {
        self >= Self::V2_7
    }
}

impl Default for RubyVersion {
    fn default() -> Self {
        Self::V3_3
    }
}

impl FromStr for RubyVersion {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || OptionParseError::UnsupportedTarget(s.to_string());
        let trimmed = s.trim().trim_start_matches(['r', 'v']);
        let mut parts = trimmed.split('.');
        let major = parts.next().and_then(|p| p.parse::<u8>().ok()).ok_or_else(unsupported)?;
        let minor = parts.next().and_then(|p| p.parse::<u8>().ok()).ok_or_else(unsupported)?;
        let version = RubyVersion::new(major, minor);
        if Self::SUPPORTED.contains(&version) {
            Ok(version)
        } else {
            Err(unsupported())
        }
    }
}

impl fmt::Display for RubyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Serialize for RubyVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RubyVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Experimental features
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentalFeature {
    /// Keep `case/in` native when targeting 2.7, where it is experimental.
    NativePatternMatching,
}

impl FromStr for ExperimentalFeature {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "native_pattern_matching" | "nativePatternMatching" => {
                Ok(ExperimentalFeature::NativePatternMatching)
            }
            other => Err(OptionParseError::UnknownFeature(other.to_string())),
        }
    }
}

// =============================================================================
// CompilationContext
// =============================================================================

/// Immutable options for one compilation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationContext {
    pub strictness: StrictnessConfig,
    pub target: RubyVersion,
    pub experimental: Vec<ExperimentalFeature>,
    /// Emit Ruby/RBS even when a file has errors.
    pub allow_errors: bool,
    /// Stop reporting after this many errors per file.
    pub max_errors: usize,
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self {
            strictness: StrictnessConfig::default(),
            target: RubyVersion::default(),
            experimental: Vec::new(),
            allow_errors: false,
            max_errors: DEFAULT_MAX_ERRORS,
        }
    }
}

impl CompilationContext {
    pub fn with_strictness(level: StrictnessLevel) -> Self {
        Self {
            strictness: StrictnessConfig::new(level),
            ..Self::default()
        }
    }

    pub fn has_feature(&self, feature: ExperimentalFeature) -> bool {
        self.experimental.contains(&feature)
    }

    pub fn is_enabled(&self, check: CheckName) -> bool {
        self.strictness.is_enabled(check)
    }

    /// Stable hash of every option that affects outputs, used as part of
    /// cache keys.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.strictness.level.hash(&mut hasher);
        for check in CheckName::ALL {
            self.strictness.is_enabled(check).hash(&mut hasher);
        }
        self.target.hash(&mut hasher);
        let mut features = self.experimental.clone();
        features.sort_by_key(|f| *f as u8);
        features.dedup();
        features.hash(&mut hasher);
        self.allow_errors.hash(&mut hasher);
        self.max_errors.hash(&mut hasher);
        hasher.finish()
    }
}
