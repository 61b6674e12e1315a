//! `trc.json` project files and option resolution.
//!
//! Values from the project file are applied first; command-line flags
//! override them. Every problem here is a [`ConfigError`], which the driver
//! maps to exit code 3.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use trc_common::{
    CheckName, CompilationContext, ExperimentalFeature, OptionParseError, RubyVersion,
    StrictnessConfig, StrictnessLevel, limits::DEFAULT_MAX_ERRORS,
};

use crate::args::CliArgs;

pub const CONFIG_FILE_NAME: &str = "trc.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("project not found: {}", .0.display())]
    ProjectNotFound(PathBuf),
    #[error(transparent)]
    Option(#[from] OptionParseError),
    #[error("invalid --check value '{0}' (expected name=true or name=false)")]
    CheckSyntax(String),
    #[error("invalid glob '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("no input files")]
    NoInputs,
}

/// Accepts `true`, `"true"`, `"yes"`, `"1"` and their negatives.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => parse_bool(&s)
            .map(Some)
            .ok_or_else(|| Error::custom(format!("invalid boolean value: '{s}'"))),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// A boolean map value with the same leniency as the scalar options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag(pub bool);

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        deserialize_bool_or_string(deserializer)?
            .map(Flag)
            .ok_or_else(|| D::Error::custom("expected a boolean"))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrcConfig {
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub out_dir: Option<String>,
    #[serde(default)]
    pub rbs_dir: Option<String>,
    #[serde(default)]
    pub compiler_options: Option<CompilerOptions>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    #[serde(default)]
    pub strictness: Option<String>,
    #[serde(default)]
    pub checks: Option<IndexMap<String, Flag>>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub experimental: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub allow_errors: Option<bool>,
    #[serde(default)]
    pub max_errors: Option<usize>,
}

/// Options after merging the project file with command-line flags.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub context: CompilationContext,
    /// Directory relative paths and globs are resolved against.
    pub base_dir: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub out_dir: Option<PathBuf>,
    pub rbs_dir: Option<PathBuf>,
    /// Display limit for the report.
    pub max_errors: Option<usize>,
    /// Non-fatal problems, e.g. unknown experimental features.
    pub warnings: Vec<String>,
    pub config_path: Option<PathBuf>,
}

pub fn parse_config(source: &str) -> Result<TrcConfig, serde_json::Error> {
    serde_json::from_str(source)
}

pub fn load_config(path: &Path) -> Result<TrcConfig, ConfigError> {
    let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&source).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Locate the project file: `--project` as a file or directory, else
/// `trc.json` in `cwd` if present.
pub fn find_config(cwd: &Path, project: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    let Some(project) = project else {
        let candidate = cwd.join(CONFIG_FILE_NAME);
        return Ok(candidate.is_file().then_some(candidate));
    };
    let mut candidate = if project.is_absolute() {
        project.to_path_buf()
    } else {
        cwd.join(project)
    };
    if candidate.is_dir() {
        candidate.push(CONFIG_FILE_NAME);
    }
    if candidate.is_file() {
        Ok(Some(candidate))
    } else {
        Err(ConfigError::ProjectNotFound(candidate))
    }
}

/// Find, load and resolve the configuration for one invocation.
pub fn load_resolved(args: &CliArgs, cwd: &Path) -> Result<ResolvedConfig, ConfigError> {
    let config_path = find_config(cwd, args.project.as_deref())?;
    let config = match &config_path {
        Some(path) => {
            debug!(path = %path.display(), "loading project file");
            load_config(path)?
        }
        None => TrcConfig::default(),
    };
    let base_dir = config_path
        .as_deref()
        .and_then(Path::parent)
        .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
    let mut resolved = resolve(&config, args, &base_dir, cwd)?;
    resolved.config_path = config_path;
    Ok(resolved)
}

/// Merge `config` (paths relative to `base_dir`) with `args` (paths
/// relative to `cwd`).
pub fn resolve(
    config: &TrcConfig,
    args: &CliArgs,
    base_dir: &Path,
    cwd: &Path,
) -> Result<ResolvedConfig, ConfigError> {
    let options = config.compiler_options.clone().unwrap_or_default();

    let level = match args.strictness.as_deref().or(options.strictness.as_deref()) {
        Some(value) => value.parse::<StrictnessLevel>()?,
        None => StrictnessLevel::default(),
    };
    let mut strictness = StrictnessConfig::new(level);
    for (name, Flag(enabled)) in options.checks.iter().flatten() {
        strictness = strictness.with_check(name.parse::<CheckName>()?, *enabled);
    }
    for raw in &args.checks {
        let (name, enabled) = parse_check_flag(raw)?;
        strictness = strictness.with_check(name, enabled);
    }

    let target = match args.target.as_deref().or(options.target.as_deref()) {
        Some(value) => value.parse::<RubyVersion>()?,
        None => RubyVersion::default(),
    };

    let mut warnings = Vec::new();
    let mut experimental = Vec::new();
    let names = options.experimental.iter().flatten().chain(&args.experimental);
    for name in names {
        match name.parse::<ExperimentalFeature>() {
            Ok(feature) if !experimental.contains(&feature) => experimental.push(feature),
            Ok(_) => {}
            Err(err) => {
                warn!(feature = %name, "ignoring unknown experimental feature");
                warnings.push(err.to_string());
            }
        }
    }

    let max_errors = args.max_errors.or(options.max_errors);
    let context = CompilationContext {
        strictness,
        target,
        experimental,
        allow_errors: args.allow_errors || options.allow_errors.unwrap_or(false),
        max_errors: max_errors.unwrap_or(DEFAULT_MAX_ERRORS),
    };

    let out_dir = args
        .out_dir
        .as_ref()
        .map(|dir| cwd.join(dir))
        .or_else(|| config.out_dir.as_ref().map(|dir| base_dir.join(dir)));
    let rbs_dir = args
        .rbs_dir
        .as_ref()
        .map(|dir| cwd.join(dir))
        .or_else(|| config.rbs_dir.as_ref().map(|dir| base_dir.join(dir)));

    Ok(ResolvedConfig {
        context,
        base_dir: base_dir.to_path_buf(),
        include: config.include.clone().unwrap_or_default(),
        exclude: config.exclude.clone().unwrap_or_default(),
        out_dir,
        rbs_dir,
        max_errors,
        warnings,
        config_path: None,
    })
}

/// Parse `name=bool`. A bare `name` turns the check on.
pub fn parse_check_flag(raw: &str) -> Result<(CheckName, bool), ConfigError> {
    let (name, value) = match raw.split_once('=') {
        Some((name, value)) => (name, value),
        None => (raw, "true"),
    };
    let check = name.parse::<CheckName>()?;
    let enabled = parse_bool(value).ok_or_else(|| ConfigError::CheckSyntax(raw.to_string()))?;
    Ok((check, enabled))
}
