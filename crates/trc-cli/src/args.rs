use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use trc_common::limits::DEFAULT_DEBOUNCE_MS;

/// CLI arguments for the trc binary.
///
/// Option values that name a level, check, target or feature are kept as
/// strings here and validated while resolving the configuration, so a bad
/// value is a configuration error (exit code 3) rather than a usage error.
#[derive(Parser, Debug, Default)]
#[command(
    name = "trc",
    version,
    about = "Gradual type checker and compiler for typed Ruby (.trb)"
)]
pub struct CliArgs {
    /// Files or directories to compile. Directories are searched for `*.trb`.
    #[arg(value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Path to trc.json or a directory containing it.
    #[arg(short = 'p', long = "project")]
    pub project: Option<PathBuf>,

    // ==================== Checking ====================
    /// Strictness level: strict, standard or permissive.
    #[arg(long)]
    pub strictness: Option<String>,

    /// Turn one check on or off, e.g. `--check strict_nil=true`. Repeatable.
    #[arg(long = "check", value_name = "NAME=BOOL")]
    pub checks: Vec<String>,

    /// Ruby version the emitted code must run on (2.6 to 3.4).
    #[arg(short = 't', long)]
    pub target: Option<String>,

    /// Enable an experimental feature. Repeatable or comma separated.
    #[arg(long, value_delimiter = ',')]
    pub experimental: Vec<String>,

    /// Emit Ruby and RBS even when files have errors.
    #[arg(long = "allow-errors")]
    pub allow_errors: bool,

    /// Show at most this many diagnostics. Counts in the summary stay exact.
    #[arg(long = "max-errors")]
    pub max_errors: Option<usize>,

    // ==================== Scheduling ====================
    /// Check files on a worker pool.
    #[arg(long)]
    pub parallel: bool,

    /// Number of worker threads. Implies `--parallel`.
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    // ==================== Output ====================
    /// Write `.rb` files under this directory instead of next to the inputs.
    #[arg(long = "out-dir")]
    pub out_dir: Option<PathBuf>,

    /// Write `.rbs` files under this directory instead of next to the inputs.
    #[arg(long = "rbs-dir")]
    pub rbs_dir: Option<PathBuf>,

    /// Check only. Write nothing.
    #[arg(long = "no-emit")]
    pub no_emit: bool,

    /// Diagnostic report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Colorize text reports. Defaults to whether stderr is a terminal.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub pretty: Option<bool>,

    // ==================== Watch ====================
    /// Watch inputs and recompile on change.
    #[arg(short = 'w', long)]
    pub watch: bool,

    /// Coalescing window for file events, in milliseconds.
    #[arg(long = "debounce-ms", default_value_t = DEFAULT_DEBOUNCE_MS)]
    pub debounce_ms: u64,
}

impl CliArgs {
    pub fn parallel(&self) -> bool {
        self.parallel || self.jobs.is_some()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Junit,
}
