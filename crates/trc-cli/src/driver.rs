//! One-shot compilation: resolve the project, compile, write artifacts,
//! report, and pick the exit code.

use anyhow::{Context, Result};
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span};

use trc::{Compilation, CompilationCache, CompilationSummary, EmitSettings, FileOutput, SourceInput, compile_with_cache};

use crate::args::{CliArgs, ReportFormat};
use crate::config::{ConfigError, ResolvedConfig, load_resolved};
use crate::fs::{SourceFilter, discover_sources, output_path, read_sources, write_file};
use crate::reporter::Reporter;

pub const EXIT_SUCCESS: i32 = 0;
/// Syntax errors, unsupported syntax, or an I/O failure.
pub const EXIT_COMPILE_ERROR: i32 = 1;
pub const EXIT_TYPE_ERROR: i32 = 2;
pub const EXIT_CONFIG_ERROR: i32 = 3;

/// The resolved configuration and the input files it selects.
#[derive(Debug, Clone)]
pub struct Project {
    pub config: ResolvedConfig,
    pub cwd: PathBuf,
    /// Files and directories the inputs were discovered from.
    pub roots: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

impl Project {
    pub fn load(args: &CliArgs, cwd: &Path) -> Result<Project> {
        let config = load_resolved(args, cwd)?;
        let roots = if args.inputs.is_empty() {
            vec![config.base_dir.clone()]
        } else {
            args.inputs.iter().map(|input| cwd.join(input)).collect()
        };
        let mut project = Project {
            config,
            cwd: cwd.to_path_buf(),
            roots,
            files: Vec::new(),
        };
        project.rediscover()?;
        Ok(project)
    }

    /// Walk the roots again, picking up added and removed files.
    pub fn rediscover(&mut self) -> Result<()> {
        let filter = SourceFilter::new(&self.config.include, &self.config.exclude)?;
        self.files = discover_sources(&self.roots, &self.config.base_dir, &filter)?;
        if self.files.is_empty() {
            return Err(ConfigError::NoInputs.into());
        }
        Ok(())
    }

    pub fn emit_settings(&self, args: &CliArgs) -> EmitSettings {
        EmitSettings {
            ruby: !args.no_emit,
            rbs: !args.no_emit,
            parallel: args.parallel(),
        }
    }
}

/// A finished compilation together with the texts it was compiled from.
pub struct BuildOutcome {
    pub sources: Vec<SourceInput>,
    pub compilation: Compilation,
}

/// Read and compile every project file. Nothing is written.
pub fn compile_project(project: &Project, args: &CliArgs, cache: &mut CompilationCache) -> Result<BuildOutcome> {
    let _span = info_span!("build", files = project.files.len()).entered();
    let sources = read_sources(&project.files, &project.cwd)?;
    let settings = project.emit_settings(args);
    let options = &project.config.context;

    let compilation = match args.jobs {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .context("failed to start worker threads")?;
            debug!(jobs, "using dedicated worker pool");
            pool.install(|| compile_with_cache(&sources, options, settings, cache))
        }
        None => compile_with_cache(&sources, options, settings, cache),
    };
    Ok(BuildOutcome { sources, compilation })
}

/// Write every produced artifact. Returns the paths written.
pub fn write_outputs(project: &Project, files: &[FileOutput]) -> Result<Vec<PathBuf>> {
    let config = &project.config;
    let mut written = Vec::new();
    for (input, output) in project.files.iter().zip(files) {
        if let Some(ruby) = &output.ruby {
            let path = output_path(input, &config.base_dir, config.out_dir.as_deref(), "rb");
            write_file(&path, ruby)?;
            written.push(path);
        }
        if let Some(rbs) = &output.rbs {
            let path = output_path(input, &config.base_dir, config.rbs_dir.as_deref(), "rbs");
            write_file(&path, rbs)?;
            written.push(path);
        }
    }
    info!(count = written.len(), "wrote outputs");
    Ok(written)
}

pub fn exit_code(summary: &CompilationSummary) -> i32 {
    if summary.syntax_errors > 0 {
        EXIT_COMPILE_ERROR
    } else if summary.errors > 0 {
        EXIT_TYPE_ERROR
    } else {
        EXIT_SUCCESS
    }
}

/// Exit code for a failure that stopped the run before a report.
pub fn exit_code_for_error(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() {
        EXIT_CONFIG_ERROR
    } else {
        EXIT_COMPILE_ERROR
    }
}

pub fn use_color(args: &CliArgs) -> bool {
    args.pretty.unwrap_or_else(|| std::io::stderr().is_terminal())
}

/// Render the report for `outcome` into `out`.
pub fn report(project: &Project, args: &CliArgs, outcome: &BuildOutcome, out: &mut dyn Write) -> Result<()> {
    let color = use_color(args) && args.format == ReportFormat::Text;
    let mut reporter = Reporter::new(color).with_limit(project.config.max_errors);
    for source in &outcome.sources {
        reporter.add_source(&source.name, &source.text);
    }
    let compilation = &outcome.compilation;
    let rendered = reporter.render(args.format, &compilation.files, &compilation.summary);
    out.write_all(rendered.as_bytes()).context("failed to write report")
}

/// Compile once and report. Returns the process exit code.
pub fn run(args: &CliArgs, cwd: &Path, out: &mut dyn Write) -> Result<i32> {
    let project = Project::load(args, cwd)?;
    if args.format == ReportFormat::Text {
        for warning in &project.config.warnings {
            writeln!(out, "warning: {warning}").context("failed to write report")?;
        }
    }

    let mut cache = CompilationCache::new();
    let outcome = compile_project(&project, args, &mut cache)?;
    if !args.no_emit {
        write_outputs(&project, &outcome.compilation.files)?;
    }
    report(&project, args, &outcome, out)?;
    Ok(exit_code(&outcome.compilation.summary))
}
