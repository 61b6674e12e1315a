//! Whole-program compilation.
//!
//! Files are parsed in parallel, bound together into one frozen
//! [`DeclarationTable`](trc_binder::DeclarationTable), then checked and
//! emitted in parallel. Diagnostics from every phase go to a
//! [`DiagnosticSink`] and are drained per file at the end, so the result is
//! the same whichever worker finished first.

use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;
use trc_binder::{DeclarationTable, FileId, bind_program};
use trc_checker::check_file;
use trc_common::{CompilationContext, Diagnostic, DiagnosticCategory};
use trc_emitter::{emit_rbs, emit_ruby};
use trc_parser::{ParseOptions, ParsedFile, parse_source};
use trc_solver::TypeInterner;
use tracing::{debug, info, info_span};

use crate::cache::{CompilationCache, hash_text, options_fingerprint};
use crate::sink::DiagnosticSink;

/// One input file. `name` is how diagnostics refer to it.
#[derive(Clone, Debug)]
pub struct SourceInput {
    pub name: String,
    pub text: String,
}

impl SourceInput {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        SourceInput {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Which artifacts to produce, and whether to use the worker pool.
#[derive(Clone, Copy, Debug)]
pub struct EmitSettings {
    pub ruby: bool,
    pub rbs: bool,
    pub parallel: bool,
}

impl Default for EmitSettings {
    fn default() -> Self {
        EmitSettings {
            ruby: true,
            rbs: true,
            parallel: true,
        }
    }
}

/// Everything produced for one file.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FileOutput {
    pub file: String,
    pub diagnostics: Vec<Diagnostic>,
    /// All errors, including any the checker stopped reporting.
    pub error_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruby: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rbs: Option<String>,
}

impl FileOutput {
    pub fn has_syntax_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error() && d.kind.is_syntax())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CompilationSummary {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
    pub hints: usize,
    /// Errors of the syntax kinds, a subset of `errors`.
    pub syntax_errors: usize,
    /// Files for which at least one artifact was produced.
    pub emitted: usize,
    /// Files whose output came from the cache.
    pub cached: usize,
}

impl CompilationSummary {
    fn add(&mut self, output: &FileOutput) {
        self.files += 1;
        self.errors += output.error_count;
        for diagnostic in &output.diagnostics {
            match diagnostic.category {
                DiagnosticCategory::Error => {
                    if diagnostic.kind.is_syntax() {
                        self.syntax_errors += 1;
                    }
                }
                DiagnosticCategory::Warning => self.warnings += 1,
                DiagnosticCategory::Hint => self.hints += 1,
            }
        }
        if output.ruby.is_some() || output.rbs.is_some() {
            self.emitted += 1;
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

pub struct Compilation {
    /// In input order.
    pub files: Vec<FileOutput>,
    pub summary: CompilationSummary,
    pub table: Arc<DeclarationTable>,
}

impl Compilation {
    pub fn file(&self, name: &str) -> Option<&FileOutput> {
        self.files.iter().find(|f| f.file == name)
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.files.iter().flat_map(|f| f.diagnostics.iter())
    }
}

/// Compile `inputs` from scratch.
pub fn compile(inputs: &[SourceInput], options: &CompilationContext, settings: EmitSettings) -> Compilation {
    let mut cache = CompilationCache::new();
    compile_with_cache(inputs, options, settings, &mut cache)
}

/// Compile `inputs`, reusing trees and outputs from `cache` where the source,
/// the options and the declarations a file depends on are unchanged.
pub fn compile_with_cache(
    inputs: &[SourceInput],
    options: &CompilationContext,
    settings: EmitSettings,
    cache: &mut CompilationCache,
) -> Compilation {
    let _span = info_span!("compile", files = inputs.len()).entered();
    let fingerprint = options_fingerprint(options);
    let hashes: Vec<u64> = inputs.iter().map(|input| hash_text(&input.text)).collect();
    let sink = DiagnosticSink::new();

    // Parse
    let parse_options = ParseOptions {
        max_errors: options.max_errors,
        ..ParseOptions::default()
    };
    let files: Vec<Arc<ParsedFile>> = {
        let _span = info_span!("parse").entered();
        let parse = |i: usize| match cache.parsed(&inputs[i].name, hashes[i]) {
            Some(parsed) => parsed,
            None => Arc::new(parse_source(&inputs[i].name, &inputs[i].text, parse_options)),
        };
        map_files(settings.parallel, inputs.len(), parse)
    };
    for (i, file) in files.iter().enumerate() {
        cache.store_parsed(&inputs[i].name, hashes[i], Arc::clone(file));
        sink.extend(&file.file_name, file.diagnostics.iter().cloned());
    }

    // Bind
    let bound = bind_program(Arc::new(TypeInterner::new()), &files);
    for diagnostic in bound.diagnostics.iter().cloned() {
        sink.push(diagnostic);
    }
    let table = bound.table;
    invalidate_changed_surfaces(inputs, &table, cache);

    // Check and emit
    let reused: Vec<Option<FileOutput>> = inputs
        .iter()
        .zip(&hashes)
        .map(|(input, &hash)| cache.output(&input.name, hash, fingerprint).cloned())
        .collect();
    let fresh: Vec<Option<FileOutput>> = {
        let _span = info_span!("check").entered();
        let work = |i: usize| {
            if reused[i].is_some() {
                return None;
            }
            Some(check_and_emit(&table, FileId::input(i), &files[i], options, settings, &sink))
        };
        map_files(settings.parallel, inputs.len(), work)
    };

    let mut summary = CompilationSummary::default();
    let mut outputs = Vec::with_capacity(inputs.len());
    for (i, (cached, fresh)) in reused.into_iter().zip(fresh).enumerate() {
        let output = match (cached, fresh) {
            (Some(cached), _) => {
                summary.cached += 1;
                cached
            }
            (None, Some(fresh)) => {
                cache.store_output(&inputs[i].name, fingerprint, fresh.clone());
                fresh
            }
            (None, None) => FileOutput {
                file: inputs[i].name.clone(),
                ..FileOutput::default()
            },
        };
        summary.add(&output);
        outputs.push(output);
    }

    info!(
        files = summary.files,
        errors = summary.errors,
        warnings = summary.warnings,
        cached = summary.cached,
        "compilation finished"
    );
    Compilation {
        files: outputs,
        summary,
        table,
    }
}

/// Record each file's new declarations and clear dependents of any file
/// whose surface changed.
fn invalidate_changed_surfaces(inputs: &[SourceInput], table: &DeclarationTable, cache: &mut CompilationCache) {
    let current: FxHashSet<&str> = inputs.iter().map(|input| input.name.as_str()).collect();
    let mut changed: FxHashSet<String> = cache.retain_files(&current).into_iter().collect();

    for (i, input) in inputs.iter().enumerate() {
        let Some(declarations) = table.file_declarations(FileId::input(i)) else {
            continue;
        };
        if let Some(previous) = cache.entry(&input.name).map(|entry| &entry.declarations)
            && previous.surface_hash != declarations.surface_hash
        {
            debug!(file = %input.name, "declaration surface changed");
            changed.extend(previous.declared.iter().cloned());
            changed.extend(declarations.declared.iter().cloned());
        }
        cache.store_declarations(&input.name, declarations.clone());
    }
    cache.invalidate_dependents(&changed);
}

fn check_and_emit(
    table: &DeclarationTable,
    file_id: FileId,
    file: &ParsedFile,
    options: &CompilationContext,
    settings: EmitSettings,
    sink: &DiagnosticSink,
) -> FileOutput {
    let result = check_file(table, file_id, options);
    let reported_by_checker = result.diagnostics.iter().filter(|d| d.is_error()).count();
    let hidden = result.error_count.saturating_sub(reported_by_checker);
    sink.extend(&file.file_name, result.diagnostics);

    // Parse and bind diagnostics are already in the sink.
    let diagnostics = sink.take(&file.file_name);
    let error_count = diagnostics.iter().filter(|d| d.is_error()).count() + hidden;

    let emit = options.allow_errors || error_count == 0;
    let ruby = (emit && settings.ruby).then(|| emit_ruby(file, options));
    let rbs = (emit && settings.rbs).then(|| emit_rbs(table, file_id, &result.types));
    if !emit {
        debug!(file = %file.file_name, errors = error_count, "skipping emit");
    }
    FileOutput {
        file: file.file_name.clone(),
        diagnostics,
        error_count,
        ruby,
        rbs,
    }
}

/// Run `f` for every file index, on the rayon pool when `parallel`.
fn map_files<T, F>(parallel: bool, len: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if parallel {
        (0..len).into_par_iter().map(f).collect()
    } else {
        (0..len).map(f).collect()
    }
}
