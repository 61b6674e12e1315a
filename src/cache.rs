//! Per-file compilation cache.
//!
//! An entry is keyed by file name and holds the parsed tree for one source
//! hash, the check/emit output for one (source hash, options fingerprint)
//! pair, and what the file declares and references. Binding always runs
//! over the whole program; only parsing and checking are skipped.
//!
//! When a file's declaration surface changes, every file that references a
//! name it declared (before or after the change) loses its output. The
//! comparison is by name, so it over-invalidates rather than miss a
//! dependent.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use trc_binder::FileDeclarations;
use trc_common::CompilationContext;
use trc_parser::ParsedFile;
use tracing::debug;

use crate::program::FileOutput;

pub fn hash_text(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Hash of every option that can change a file's diagnostics or output.
pub fn options_fingerprint(options: &CompilationContext) -> u64 {
    options.fingerprint()
}

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub source_hash: u64,
    pub parsed: Arc<ParsedFile>,
    /// `None` until checked, and again after invalidation.
    pub output: Option<(u64, FileOutput)>,
    pub declarations: FileDeclarations,
}

#[derive(Debug, Default)]
pub struct CompilationCache {
    entries: FxHashMap<String, CacheEntry>,
}

impl CompilationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entry(&self, file: &str) -> Option<&CacheEntry> {
        self.entries.get(file)
    }

    /// The cached tree, when the source is unchanged.
    pub fn parsed(&self, file: &str, source_hash: u64) -> Option<Arc<ParsedFile>> {
        self.entries
            .get(file)
            .filter(|entry| entry.source_hash == source_hash)
            .map(|entry| Arc::clone(&entry.parsed))
    }

    /// The cached output, when neither the source nor the options changed.
    pub fn output(&self, file: &str, source_hash: u64, fingerprint: u64) -> Option<&FileOutput> {
        let entry = self.entries.get(file)?;
        if entry.source_hash != source_hash {
            return None;
        }
        match &entry.output {
            Some((cached_fingerprint, output)) if *cached_fingerprint == fingerprint => Some(output),
            _ => None,
        }
    }

    pub fn surface_hash(&self, file: &str) -> Option<u64> {
        self.entries.get(file).map(|entry| entry.declarations.surface_hash)
    }

    /// Record a freshly parsed file. A new source hash drops the old output.
    pub fn store_parsed(&mut self, file: &str, source_hash: u64, parsed: Arc<ParsedFile>) {
        match self.entries.get_mut(file) {
            Some(entry) if entry.source_hash == source_hash => entry.parsed = parsed,
            Some(entry) => {
                entry.source_hash = source_hash;
                entry.parsed = parsed;
                entry.output = None;
            }
            None => {
                self.entries.insert(
                    file.to_string(),
                    CacheEntry {
                        source_hash,
                        parsed,
                        output: None,
                        declarations: FileDeclarations::default(),
                    },
                );
            }
        }
    }

    pub fn store_declarations(&mut self, file: &str, declarations: FileDeclarations) {
        if let Some(entry) = self.entries.get_mut(file) {
            entry.declarations = declarations;
        }
    }

    pub fn store_output(&mut self, file: &str, fingerprint: u64, output: FileOutput) {
        if let Some(entry) = self.entries.get_mut(file) {
            entry.output = Some((fingerprint, output));
        }
    }

    /// Forget a file entirely. Returns the names it declared, which its
    /// dependents must be invalidated for.
    pub fn invalidate(&mut self, file: &str) -> Vec<String> {
        self.entries
            .remove(file)
            .map(|entry| entry.declarations.declared)
            .unwrap_or_default()
    }

    /// Drop entries for files that are no longer inputs, returning the
    /// names they declared.
    pub fn retain_files(&mut self, files: &FxHashSet<&str>) -> Vec<String> {
        let removed: Vec<String> = self
            .entries
            .keys()
            .filter(|name| !files.contains(name.as_str()))
            .cloned()
            .collect();
        removed.iter().flat_map(|name| self.invalidate(name)).collect()
    }

    /// Clear the output of every file that references one of `names`.
    /// Returns the affected files.
    pub fn invalidate_dependents(&mut self, names: &FxHashSet<String>) -> Vec<String> {
        if names.is_empty() {
            return Vec::new();
        }
        let mut affected = Vec::new();
        for (file, entry) in &mut self.entries {
            if entry.output.is_none() {
                continue;
            }
            if entry.declarations.referenced.iter().any(|name| names.contains(name)) {
                entry.output = None;
                affected.push(file.clone());
            }
        }
        affected.sort();
        debug!(names = names.len(), affected = affected.len(), "invalidated dependents");
        affected
    }
}
