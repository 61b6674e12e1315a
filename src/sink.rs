//! Append-only diagnostics sink shared by parallel workers.

use dashmap::DashMap;
use trc_common::Diagnostic;

/// Diagnostics keyed by file name. Workers append concurrently; the driver
/// drains each file once every phase is done.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    files: DashMap<String, Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        self.files
            .entry(diagnostic.file.clone())
            .or_default()
            .push(diagnostic);
    }

    pub fn extend<I>(&self, file: &str, diagnostics: I)
    where
        I: IntoIterator<Item = Diagnostic>,
    {
        let mut entry = self.files.entry(file.to_string()).or_default();
        entry.extend(diagnostics);
    }

    /// Remove and return a file's diagnostics, ordered by position.
    pub fn take(&self, file: &str) -> Vec<Diagnostic> {
        let mut diagnostics = self.files.remove(file).map(|(_, d)| d).unwrap_or_default();
        diagnostics.sort_by_key(|d| (d.start, d.code));
        diagnostics
    }

    pub fn len(&self) -> usize {
        self.files.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
