//! Diagnostic reports: colored text with source snippets, JSON, JUnit XML.
//!
//! All three render the same diagnostic list. The display limit cuts the
//! list; the summary always carries the full counts.

use colored::Colorize;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt::Write as _;

use trc::common::diagnostics::DiagnosticRelatedInformation;
use trc::common::{Diagnostic, DiagnosticCategory, LineMap};
use trc::{CompilationSummary, FileOutput};

use crate::args::ReportFormat;

pub struct Reporter {
    color: bool,
    limit: Option<usize>,
    sources: FxHashMap<String, (String, LineMap)>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    summary: &'a CompilationSummary,
    diagnostics: Vec<&'a Diagnostic>,
    #[serde(skip_serializing_if = "is_zero")]
    not_shown: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter {
            color,
            limit: None,
            sources: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Register a file's text so snippets can be shown for it.
    pub fn add_source(&mut self, name: &str, text: &str) {
        let map = LineMap::build(text);
        self.sources.insert(name.to_string(), (text.to_string(), map));
    }

    pub fn render(&self, format: ReportFormat, files: &[FileOutput], summary: &CompilationSummary) -> String {
        match format {
            ReportFormat::Text => self.render_text(files, summary),
            ReportFormat::Json => self.render_json(files, summary),
            ReportFormat::Junit => self.render_junit(files, summary),
        }
    }

    /// The shown diagnostics and how many were cut.
    fn visible<'a>(&self, files: &'a [FileOutput]) -> (Vec<&'a Diagnostic>, usize) {
        let all: Vec<&Diagnostic> = files.iter().flat_map(|f| f.diagnostics.iter()).collect();
        match self.limit {
            Some(limit) if all.len() > limit => {
                let hidden = all.len() - limit;
                (all.into_iter().take(limit).collect(), hidden)
            }
            _ => (all, 0),
        }
    }

    // =========================================================================
    // Text
    // =========================================================================

    pub fn render_text(&self, files: &[FileOutput], summary: &CompilationSummary) -> String {
        let (shown, hidden) = self.visible(files);
        let mut out = String::new();
        for diagnostic in shown {
            out.push_str(&self.format_diagnostic(diagnostic));
            out.push_str("\n\n");
        }
        if hidden > 0 {
            let _ = writeln!(out, "... {hidden} more diagnostic{} not shown.", plural(hidden));
        }
        out.push_str(&self.format_summary(summary));
        out.push('\n');
        out
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let mut output = format!(
            "{}:{}:{} - {} {}: {}",
            diagnostic.file,
            diagnostic.line,
            diagnostic.column,
            self.format_category(diagnostic.category),
            self.format_code(diagnostic.code),
            diagnostic.message_text
        );
        if let Some(snippet) = self.format_snippet(diagnostic) {
            output.push_str(&snippet);
        }
        for related in &diagnostic.related_information {
            output.push('\n');
            output.push_str(&self.format_related(related));
        }
        output
    }

    fn format_snippet(&self, diagnostic: &Diagnostic) -> Option<String> {
        let (source, map) = self.sources.get(&diagnostic.file)?;
        if diagnostic.line == 0 {
            return None;
        }
        let line_text = map.line_text(diagnostic.line - 1, source);
        let column = diagnostic.column.saturating_sub(1) as usize;
        let end = column + diagnostic.length.max(1) as usize;

        let mut underline = String::new();
        for (offset, ch) in line_text.char_indices() {
            if offset >= end {
                break;
            }
            let fill = if offset < column { ' ' } else { '~' };
            let width = if ch == '\t' { 4 } else { 1 };
            underline.extend(std::iter::repeat_n(fill, width));
        }
        if !underline.contains('~') {
            underline.push('~');
        }

        let gutter = format!("{:>5}   ", diagnostic.line);
        let underline = if self.color {
            underline.red().to_string()
        } else {
            underline
        };
        let expanded = line_text.replace('\t', "    ");
        Some(format!(
            "\n\n{}{}\n{}{}",
            gutter,
            expanded,
            " ".repeat(gutter.len()),
            underline
        ))
    }

    fn format_related(&self, related: &DiagnosticRelatedInformation) -> String {
        let location = match self.sources.get(&related.file) {
            Some((_, map)) => {
                let position = map.offset_to_position(related.start);
                format!("{}:{}:{}", related.file, position.line + 1, position.character + 1)
            }
            None => related.file.clone(),
        };
        let prefix = if self.color {
            "  related".dimmed().to_string()
        } else {
            "  related".to_string()
        };
        format!("{prefix}: {location} - {}", related.message_text)
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = category.as_str();
        if !self.color {
            return label.to_string();
        }
        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Hint => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        let label = format!("TRC{code}");
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }

    pub fn format_summary(&self, summary: &CompilationSummary) -> String {
        if summary.errors == 0 && summary.warnings == 0 {
            return format!("Checked {} file{}. No errors.", summary.files, plural(summary.files));
        }
        let mut parts = Vec::new();
        if summary.errors > 0 {
            parts.push(format!("{} error{}", summary.errors, plural(summary.errors)));
        }
        if summary.warnings > 0 {
            parts.push(format!("{} warning{}", summary.warnings, plural(summary.warnings)));
        }
        let line = format!(
            "Found {} in {} file{}.",
            parts.join(" and "),
            summary.files,
            plural(summary.files)
        );
        if self.color && summary.errors > 0 {
            line.red().to_string()
        } else {
            line
        }
    }

    // =========================================================================
    // JSON
    // =========================================================================

    pub fn render_json(&self, files: &[FileOutput], summary: &CompilationSummary) -> String {
        let (diagnostics, not_shown) = self.visible(files);
        let report = JsonReport {
            summary,
            diagnostics,
            not_shown,
        };
        // Every field is a plain string, number or enum tag.
        serde_json::to_string_pretty(&report).unwrap_or_default() + "\n"
    }

    // =========================================================================
    // JUnit
    // =========================================================================

    /// One test case per file; each error is a `<failure>`.
    pub fn render_junit(&self, files: &[FileOutput], summary: &CompilationSummary) -> String {
        let (shown, not_shown) = self.visible(files);
        let failing = files.iter().filter(|f| f.error_count > 0).count();

        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            out,
            "<testsuites name=\"trc\" tests=\"{}\" failures=\"{}\" errors=\"{}\">",
            summary.files, failing, summary.errors
        );
        let _ = writeln!(
            out,
            "  <testsuite name=\"typecheck\" tests=\"{}\" failures=\"{}\">",
            summary.files, failing
        );
        for file in files {
            let name = xml_escape(&file.file);
            let diagnostics: Vec<&Diagnostic> = shown.iter().copied().filter(|d| d.file == file.file).collect();
            if diagnostics.is_empty() {
                let _ = writeln!(out, "    <testcase name=\"{name}\" classname=\"trc\"/>");
                continue;
            }
            let _ = writeln!(out, "    <testcase name=\"{name}\" classname=\"trc\">");
            let mut other = Vec::new();
            for diagnostic in diagnostics {
                let location = format!("{}:{}:{}", diagnostic.file, diagnostic.line, diagnostic.column);
                if diagnostic.is_error() {
                    let _ = writeln!(
                        out,
                        "      <failure type=\"{}\" message=\"{}\">{} TRC{}</failure>",
                        diagnostic.kind.name(),
                        xml_escape(&diagnostic.message_text),
                        xml_escape(&location),
                        diagnostic.code
                    );
                } else {
                    other.push(format!(
                        "{} {} {} TRC{}: {}",
                        location,
                        diagnostic.category.as_str(),
                        diagnostic.kind.name(),
                        diagnostic.code,
                        diagnostic.message_text
                    ));
                }
            }
            if !other.is_empty() {
                let _ = writeln!(out, "      <system-out>{}</system-out>", xml_escape(&other.join("\n")));
            }
            out.push_str("    </testcase>\n");
        }
        if not_shown > 0 {
            let _ = writeln!(out, "    <system-err>{not_shown} more diagnostics not shown</system-err>");
        }
        out.push_str("  </testsuite>\n</testsuites>\n");
        out
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
