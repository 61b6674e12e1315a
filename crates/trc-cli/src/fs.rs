//! Source discovery and output paths.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use trc::SourceInput;

use crate::config::ConfigError;

pub const SOURCE_EXTENSION: &str = "trb";

/// Include/exclude globs, matched against paths relative to the project
/// directory. An empty include list accepts everything.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl SourceFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        let include = if include.is_empty() {
            None
        } else {
            Some(build_glob_set(include)?)
        };
        Ok(SourceFilter {
            include,
            exclude: build_glob_set(exclude)?,
        })
    }

    pub fn accept_all() -> Self {
        SourceFilter {
            include: None,
            exclude: GlobSet::empty(),
        }
    }

    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.exclude.is_match(relative)
    }

    pub fn matches(&self, relative: &Path) -> bool {
        if self.is_excluded(relative) {
            return false;
        }
        self.include.as_ref().is_none_or(|set| set.is_match(relative))
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::Glob {
        pattern: patterns.join(", "),
        source,
    })
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Expand `roots` into a sorted, de-duplicated list of `.trb` files.
///
/// Files named explicitly are taken as given. Directories are walked, and
/// each file found is kept when `filter` accepts its path relative to
/// `base_dir`.
pub fn discover_sources(roots: &[PathBuf], base_dir: &Path, filter: &SourceFilter) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.is_dir() {
            return Err(ConfigError::InputNotFound(root.clone()).into());
        }
        let walker = WalkDir::new(root).follow_links(true).into_iter().filter_entry(|entry| {
            let relative = entry.path().strip_prefix(base_dir).unwrap_or(entry.path());
            entry.depth() == 0 || !filter.is_excluded(relative)
        });
        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                continue;
            }
            let relative = entry.path().strip_prefix(base_dir).unwrap_or(entry.path());
            if filter.matches(relative) {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();
    files.dedup();
    debug!(count = files.len(), "discovered sources");
    Ok(files)
}

/// Read every file. Diagnostics name a file by its path relative to `cwd`
/// when it has one.
pub fn read_sources(paths: &[PathBuf], cwd: &Path) -> Result<Vec<SourceInput>> {
    paths
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(SourceInput::new(display_name(path, cwd), text))
        })
        .collect()
}

pub fn display_name(path: &Path, cwd: &Path) -> String {
    path.strip_prefix(cwd).unwrap_or(path).display().to_string()
}

/// Where the artifact with `extension` for `input` goes: next to the input,
/// or at the same relative position under `out_dir`.
pub fn output_path(input: &Path, base_dir: &Path, out_dir: Option<&Path>, extension: &str) -> PathBuf {
    let target = match out_dir {
        Some(dir) => {
            let relative = input
                .strip_prefix(base_dir)
                .unwrap_or_else(|_| Path::new(input.file_name().unwrap_or(input.as_os_str())));
            dir.join(relative)
        }
        None => input.to_path_buf(),
    };
    target.with_extension(extension)
}

pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
