//! Watch mode.
//!
//! File events are coalesced per path by a [`Debouncer`]; every event also
//! bumps the path's generation in a [`GenerationTracker`]. A build records
//! the generations it started from, and a build that finishes after any of
//! its files moved on is dropped without writing or reporting. The newer
//! events are still pending, so the next build picks them up.

use anyhow::{Context, Result, bail};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use trc::CompilationCache;

use crate::args::CliArgs;
use crate::config::CONFIG_FILE_NAME;
use crate::driver::{Project, compile_project, exit_code, report, write_outputs};
use crate::fs::{display_name, is_source_file};

/// How long to block when nothing is pending.
const IDLE_POLL: Duration = Duration::from_secs(3600);

// =============================================================================
// Debouncer
// =============================================================================

/// Coalesces events per path. A path becomes ready once no event for it
/// arrived for a full window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: FxHashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            pending: FxHashMap::default(),
        }
    }

    /// Record an event, restarting the window for `path`.
    pub fn record(&mut self, path: PathBuf, now: Instant) {
        self.pending.insert(path, now);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// When the earliest pending path becomes ready.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|last| *last + self.window).min()
    }

    /// Remove and return the paths that are ready at `now`, sorted.
    pub fn take_ready(&mut self, now: Instant) -> Vec<PathBuf> {
        let window = self.window;
        let mut ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, last)| now.saturating_duration_since(**last) >= window)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &ready {
            self.pending.remove(path);
        }
        ready.sort();
        ready
    }
}

// =============================================================================
// GenerationTracker
// =============================================================================

/// The generations of a set of files when a build started.
pub type Snapshot = Vec<(PathBuf, u64)>;

/// Per-path change counters for last-write-wins supersession.
#[derive(Debug, Default)]
pub struct GenerationTracker {
    generations: FxHashMap<PathBuf, u64>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note a change to `path`. Returns its new generation.
    pub fn bump(&mut self, path: &Path) -> u64 {
        let generation = self.generations.entry(path.to_path_buf()).or_insert(0);
        *generation += 1;
        *generation
    }

    /// Zero for a path that never changed.
    pub fn current(&self, path: &Path) -> u64 {
        self.generations.get(path).copied().unwrap_or(0)
    }

    pub fn snapshot<'a>(&self, paths: impl IntoIterator<Item = &'a PathBuf>) -> Snapshot {
        paths.into_iter().map(|path| (path.clone(), self.current(path))).collect()
    }

    /// Paths that changed since `snapshot` was taken.
    pub fn superseded(&self, snapshot: &Snapshot) -> Vec<PathBuf> {
        snapshot
            .iter()
            .filter(|(path, generation)| self.current(path) != *generation)
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn is_current(&self, snapshot: &Snapshot) -> bool {
        self.superseded(snapshot).is_empty()
    }
}

// =============================================================================
// Session
// =============================================================================

struct WatchSession<'a> {
    args: &'a CliArgs,
    cwd: PathBuf,
    project: Project,
    cache: CompilationCache,
    debouncer: Debouncer,
    generations: GenerationTracker,
    /// Set when trc.json changed since the last build.
    config_changed: bool,
}

impl WatchSession<'_> {
    /// Feed one watcher event into the debouncer.
    fn observe(&mut self, event: Event, now: Instant) {
        if matches!(event.kind, EventKind::Access(_)) {
            return;
        }
        for path in event.paths {
            let is_config = path.file_name().is_some_and(|name| name == CONFIG_FILE_NAME);
            if !is_config && !is_source_file(&path) {
                continue;
            }
            if is_config {
                self.config_changed = true;
            }
            self.generations.bump(&path);
            self.debouncer.record(path, now);
        }
    }

    fn drain(&mut self, events: &Receiver<notify::Result<Event>>) {
        while let Ok(event) = events.try_recv() {
            match event {
                Ok(event) => self.observe(event, Instant::now()),
                Err(err) => warn!(error = %err, "watch error"),
            }
        }
    }

    /// Rebuild after `changed` settled. A build superseded while it ran is
    /// dropped.
    fn rebuild(
        &mut self,
        changed: &[PathBuf],
        events: &Receiver<notify::Result<Event>>,
        out: &mut dyn Write,
    ) -> Result<()> {
        if std::mem::take(&mut self.config_changed) {
            info!("project file changed, reloading");
            self.project = Project::load(self.args, &self.cwd)?;
            self.cache.clear();
        } else {
            self.project.rediscover()?;
        }
        for path in changed.iter().filter(|path| !path.exists()) {
            let forgotten = self.cache.invalidate(&display_name(path, &self.cwd));
            debug!(path = %path.display(), declared = forgotten.len(), "file removed");
        }

        let snapshot = self.generations.snapshot(&self.project.files);
        let outcome = compile_project(&self.project, self.args, &mut self.cache)?;

        self.drain(events);
        let superseded = self.generations.superseded(&snapshot);
        if !superseded.is_empty() {
            debug!(files = superseded.len(), "dropping superseded build");
            return Ok(());
        }

        if !self.args.no_emit {
            write_outputs(&self.project, &outcome.compilation.files)?;
        }
        report(&self.project, self.args, &outcome, out)?;
        let summary = &outcome.compilation.summary;
        writeln!(
            out,
            "[watch] rebuilt {} file{} ({} from cache), exit status {}. Watching for changes.",
            summary.files,
            if summary.files == 1 { "" } else { "s" },
            summary.cached,
            exit_code(summary)
        )
        .context("failed to write report")?;
        Ok(())
    }
}

/// Compile, then keep recompiling on change. Only returns on failure.
pub fn run(args: &CliArgs, cwd: &Path, out: &mut dyn Write) -> Result<i32> {
    let project = Project::load(args, cwd)?;
    let (sender, events) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(sender).context("failed to start file watcher")?;
    for root in &project.roots {
        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;
    }
    if let Some(config) = &project.config.config_path
        && !project.roots.iter().any(|root| config.starts_with(root))
    {
        watcher
            .watch(config, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", config.display()))?;
    }

    let mut session = WatchSession {
        args,
        cwd: cwd.to_path_buf(),
        project,
        cache: CompilationCache::new(),
        debouncer: Debouncer::new(Duration::from_millis(args.debounce_ms)),
        generations: GenerationTracker::new(),
        config_changed: false,
    };
    session.rebuild(&[], &events, out)?;

    loop {
        let timeout = session
            .debouncer
            .next_deadline()
            .map_or(IDLE_POLL, |deadline| deadline.saturating_duration_since(Instant::now()));
        match events.recv_timeout(timeout) {
            Ok(Ok(event)) => session.observe(event, Instant::now()),
            Ok(Err(err)) => warn!(error = %err, "watch error"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => bail!("file watcher stopped"),
        }

        let ready = session.debouncer.take_ready(Instant::now());
        if ready.is_empty() {
            continue;
        }
        debug!(paths = ready.len(), pending = session.debouncer.pending(), "changes settled");
        // A broken edit (no inputs, unreadable file) is reported and the
        // watch continues.
        if let Err(err) = session.rebuild(&ready, &events, out) {
            writeln!(out, "error: {err:#}").context("failed to write report")?;
        }
    }
}
