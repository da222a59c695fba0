//! Filesystem events of a watched visual: debouncing and classification
//! into the remote filesystem actions.

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

pub const DEBOUNCE: Duration = Duration::from_millis(200);

/// Remote filesystem action; the value doubles as endpoint name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsAction {
    Add,
    Change,
    Unlink,
    Mkdir,
    Delete,
}

impl FsAction {
    pub fn endpoint(&self) -> &'static str {
        match self {
            FsAction::Add => "add",
            FsAction::Change => "change",
            FsAction::Unlink => "unlink",
            FsAction::Mkdir => "mkdir",
            FsAction::Delete => "delete",
        }
    }

    /// Whether the payload carries file contents.
    pub fn has_contents(&self) -> bool {
        matches!(self, FsAction::Add | FsAction::Change)
    }
}

/// Paths inside `.git` are never synced.
pub fn is_ignored(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == ".git"))
}

/// Forward-slash form of a relative path, as the remote expects it.
pub fn to_posix(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Remembers which relative paths are known files and directories so that
/// an event can be told apart as creation, modification or removal.
#[derive(Debug, Default, Clone)]
pub struct Tracker {
    files: HashSet<PathBuf>,
    dirs: HashSet<PathBuf>,
}

impl Tracker {
    /// Tracks everything currently below `base`.
    pub fn scan(base: &Path) -> Self {
        let mut tracker = Tracker::default();
        for entry in walkdir::WalkDir::new(base)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
            .filter_map(Result::ok)
        {
            let Ok(relative) = entry.path().strip_prefix(base) else {
                continue;
            };
            if entry.file_type().is_dir() {
                tracker.dirs.insert(relative.to_path_buf());
            } else {
                tracker.files.insert(relative.to_path_buf());
            }
        }
        tracker
    }

    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    /// Classifies `relative` by looking at `base` now.
    pub fn classify(&mut self, base: &Path, relative: &Path) -> Option<FsAction> {
        if is_ignored(relative) {
            return None;
        }
        let kind = std::fs::symlink_metadata(base.join(relative))
            .ok()
            .map(|meta| meta.is_dir());
        self.observe(relative, kind)
    }

    /// Like [`Tracker::classify`], but a new directory also yields the
    /// actions for everything already inside it. A folder moved or copied
    /// into the visual raises one event for itself and none for its contents.
    pub fn classify_all(&mut self, base: &Path, relative: &Path) -> Vec<(PathBuf, FsAction)> {
        let Some(action) = self.classify(base, relative) else {
            return Vec::new();
        };
        let mut actions = vec![(relative.to_path_buf(), action)];
        if action != FsAction::Mkdir {
            return actions;
        }
        for entry in walkdir::WalkDir::new(base.join(relative))
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
            .filter_map(Result::ok)
        {
            let Ok(inner) = entry.path().strip_prefix(base) else {
                continue;
            };
            if let Some(action) = self.observe(inner, Some(entry.file_type().is_dir())) {
                actions.push((inner.to_path_buf(), action));
            }
        }
        actions
    }

    /// `kind` is `Some(true)` for an existing directory, `Some(false)` for
    /// an existing file and `None` when nothing exists at the path.
    pub fn observe(&mut self, relative: &Path, kind: Option<bool>) -> Option<FsAction> {
        let action = match kind {
            Some(true) => self
                .dirs
                .insert(relative.to_path_buf())
                .then_some(FsAction::Mkdir),
            Some(false) => {
                if self.files.insert(relative.to_path_buf()) {
                    Some(FsAction::Add)
                } else {
                    Some(FsAction::Change)
                }
            }
            None => {
                if self.dirs.remove(relative) {
                    self.files.retain(|f| !f.starts_with(relative));
                    self.dirs.retain(|d| !d.starts_with(relative));
                    Some(FsAction::Delete)
                } else if self.files.remove(relative) {
                    Some(FsAction::Unlink)
                } else {
                    None
                }
            }
        };
        trace!(path = %relative.display(), ?action, "Classified event");
        action
    }
}

/// Per-path quiet period: a path is due once no event arrived for it during
/// the delay.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
        }
    }

    pub fn push(&mut self, path: PathBuf, now: Instant) {
        self.pending.insert(path, now + self.delay);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes and returns the paths whose quiet period is over.
    pub fn due(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut due: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &due {
            self.pending.remove(path);
        }
        due.sort();
        due
    }

    pub fn drain(&mut self) -> Vec<PathBuf> {
        let mut all: Vec<PathBuf> = self.pending.drain().map(|(path, _)| path).collect();
        all.sort();
        all
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Spawns a task that forwards each path of `raw` once it has been quiet
/// for `delay`. Pending paths are flushed when `raw` closes.
pub fn debounce(
    mut raw: mpsc::UnboundedReceiver<PathBuf>,
    delay: Duration,
) -> mpsc::UnboundedReceiver<PathBuf> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut pending = Debouncer::new(delay);
        loop {
            tokio::select! {
                received = raw.recv() => match received {
                    Some(path) => pending.push(path, Instant::now()),
                    None => {
                        for path in pending.drain() {
                            let _ = tx.send(path);
                        }
                        return;
                    }
                },
                _ = sleep_until_deadline(pending.next_deadline()) => {
                    for path in pending.due(Instant::now()) {
                        if tx.send(path).is_err() {
                            return;
                        }
                    }
                }
            }
        }
    });
    rx
}
