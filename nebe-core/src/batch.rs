//! Git operations across every local visual: `fetch`, `pull`, `push`,
//! `commit` and `status`.
//!
//! Fetch, pull and push fan out with `join_all`; one failing visual never
//! stops the others. Commit and status walk the visuals in order.

use crate::contract::{BoxError, Git, Prompter};
use crate::git_status::GitStatus;
use crate::visual::{self, VisualId};
use futures::future::join_all;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const PUSH_BRANCH: &str = "master";
pub const PUSH_REMOTE: &str = "origin";
pub const PUSH_MESSAGE: &str = "Changes";

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to list visuals: {0}")]
    Io(#[from] io::Error),
    #[error("No visuals selected")]
    NothingSelected,
    #[error("prompt failed: {0}")]
    Prompt(BoxError),
}

/// Result of one visual in a concurrent batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub visual: VisualId,
    pub error: Option<String>,
}

impl ItemOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitOp {
    Fetch,
    Pull,
}

impl GitOp {
    pub fn verb(&self) -> &'static str {
        match self {
            GitOp::Fetch => "fetch",
            GitOp::Pull => "pull",
        }
    }
}

/// Local visuals with a working copy.
fn git_visuals(root: &Path) -> io::Result<Vec<(VisualId, PathBuf)>> {
    Ok(visual::all_visuals(root)?
        .into_iter()
        .map(|id| {
            let dir = id.dir(root);
            (id, dir)
        })
        .filter(|(_, dir)| visual::is_git_repo(dir))
        .collect())
}

/// Runs `op` on every local git visual concurrently.
pub async fn run_all<G>(root: &Path, git: &G, op: GitOp) -> Result<Vec<ItemOutcome>, BatchError>
where
    G: Git + ?Sized,
{
    let visuals = git_visuals(root)?;
    info!(op = op.verb(), visuals = visuals.len(), "[BATCH] Starting");

    let tasks = visuals.into_iter().map(|(id, dir)| async move {
        let result = match op {
            GitOp::Fetch => git.fetch(&dir).await,
            GitOp::Pull => git.pull(&dir).await,
        };
        let error = result.err().map(|e| {
            warn!(visual = %id, op = op.verb(), error = %e, "[BATCH] Failed");
            e.to_string()
        });
        ItemOutcome { visual: id, error }
    });

    Ok(join_all(tasks).await)
}

/// A visual with uncommitted changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub visual: VisualId,
    pub dir: PathBuf,
    pub status: GitStatus,
}

impl Change {
    pub fn label(&self) -> String {
        format!(
            "{} (Changed {} files)",
            self.visual,
            self.status.files.len()
        )
    }
}

/// Visuals whose working copy has changes. Status failures are logged and
/// the visual skipped.
pub async fn changed_visuals<G>(root: &Path, git: &G) -> Result<Vec<Change>, BatchError>
where
    G: Git + ?Sized,
{
    let mut changes = Vec::new();
    for (id, dir) in git_visuals(root)? {
        match git.status(&dir).await {
            Ok(status) if !status.is_clean() => changes.push(Change {
                visual: id,
                dir,
                status,
            }),
            Ok(_) => {}
            Err(e) => warn!(visual = %id, error = %e, "[BATCH] Cannot read status"),
        }
    }
    Ok(changes)
}

async fn commit_and_push<G>(git: &G, dir: &Path, message: &str) -> Result<(), BoxError>
where
    G: Git + ?Sized,
{
    git.add_all(dir).await?;
    git.commit(dir, message).await?;
    git.push(dir, PUSH_REMOTE, PUSH_BRANCH).await
}

/// Asks which changed visuals to push (all pre-selected) and pushes them
/// concurrently. An empty change list returns no outcomes.
pub async fn push_changed<G>(
    root: &Path,
    git: &G,
    prompter: &dyn Prompter,
) -> Result<Vec<ItemOutcome>, BatchError>
where
    G: Git + ?Sized,
{
    let changes = changed_visuals(root, git).await?;
    if changes.is_empty() {
        info!("[BATCH] Nothing to push");
        return Ok(Vec::new());
    }

    let labels: Vec<String> = changes.iter().map(Change::label).collect();
    let defaults = vec![true; labels.len()];
    let picked = prompter
        .multi_select("Select visuals to be pushed", &labels, &defaults)
        .map_err(BatchError::Prompt)?;

    let selected: Vec<&Change> = picked.iter().filter_map(|&i| changes.get(i)).collect();
    if selected.is_empty() {
        return Err(BatchError::NothingSelected);
    }

    let tasks = selected.into_iter().map(|change| async move {
        debug!(visual = %change.visual, "[BATCH] Pushing");
        let error = commit_and_push(git, &change.dir, PUSH_MESSAGE)
            .await
            .err()
            .map(|e| {
                error!(visual = %change.visual, error = %e, "[BATCH] Push failed");
                e.to_string()
            });
        ItemOutcome {
            visual: change.visual.clone(),
            error,
        }
    });

    Ok(join_all(tasks).await)
}

/// Row of the `status` / `commit` tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub visual: VisualId,
    pub branch: Option<String>,
    pub state: RowState,
}

impl StatusRow {
    pub fn off_master(&self) -> bool {
        matches!(&self.branch, Some(branch) if branch != PUSH_BRANCH)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    /// Empty visual folder, deleted.
    EmptyDeleted,
    NotGit,
    Changed(Vec<String>),
    Error(String),
}

impl RowState {
    pub fn describe(&self) -> String {
        match self {
            RowState::EmptyDeleted => "Empty folder, deleting".into(),
            RowState::NotGit => "Git not initialized".into(),
            RowState::Changed(files) => {
                format!("Changed {} files: {}", files.len(), files.join(", "))
            }
            RowState::Error(message) => format!("Error: {message}"),
        }
    }
}

fn is_empty_dir(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

/// Status of every local visual; clean visuals produce no row. Empty
/// visual folders are deleted on the way.
pub async fn status<G>(root: &Path, git: &G) -> Result<Vec<StatusRow>, BatchError>
where
    G: Git + ?Sized,
{
    let mut rows = Vec::new();
    for id in visual::all_visuals(root)? {
        let dir = id.dir(root);

        if is_empty_dir(&dir)? {
            if let Err(e) = fs::remove_dir(&dir) {
                warn!(path = %dir.display(), error = %e, "[BATCH] Cannot delete empty folder");
            }
            rows.push(StatusRow {
                visual: id,
                branch: None,
                state: RowState::EmptyDeleted,
            });
            continue;
        }

        if !visual::is_git_repo(&dir) {
            rows.push(StatusRow {
                visual: id,
                branch: None,
                state: RowState::NotGit,
            });
            continue;
        }

        match git.status(&dir).await {
            Ok(status) if status.is_clean() => {}
            Ok(status) => rows.push(StatusRow {
                visual: id,
                branch: status.current.clone(),
                state: RowState::Changed(status.files),
            }),
            Err(e) => rows.push(StatusRow {
                visual: id,
                branch: None,
                state: RowState::Error(e.to_string()),
            }),
        }
    }
    Ok(rows)
}

/// Commits and pushes every changed visual with the list of changed files
/// as message.
pub async fn commit_all<G>(root: &Path, git: &G) -> Result<Vec<StatusRow>, BatchError>
where
    G: Git + ?Sized,
{
    let mut rows = Vec::new();
    for (id, dir) in git_visuals(root)? {
        let status = match git.status(&dir).await {
            Ok(status) if status.is_clean() => continue,
            Ok(status) => status,
            Err(e) => {
                rows.push(StatusRow {
                    visual: id,
                    branch: None,
                    state: RowState::Error(e.to_string()),
                });
                continue;
            }
        };

        let message = format!("Changed files: {}", status.files.join(", "));
        let state = match commit_and_push(git, &dir, &message).await {
            Ok(()) => {
                info!(visual = %id, files = status.files.len(), "[BATCH] Committed");
                RowState::Changed(status.files)
            }
            Err(e) => RowState::Error(e.to_string()),
        };
        rows.push(StatusRow {
            visual: id,
            branch: status.current,
            state,
        });
    }
    Ok(rows)
}
