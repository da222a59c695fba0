//! High-level `sync`: mirrors the server-side list of visuals into `src/`.
//!
//! For every brand of the listing this module:
//!   - creates the brand folder and removes local visual folders the server
//!     no longer lists,
//!   - removes clean working copies of visuals the user deselected (dirty
//!     ones are kept and reported),
//!   - clones newly selected visuals, sets the commit identity, fetches and
//!     fast-forwards visuals that are behind.
//!
//! # Error Handling
//! Failures are isolated per visual and recorded in the [`SyncReport`]; the
//! run continues with the next visual. Only failures outside of any single
//! visual (the `src/` folder itself) abort.
//!
//! # Callable From
//! The `sync` command of the CLI crate, and integration tests with a mocked
//! [`Git`].

use crate::contract::Git;
use crate::model::{RemoteVisual, SyncListing};
use crate::settings::{self, Settings};
use crate::visual::{self, VisualId};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Clone with `--depth 1`.
    pub shallow: bool,
}

/// Commit identity applied to working copies that have none.
#[derive(Debug, Clone, Default)]
pub struct GitIdentity {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl GitIdentity {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            name: settings.name().map(str::to_string),
            email: settings.email().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    Pulled,
    UpToDate,
    /// Local commits waiting to be pushed.
    Ahead(u32),
    /// Uncommitted changes; the working copy was left alone.
    Dirty(usize),
    /// Deselected visual whose clean working copy was deleted.
    Unsynced,
    /// Deselected visual kept because of uncommitted changes.
    KeptDirty(usize),
    /// Local folder of a visual the server no longer lists.
    RemovedStale,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualOutcome {
    pub visual: VisualId,
    pub action: SyncAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandSummary {
    pub brand: String,
    pub selected: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub brands: Vec<BrandSummary>,
    pub visuals: Vec<VisualOutcome>,
}

impl SyncReport {
    pub fn selected(&self) -> usize {
        self.brands.iter().map(|b| b.selected).sum()
    }

    pub fn total(&self) -> usize {
        self.brands.iter().map(|b| b.total).sum()
    }

    pub fn failures(&self) -> usize {
        self.visuals
            .iter()
            .filter(|v| matches!(v.action, SyncAction::Failed(_)))
            .count()
    }

    fn record(&mut self, visual: VisualId, action: SyncAction) {
        match &action {
            SyncAction::Failed(reason) => {
                error!(visual = %visual, reason = %reason, "[SYNC] Visual failed")
            }
            other => debug!(visual = %visual, action = ?other, "[SYNC] Visual done"),
        }
        self.visuals.push(VisualOutcome { visual, action });
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to prepare {path}: {source}")]
    Prepare {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Stores the listing and the user it came with.
pub fn remember_listing(settings: &mut Settings, listing: &SyncListing) {
    settings.set(settings::LAST_SYNC_RESPONSE, listing);
    settings.set_user(&listing.user);
}

pub fn mark_synced(settings: &mut Settings, at: chrono::DateTime<chrono::Utc>) {
    settings.set(settings::LAST_SYNC, at.to_rfc3339());
}

pub async fn synchronise<G>(
    root: &Path,
    listing: &SyncListing,
    git: &G,
    identity: &GitIdentity,
    options: &SyncOptions,
) -> Result<SyncReport, SyncError>
where
    G: Git + ?Sized,
{
    info!(root = %root.display(), brands = listing.brands.len(), "[SYNC] Starting");

    let src = visual::src_dir(root);
    fs::create_dir_all(&src).map_err(|source| SyncError::Prepare {
        path: src.clone(),
        source,
    })?;
    let gitignore = root.join(".gitignore");
    fs::write(&gitignore, "*.url").map_err(|source| SyncError::Prepare {
        path: gitignore,
        source,
    })?;

    let mut report = SyncReport::default();

    for (brand, visuals) in &listing.brands {
        let selected = visuals.values().filter(|v| v.is_synced()).count();
        report.brands.push(BrandSummary {
            brand: brand.clone(),
            selected,
            total: visuals.len(),
        });
        info!(brand = %brand, selected, total = visuals.len(), "[SYNC] Brand");

        let brand_dir = src.join(brand);
        if let Err(e) = fs::create_dir_all(&brand_dir) {
            error!(path = %brand_dir.display(), error = %e, "[SYNC] Cannot create brand folder");
            for slug in visuals.keys() {
                report.record(
                    VisualId::new(brand.clone(), slug.clone()),
                    SyncAction::Failed(format!("cannot create brand folder: {e}")),
                );
            }
            continue;
        }

        remove_stale(&brand_dir, brand, visuals, &mut report);

        for (slug, remote) in visuals.iter().rev() {
            let id = VisualId::new(brand.clone(), slug.clone());
            let repo = brand_dir.join(slug);
            let action = if remote.is_synced() {
                sync_visual(&repo, remote, git, identity, options).await
            } else {
                match unsync_visual(&repo, git).await {
                    Some(action) => action,
                    None => continue,
                }
            };
            report.record(id, action);
        }
    }

    info!(
        selected = report.selected(),
        total = report.total(),
        failures = report.failures(),
        "[SYNC] Finished"
    );
    Ok(report)
}

fn remove_stale(
    brand_dir: &Path,
    brand: &str,
    visuals: &indexmap::IndexMap<String, RemoteVisual>,
    report: &mut SyncReport,
) {
    let local = match visual::directories(brand_dir) {
        Ok(local) => local,
        Err(e) => {
            warn!(path = %brand_dir.display(), error = %e, "[SYNC] Cannot list brand folder");
            return;
        }
    };

    for folder in local.into_iter().filter(|f| !visuals.contains_key(f)) {
        let id = VisualId::new(brand, folder.clone());
        match visual::remove_path(&brand_dir.join(&folder)) {
            Ok(()) => report.record(id, SyncAction::RemovedStale),
            Err(e) => report.record(id, SyncAction::Failed(format!("cannot remove: {e}"))),
        }
    }
}

/// Handles a deselected visual; `None` when there is nothing local.
async fn unsync_visual<G>(repo: &Path, git: &G) -> Option<SyncAction>
where
    G: Git + ?Sized,
{
    if !repo.is_dir() {
        return None;
    }

    if !visual::is_git_repo(repo) {
        let empty = fs::read_dir(repo)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !empty {
            return Some(SyncAction::Failed(
                "deselected, but the folder is not a git repository".into(),
            ));
        }
        return Some(match visual::remove_path(repo) {
            Ok(()) => SyncAction::Unsynced,
            Err(e) => SyncAction::Failed(format!("cannot remove: {e}")),
        });
    }

    let status = match git.status(repo).await {
        Ok(status) => status,
        Err(e) => return Some(SyncAction::Failed(format!("git status: {e}"))),
    };

    if !status.is_clean() {
        return Some(SyncAction::KeptDirty(status.files.len()));
    }

    Some(match visual::remove_path(repo) {
        Ok(()) => SyncAction::Unsynced,
        Err(e) => SyncAction::Failed(format!("cannot remove: {e}")),
    })
}

async fn sync_visual<G>(
    repo: &Path,
    remote: &RemoteVisual,
    git: &G,
    identity: &GitIdentity,
    options: &SyncOptions,
) -> SyncAction
where
    G: Git + ?Sized,
{
    if let Err(e) = fs::create_dir_all(repo) {
        return SyncAction::Failed(format!("cannot create folder: {e}"));
    }

    let empty = match fs::read_dir(repo) {
        Ok(mut entries) => entries.next().is_none(),
        Err(e) => return SyncAction::Failed(format!("cannot read folder: {e}")),
    };

    let mut cloned = false;
    if empty {
        let depth = options.shallow.then_some(1);
        debug!(origin = %remote.origin, path = %repo.display(), ?depth, "[SYNC] Cloning");
        if let Err(e) = git.clone_repo(&remote.origin, repo, depth).await {
            return SyncAction::Failed(format!("clone: {e}"));
        }
        cloned = true;
    } else if !visual::is_git_repo(repo) {
        return SyncAction::Failed("folder is not a git repository".into());
    }

    apply_identity(repo, git, identity).await;

    if let Err(e) = git.fetch(repo).await {
        return SyncAction::Failed(format!("fetch: {e}"));
    }

    let status = match git.status(repo).await {
        Ok(status) => status,
        Err(e) => return SyncAction::Failed(format!("git status: {e}")),
    };

    if !status.is_clean() {
        return SyncAction::Dirty(status.files.len());
    }

    let mut pulled = false;
    if status.behind > 0 {
        debug!(path = %repo.display(), behind = status.behind, "[SYNC] Behind, pulling");
        if let Err(e) = git.pull(repo).await {
            return SyncAction::Failed(format!("pull: {e}"));
        }
        pulled = true;
    }

    if status.ahead > 0 {
        SyncAction::Ahead(status.ahead)
    } else if cloned {
        SyncAction::Cloned
    } else if pulled {
        SyncAction::Pulled
    } else {
        SyncAction::UpToDate
    }
}

/// Sets `user.name` / `user.email` where the working copy has none.
pub async fn apply_identity<G>(repo: &Path, git: &G, identity: &GitIdentity)
where
    G: Git + ?Sized,
{
    let wanted = [
        ("user.name", identity.name.as_deref()),
        ("user.email", identity.email.as_deref()),
    ];
    for (key, value) in wanted {
        let Some(value) = value else { continue };
        match git.local_config(repo, key).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!(path = %repo.display(), key, "[SYNC] Setting git identity");
                if let Err(e) = git.set_local_config(repo, key, value).await {
                    warn!(path = %repo.display(), key, error = %e, "[SYNC] Cannot set git config");
                }
            }
            Err(e) => warn!(path = %repo.display(), key, error = %e, "[SYNC] Cannot read git config"),
        }
    }
}
