//! Mirrors local file changes of a visual onto the remote bundle
//! filesystem.
//!
//! Every dispatched change runs as its own task. A newer change of the same
//! path aborts the task still running for it, so the remote always ends up
//! with the latest state. File contents already known remotely (by SHA-256)
//! are not sent again.

use super::events::{to_posix, FsAction};
use crate::contract::DevstackApi;
use crate::model::Endpoints;
use base64::Engine;
use futures::future::join_all;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub sent: usize,
    pub failed: usize,
}

type Hashes = Arc<Mutex<HashMap<PathBuf, String>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct RemoteSync {
    devstack: Arc<dyn DevstackApi>,
    endpoints: Endpoints,
    base: PathBuf,
    hashes: Hashes,
    in_flight: Mutex<HashMap<PathBuf, JoinHandle<()>>>,
}

impl RemoteSync {
    /// `base` is the visual folder the relative paths resolve against.
    pub fn new(devstack: Arc<dyn DevstackApi>, endpoints: Endpoints, base: PathBuf) -> Self {
        Self {
            devstack,
            endpoints,
            base,
            hashes: Arc::default(),
            in_flight: Mutex::default(),
        }
    }

    /// Request body for `action` on `relative`; `None` when the contents
    /// did not change since the last successful upload. `force` skips that
    /// check, for when an aborted call may have left other contents behind.
    fn payload(
        &self,
        relative: &Path,
        action: FsAction,
        force: bool,
    ) -> std::io::Result<Option<(Value, Option<String>)>> {
        let path = to_posix(relative);
        if !action.has_contents() {
            let mut hashes = lock(&self.hashes);
            match action {
                FsAction::Delete => hashes.retain(|p, _| !p.starts_with(relative)),
                _ => {
                    hashes.remove(relative);
                }
            }
            return Ok(Some((json!({ "path": path }), None)));
        }

        let bytes = std::fs::read(self.base.join(relative))?;
        let hash = sha256_hex(&bytes);
        if !force && lock(&self.hashes).get(relative) == Some(&hash) {
            debug!(path = %path, "Unchanged content, not sending");
            return Ok(None);
        }
        let contents = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Ok(Some((
            json!({ "path": path, "contents": contents, "hash": hash }),
            Some(hash),
        )))
    }

    /// Sends `action` for `relative` in the background, replacing a call
    /// still running for the same path.
    pub fn dispatch(&self, relative: &Path, action: FsAction) {
        let Some(endpoint) = self.endpoints.get(action.endpoint()).cloned() else {
            warn!(action = action.endpoint(), "Remote bundle has no endpoint for action");
            return;
        };

        let superseded = self.supersede(relative, action);
        let (body, hash) = match self.payload(relative, action, superseded) {
            Ok(Some(payload)) => payload,
            Ok(None) => return,
            Err(e) => {
                warn!(path = %relative.display(), error = %e, "Cannot read changed file");
                return;
            }
        };

        let devstack = Arc::clone(&self.devstack);
        let hashes = Arc::clone(&self.hashes);
        let key = relative.to_path_buf();
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            match devstack.call_endpoint(&endpoint, &body).await {
                Ok(()) => {
                    debug!(path = %task_key.display(), action = action.endpoint(), "Synced");
                    if let Some(hash) = hash {
                        lock(&hashes).insert(task_key, hash);
                    }
                }
                Err(e) => error!(
                    path = %task_key.display(),
                    action = action.endpoint(),
                    error = %e,
                    "Remote sync failed"
                ),
            }
        });

        if let Some(previous) = lock(&self.in_flight).insert(key, handle) {
            previous.abort();
        }
    }

    /// Aborts the call still running for `relative`, and for a deleted
    /// directory every call below it. Returns whether one was cut short.
    fn supersede(&self, relative: &Path, action: FsAction) -> bool {
        let mut aborted = false;
        lock(&self.in_flight).retain(|path, handle| {
            if handle.is_finished() {
                return false;
            }
            let covered = if action == FsAction::Delete {
                path.starts_with(relative)
            } else {
                path == relative
            };
            if covered {
                debug!(path = %path.display(), "Aborting superseded remote call");
                handle.abort();
                aborted = true;
            }
            !covered
        });
        aborted
    }

    /// Waits for every dispatched call to finish or be aborted.
    pub async fn settle(&self) {
        let handles: Vec<JoinHandle<()>> = lock(&self.in_flight).drain().map(|(_, h)| h).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Sends every file below the visual folder through `add`.
    pub async fn upload_all<'a, I>(&self, files: I) -> UploadSummary
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        let Some(endpoint) = self.endpoints.get(FsAction::Add.endpoint()) else {
            warn!("Remote bundle has no add endpoint, skipping upload");
            return UploadSummary::default();
        };

        let mut files: Vec<&PathBuf> = files.into_iter().collect();
        files.sort();

        let tasks = files.into_iter().map(|relative| async move {
            let (body, hash) = match self.payload(relative, FsAction::Add, false) {
                Ok(Some(payload)) => payload,
                Ok(None) => return Ok(()),
                Err(e) => return Err(e.to_string()),
            };
            self.devstack
                .call_endpoint(endpoint, &body)
                .await
                .map_err(|e| e.to_string())?;
            if let Some(hash) = hash {
                lock(&self.hashes).insert(relative.clone(), hash);
            }
            Ok(())
        });

        let mut summary = UploadSummary::default();
        for result in join_all(tasks).await {
            match result {
                Ok(()) => summary.sent += 1,
                Err(e) => {
                    warn!(error = %e, "Initial upload of a file failed");
                    summary.failed += 1;
                }
            }
        }
        info!(sent = summary.sent, failed = summary.failed, "Initial upload done");
        summary
    }
}
