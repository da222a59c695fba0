//! Recursive `notify` watcher forwarding changed paths into tokio.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Keeps the watcher alive; dropping it stops the events.
pub struct VisualWatcher {
    _watcher: RecommendedWatcher,
}

/// Watches `base` and sends every touched path, relative to `base`, that is
/// not inside `.git`.
pub fn watch(
    base: &Path,
) -> Result<(VisualWatcher, mpsc::UnboundedReceiver<PathBuf>), notify::Error> {
    let (tx, rx) = mpsc::unbounded_channel();
    let prefix = base.to_path_buf();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if matches!(event.kind, notify::EventKind::Access(_)) {
                    return;
                }
                for path in event.paths {
                    let Ok(relative) = path.strip_prefix(&prefix) else {
                        continue;
                    };
                    if relative.as_os_str().is_empty() || super::events::is_ignored(relative) {
                        continue;
                    }
                    let _ = tx.send(relative.to_path_buf());
                }
            }
            Err(e) => warn!(error = %e, "Watch error"),
        },
        Config::default(),
    )?;
    watcher.watch(base, RecursiveMode::Recursive)?;
    debug!(path = %base.display(), "Watching for changes");

    Ok((VisualWatcher { _watcher: watcher }, rx))
}
