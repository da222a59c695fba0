//! # dev: live preview and remote file sync of one visual
//!
//! The pieces the `dev` command wires together:
//! - [`preview`]: the local `dist/` folder with dev markers injected,
//! - [`state`]: the JSON state published for the studio,
//! - [`session`]: the remote bundle lifecycle,
//! - [`remote`]: pushing file changes to the remote bundle,
//! - [`events`] and [`watch`]: turning raw watcher events into debounced,
//!   classified changes.
//!
//! This module also decides which visual to open and how a changed path
//! affects the local previews.

pub mod events;
pub mod preview;
pub mod remote;
pub mod session;
pub mod state;
pub mod watch;

use crate::contract::{BoxError, Prompter};
use crate::settings::Settings;
use crate::visual::{self, SelectError, VisualId};
use std::path::{Component, Path};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum DevError {
    #[error("config.json is not usable: {}", .0.join(", "))]
    Config(Vec<String>),
    #[error("Visual contains no sizes! Start by copying an existing visual or download a template from https://github.com/nebe-app")]
    NoSizes,
    #[error("No sizes selected")]
    NoSizesSelected,
    #[error("Port {0} is not available, another nebe dev session is probably running")]
    PortInUse(u16),
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("prompt failed: {0}")]
    Prompt(BoxError),
}

/// How `dev` picks the visual to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Start {
    /// The visual created last by `create`.
    Newest,
    /// The visual of the previous dev session, without asking.
    Latest,
    /// Offer the previous visual, otherwise select interactively.
    Ask,
}

fn existing_visual(root: &Path, stored: Option<&str>) -> Option<VisualId> {
    let id: VisualId = stored?.parse().ok()?;
    id.dir(root).is_dir().then_some(id)
}

pub fn choose_visual(
    root: &Path,
    settings: &Settings,
    start: Start,
    prompter: &dyn Prompter,
) -> Result<VisualId, DevError> {
    let newest = match start {
        Start::Newest => settings.newest_visual().and_then(|v| v.parse().ok()),
        _ => None,
    };

    let chosen = match (newest, start) {
        (Some(newest), _) => Some(newest),
        (None, Start::Latest) => existing_visual(root, settings.last_dev()),
        (None, _) => match existing_visual(root, settings.last_dev()) {
            Some(last) => {
                let reuse = prompter
                    .confirm(&format!("Use last visual? {last}"), true)
                    .map_err(DevError::Prompt)?;
                reuse.then_some(last)
            }
            None => None,
        },
    };

    match chosen {
        Some(visual) => {
            debug!(visual = %visual, ?start, "Visual chosen without selection");
            Ok(visual)
        }
        None => Ok(visual::select_visual(root, prompter)?),
    }
}

/// Multi-selects the sizes to preview, all pre-selected.
pub fn select_sizes(sizes: &[String], prompter: &dyn Prompter) -> Result<Vec<String>, DevError> {
    if sizes.is_empty() {
        return Err(DevError::NoSizes);
    }
    let defaults = vec![true; sizes.len()];
    let picked = prompter
        .multi_select("Select resizes", sizes, &defaults)
        .map_err(DevError::Prompt)?;
    let selected: Vec<String> = picked
        .into_iter()
        .filter_map(|i| sizes.get(i).cloned())
        .collect();
    if selected.is_empty() {
        return Err(DevError::NoSizesSelected);
    }
    Ok(selected)
}

/// Local work triggered by a change below the visual folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// Re-validate, recompute the fill and rebuild every preview.
    Schema,
    /// Re-check and copy `config.json`.
    Config,
    /// Rebuild the preview of one size.
    Size(String),
    /// Copy the include folder again.
    Include,
    None,
}

pub fn reaction_for(relative: &Path, sizes: &[String]) -> Reaction {
    let Some(Component::Normal(first)) = relative.components().next() else {
        return Reaction::None;
    };
    let first = first.to_string_lossy();
    match first.as_ref() {
        "schema.json" => Reaction::Schema,
        "config.json" => Reaction::Config,
        "include" => Reaction::Include,
        folder if sizes.iter().any(|s| s == folder) => Reaction::Size(folder.to_string()),
        _ => Reaction::None,
    }
}
