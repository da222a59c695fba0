//! Visual identifiers and the on-disk layout under the root folder.
//!
//! ```text
//! {root}/src/{brand}/{repo}/config.json
//!                          /schema.json
//!                          /include/
//!                          /{size}/index.html
//! ```

use crate::contract::{BoxError, Prompter};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VisualIdError {
    #[error("invalid visual name `{0}`, expected `brand/repository`")]
    Invalid(String),
}

/// `{brand}/{repo}` identifier of a visual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualId {
    pub brand: String,
    pub repo: String,
}

impl VisualId {
    pub fn new(brand: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            repo: repo.into(),
        }
    }

    /// Directory of the visual under `root`.
    pub fn dir(&self, root: &Path) -> PathBuf {
        root.join("src").join(&self.brand).join(&self.repo)
    }
}

impl FromStr for VisualId {
    type Err = VisualIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().trim_matches('/');
        match trimmed.split_once('/') {
            Some((brand, repo))
                if !brand.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(VisualId::new(brand, repo))
            }
            _ => Err(VisualIdError::Invalid(value.to_string())),
        }
    }
}

impl fmt::Display for VisualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.brand, self.repo)
    }
}

impl Serialize for VisualId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn src_dir(root: &Path) -> PathBuf {
    root.join("src")
}

/// Names of the sub-directories of `dir`, skipping dot-folders, sorted.
pub fn directories(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

pub fn list_brands(root: &Path) -> io::Result<Vec<String>> {
    directories(&src_dir(root))
}

pub fn list_visuals(root: &Path, brand: &str) -> io::Result<Vec<String>> {
    directories(&src_dir(root).join(brand))
}

/// Every local visual of every brand.
pub fn all_visuals(root: &Path) -> io::Result<Vec<VisualId>> {
    let mut visuals = Vec::new();
    for brand in list_brands(root)? {
        for repo in list_visuals(root, &brand)? {
            visuals.push(VisualId::new(brand.clone(), repo));
        }
    }
    Ok(visuals)
}

pub fn is_git_repo(dir: &Path) -> bool {
    dir.join(".git").exists()
}

/// Size folders (`[!_][0-9]*`) of a visual that contain an `index.html`.
pub fn size_folders(visual_dir: &Path) -> Vec<String> {
    glob_relative(visual_dir, "[!_][0-9]*/index.html")
        .into_iter()
        .filter_map(|p| p.parent().map(|d| d.to_string_lossy().into_owned()))
        .collect()
}

/// PDFs placed directly in size folders of a visual.
pub fn pdfs(visual_dir: &Path) -> Vec<PathBuf> {
    glob_relative(visual_dir, "[!_][0-9]*/*.pdf")
        .into_iter()
        .map(|p| visual_dir.join(p))
        .collect()
}

/// Matches `pattern` below `base` and returns paths relative to `base`.
pub fn glob_relative(base: &Path, pattern: &str) -> Vec<PathBuf> {
    let escaped = glob::Pattern::escape(&base.to_string_lossy());
    let full = format!("{escaped}/{pattern}");
    let mut paths: Vec<PathBuf> = match glob::glob(&full) {
        Ok(paths) => paths
            .filter_map(Result::ok)
            .filter_map(|p| p.strip_prefix(base).ok().map(Path::to_path_buf))
            .collect(),
        Err(e) => {
            debug!(pattern = %full, error = %e, "Invalid glob pattern");
            Vec::new()
        }
    };
    paths.sort();
    paths
}

/// Recursively copies `from` into `to`, creating directories as needed.
pub fn copy_dir(from: &Path, to: &Path) -> io::Result<u64> {
    let mut copied = 0;
    for entry in walkdir::WalkDir::new(from) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(io::Error::other)?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Removes a file or directory tree, ignoring paths that do not exist.
pub fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Serializes JSON indented with tabs, the style of every file the CLI writes.
pub fn to_tab_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    #[error("no brands found in {0}")]
    NoBrands(PathBuf),
    #[error("no visuals found for brand {0}")]
    NoVisuals(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("prompt failed: {0}")]
    Prompt(BoxError),
    #[error("selection {0} is out of range")]
    OutOfRange(usize),
}

/// Picks a brand; a single brand is chosen without asking.
pub fn select_brand(root: &Path, prompter: &dyn Prompter) -> Result<String, SelectError> {
    let brands = list_brands(root)?;
    match brands.len() {
        0 => Err(SelectError::NoBrands(src_dir(root))),
        1 => Ok(brands[0].clone()),
        _ => {
            let idx = prompter
                .select("Select brand", &brands)
                .map_err(SelectError::Prompt)?;
            brands.get(idx).cloned().ok_or(SelectError::OutOfRange(idx))
        }
    }
}

/// Interactive brand + visual selection. Visuals are offered in reverse
/// name order so the most recently numbered ones come first.
pub fn select_visual(root: &Path, prompter: &dyn Prompter) -> Result<VisualId, SelectError> {
    let brand = select_brand(root, prompter)?;
    let mut visuals = list_visuals(root, &brand)?;
    if visuals.is_empty() {
        return Err(SelectError::NoVisuals(brand));
    }
    visuals.reverse();
    let idx = prompter
        .select("Select visual", &visuals)
        .map_err(SelectError::Prompt)?;
    let visual = visuals.get(idx).ok_or(SelectError::OutOfRange(idx))?;
    Ok(VisualId::new(brand, visual.clone()))
}
