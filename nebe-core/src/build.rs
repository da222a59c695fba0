//! Hand-off build of every visual of a brand into `{root}/dist-build`.
//!
//! Size folders are copied as they are, then the demo fill and the
//! `window.open` exit handler are (re)injected into each `index.html`.

use crate::fill;
use crate::markup;
use crate::visual::{self, glob_relative};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DIST_BUILD: &str = "dist-build";
pub const BROWSERSLIST: [&str; 1] = ["last 3 Chrome versions"];

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

impl BuildError {
    fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> BuildError {
        let path = path.to_path_buf();
        move |source| BuildError::Io {
            action,
            path,
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserslistUpdate {
    Unchanged,
    Updated,
    Created,
}

/// Makes `{root}/package.json` carry the expected `browserslist`. An
/// unreadable or invalid file is replaced by one holding only that field.
pub fn ensure_browserslist(root: &Path) -> Result<BrowserslistUpdate, BuildError> {
    let path = root.join("package.json");
    let expected = Value::from(BROWSERSLIST.to_vec());

    let existing = fs::read_to_string(&path)
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok())
        .filter(Value::is_object);

    let (package, update) = match existing {
        Some(package) if package.get("browserslist") == Some(&expected) => {
            return Ok(BrowserslistUpdate::Unchanged)
        }
        Some(mut package) => {
            package["browserslist"] = expected;
            (package, BrowserslistUpdate::Updated)
        }
        None => (
            serde_json::json!({ "browserslist": expected }),
            BrowserslistUpdate::Created,
        ),
    };

    let content = visual::to_tab_json(&package)
        .map_err(|e| BuildError::io("serialize", &path)(io::Error::other(e)))?;
    fs::write(&path, content).map_err(BuildError::io("write", &path))?;
    info!(path = %path.display(), ?update, "browserslist updated");
    Ok(update)
}

/// Outcome of one bundled size folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeBuild {
    /// `{brand}/{repo}/{size}`
    pub folder: String,
    pub error: Option<String>,
    pub has_click_tag: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub configs: usize,
    pub includes: usize,
    pub sizes: Vec<SizeBuild>,
}

/// Builds every visual of `brand` from scratch.
pub fn build_brand(root: &Path, brand: &str) -> Result<BuildReport, BuildError> {
    let src = visual::src_dir(root);
    let out = root.join(DIST_BUILD);
    visual::remove_path(&out).map_err(BuildError::io("clear", &out))?;

    let brand_pattern = glob::Pattern::escape(brand);
    let mut report = BuildReport::default();

    for config in glob_relative(&src, &format!("{brand_pattern}/[!_]*/config.*")) {
        let target = out.join(&config);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(BuildError::io("create", parent))?;
        }
        fs::copy(src.join(&config), &target).map_err(BuildError::io("copy", &target))?;
        report.configs += 1;
    }
    info!(count = report.configs, "Copied configs");

    for include in glob_relative(&src, &format!("{brand_pattern}/[!_]*/include")) {
        let from = src.join(&include);
        if !from.is_dir() {
            continue;
        }
        visual::copy_dir(&from, &out.join(&include)).map_err(BuildError::io("copy", &from))?;
        report.includes += 1;
    }
    info!(count = report.includes, "Copied include folders");

    let entries = glob_relative(&src, &format!("{brand_pattern}/[!_]*/[!_]*/index.html"));
    info!(count = entries.len(), "Bundling visual sizes");

    for (i, entry) in entries.iter().enumerate() {
        let Some(folder) = entry.parent() else { continue };
        let size = build_size(&src, &out, folder);
        match &size.error {
            Some(e) => warn!(n = i + 1, total = entries.len(), folder = %size.folder, error = %e, "Size failed"),
            None => debug!(n = i + 1, total = entries.len(), folder = %size.folder, "Bundled"),
        }
        report.sizes.push(size);
    }

    Ok(report)
}

fn schema_fill(visual_dir: &Path) -> String {
    let schema_path = visual_dir.join("schema.json");
    let schema = fs::read_to_string(&schema_path)
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok())
        .unwrap_or_else(|| {
            warn!(path = %schema_path.display(), "No usable schema.json, empty demo fill");
            Value::Object(Default::default())
        });
    fill::fill_script(&fill::demo_inputs(&schema), crate::VERSION)
}

fn build_size(src: &Path, out: &Path, folder: &Path) -> SizeBuild {
    let name = folder.to_string_lossy().replace('\\', "/");
    let result = (|| -> io::Result<bool> {
        let from = src.join(folder);
        let to = out.join(folder);
        visual::copy_dir(&from, &to)?;

        let visual_dir = from.parent().unwrap_or(src);
        let fill = schema_fill(visual_dir);

        let index = to.join("index.html");
        let content = fs::read_to_string(&index)?;
        let has_click_tag = markup::has_click_tag(&content);
        fs::write(&index, markup::inject_build(&content, &fill))?;
        Ok(has_click_tag)
    })();

    match result {
        Ok(has_click_tag) => SizeBuild {
            folder: name,
            error: None,
            has_click_tag,
        },
        Err(e) => SizeBuild {
            folder: name,
            error: Some(e.to_string()),
            has_click_tag: false,
        },
    }
}
