//! The `dist/` folder served by the local previews of a dev session.
//!
//! ```text
//! {root}/dist/config.json
//!            /include/
//!            /{size}/index.html   (dev markers injected)
//! ```

use super::DevError;
use crate::checks::{self, ConfigCheck, SchemaCheck};
use crate::contract::DevstackApi;
use crate::environment::ServiceUrls;
use crate::fill;
use crate::markup::{self, DevMarkup};
use crate::visual::{self, VisualId};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DIST: &str = "dist";

pub struct DevWorkspace {
    root: PathBuf,
    visual: VisualId,
    visual_dir: PathBuf,
    dist: PathBuf,
    visual_client: String,
    visual_helper: String,
    fill: String,
}

impl DevWorkspace {
    pub fn new(root: &Path, visual: VisualId, urls: &ServiceUrls) -> Self {
        let visual_dir = visual.dir(root);
        Self {
            root: root.to_path_buf(),
            dist: root.join(DIST),
            visual,
            visual_dir,
            visual_client: urls.visual_client.clone(),
            visual_helper: urls.visual_helper.clone(),
            fill: fill::fill_script(&Default::default(), crate::VERSION),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn visual(&self) -> &VisualId {
        &self.visual
    }

    pub fn visual_dir(&self) -> &Path {
        &self.visual_dir
    }

    pub fn dist(&self) -> &Path {
        &self.dist
    }

    pub fn size_dir(&self, size: &str) -> PathBuf {
        self.dist.join(size)
    }

    /// Recreates `dist/` with the config and include folder. Fatal config
    /// problems abort.
    pub fn prepare(&self) -> Result<ConfigCheck, DevError> {
        visual::remove_path(&self.dist)?;
        fs::create_dir_all(&self.dist)?;

        let check = self.copy_config()?;
        if !check.is_ok() {
            return Err(DevError::Config(check.errors));
        }
        self.copy_include()?;
        Ok(check)
    }

    /// Checks `config.json` and copies it when usable.
    pub fn copy_config(&self) -> io::Result<ConfigCheck> {
        let source = self.visual_dir.join("config.json");
        let check = checks::check_config(&source);
        if check.is_ok() {
            fs::create_dir_all(&self.dist)?;
            fs::copy(&source, self.dist.join("config.json"))?;
        }
        Ok(check)
    }

    pub fn copy_include(&self) -> io::Result<()> {
        let include = self.visual_dir.join("include");
        let target = self.dist.join("include");
        visual::remove_path(&target)?;
        if include.is_dir() {
            let copied = visual::copy_dir(&include, &target)?;
            debug!(files = copied, "Copied include folder");
        }
        Ok(())
    }

    /// Validates `schema.json` and recomputes the demo fill from it.
    pub async fn refresh_schema(&mut self, devstack: &dyn DevstackApi) -> SchemaCheck {
        let check = checks::check_schema(&self.visual_dir.join("schema.json"), devstack).await;
        let schema = check
            .schema
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()));
        self.fill = fill::fill_script(&fill::demo_inputs(&schema), crate::VERSION);
        check
    }

    pub fn sizes(&self) -> Vec<String> {
        visual::size_folders(&self.visual_dir)
    }

    /// Copies a size folder to `dist/{size}` and injects the dev markers.
    /// Returns whether the markup has a `<main>` element.
    pub fn build_size(&self, size: &str) -> io::Result<bool> {
        let target = self.size_dir(size);
        visual::remove_path(&target)?;
        visual::copy_dir(&self.visual_dir.join(size), &target)?;

        let index = target.join("index.html");
        let content = fs::read_to_string(&index)?;
        let visual_name = self.visual.to_string();
        let opts = DevMarkup {
            folder: size,
            visual: &visual_name,
            fill: &self.fill,
            visual_client: &self.visual_client,
            visual_helper: &self.visual_helper,
            cache_buster: chrono::Utc::now().timestamp_millis(),
        };
        let injected = markup::inject_dev(&content, &opts);
        fs::write(&index, &injected)?;

        let has_main = markup::has_main(&injected);
        if !has_main {
            warn!(size, "Resize does not contain element <main>");
        }
        info!(size, "Preview built");
        Ok(has_main)
    }
}
