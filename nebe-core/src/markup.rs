//! Marker blocks injected into a size's `index.html`.
//!
//! Every injected snippet is wrapped in `<!--NEBE_X-->…<!--/NEBE_X-->` so a
//! second pass can recognise (dev) or replace (build) it.

use regex::Regex;
use tracing::{debug, warn};

pub const POLYFILLS: &str = "NEBE_POLYFILLS";
pub const DEMO_FILL: &str = "NEBE_DEMO_FILL";
pub const VISUAL_CLIENT: &str = "NEBE_VISUAL_CLIENT";
pub const ENV: &str = "NEBE_ENV";
pub const DOCUMENT_TITLE: &str = "NEBE_DOCUMENT_TITLE";
pub const VISUAL_HELPER: &str = "NEBE_VISUAL_HELPER";
pub const EXIT: &str = "NEBE_EXIT";

const POLYFILL_SCRIPTS: &str = r#"<script src="https://cdnjs.cloudflare.com/ajax/libs/promise-polyfill/8.1.3/polyfill.min.js"></script><script src="https://cdn.jsdelivr.net/npm/regenerator-runtime@0.13.7/runtime.min.js"></script>"#;

const EXIT_SCRIPT: &str =
    "<script>window.EXIT=function(url){if(!url)url=window.clickTag;window.open(url);};</script>";

/// Closing tag a block is inserted in front of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Head,
    Body,
}

impl Anchor {
    pub fn tag(&self) -> &'static str {
        match self {
            Anchor::Head => "</head>",
            Anchor::Body => "</body>",
        }
    }
}

fn open_marker(name: &str) -> String {
    format!("<!--{name}-->")
}

pub fn has_block(markup: &str, name: &str) -> bool {
    markup.contains(&open_marker(name))
}

/// Inserts `content` wrapped in the `name` markers before the anchor tag,
/// unless the block already exists or the anchor is missing. Returns
/// whether anything was inserted.
pub fn insert_block(markup: &mut String, name: &str, content: &str, anchor: Anchor) -> bool {
    if has_block(markup, name) {
        debug!(block = name, "Block already in markup");
        return false;
    }
    if !markup.contains(anchor.tag()) {
        warn!(block = name, anchor = anchor.tag(), "Anchor tag missing, block not added");
        return false;
    }
    let block = format!("\n<!--{name}-->\n{content}\n<!--/{name}-->\n{}", anchor.tag());
    *markup = markup.replacen(anchor.tag(), &block, 1);
    debug!(block = name, "Added block to markup");
    true
}

/// Removes every `name` block, then inserts a fresh one.
fn replace_block(markup: &str, name: &str, content: &str, anchor: Anchor) -> String {
    let pattern = format!(
        r"(?s)\n?<!--{0}-->.*?<!--/{0}-->\n?",
        regex::escape(name)
    );
    let stripped = match Regex::new(&pattern) {
        Ok(re) => re.replace_all(markup, "").into_owned(),
        Err(_) => markup.to_string(),
    };
    let mut out = stripped;
    insert_block(&mut out, name, content, anchor);
    out
}

/// Settings for dev-preview injection.
#[derive(Debug, Clone)]
pub struct DevMarkup<'a> {
    pub folder: &'a str,
    pub visual: &'a str,
    pub fill: &'a str,
    /// URL of the visual client script.
    pub visual_client: &'a str,
    /// Base URL of the visual helper assets, with trailing slash.
    pub visual_helper: &'a str,
    /// Cache-buster appended to the visual client URL.
    pub cache_buster: i64,
}

/// Injects every dev block that is not present yet.
pub fn inject_dev(markup: &str, opts: &DevMarkup<'_>) -> String {
    let mut out = markup.to_string();

    insert_block(&mut out, POLYFILLS, POLYFILL_SCRIPTS, Anchor::Head);
    insert_block(&mut out, DEMO_FILL, opts.fill, Anchor::Body);

    let client = format!(
        r#"<script src="{}?cb={}"></script>"#,
        opts.visual_client, opts.cache_buster
    );
    insert_block(&mut out, VISUAL_CLIENT, &client, Anchor::Head);

    let env = format!(
        "<script>window.MODE = 'dev'; window.FOLDER = '{}';</script>",
        opts.folder
    );
    insert_block(&mut out, ENV, &env, Anchor::Head);

    let title = format!(
        r#"<script>document.title = "{} {}";</script>"#,
        opts.folder, opts.visual
    );
    insert_block(&mut out, DOCUMENT_TITLE, &title, Anchor::Head);

    let helper = format!(
        r#"<link rel="stylesheet" href="{0}visual-helper.min.css" type="text/css">
<script src="{0}visual-helper.min.js"></script>"#,
        opts.visual_helper
    );
    insert_block(&mut out, VISUAL_HELPER, &helper, Anchor::Head);

    out
}

/// Replaces the demo fill and exit handler for hand-off builds.
pub fn inject_build(markup: &str, fill: &str) -> String {
    let out = replace_block(markup, DEMO_FILL, fill, Anchor::Body);
    replace_block(&out, EXIT, EXIT_SCRIPT, Anchor::Body)
}

/// Previews need a `<main>` element for the visual helper to attach to.
pub fn has_main(markup: &str) -> bool {
    markup.contains("<main>") || markup.contains("<main ")
}

pub fn has_click_tag(markup: &str) -> bool {
    markup.contains("window.clickTag")
}
