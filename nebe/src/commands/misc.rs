//! Small local commands: `version`, `ping`, `debug`, `reset`, `root`.

use crate::context::Context;
use anyhow::{Context as _, Result};
use colored::Colorize;
use nebe_core::visual;
use std::fs;
use std::path::PathBuf;

const PACKAGE_TEMPLATE: &str = include_str!("../../assets/package.json");

/// Files removed by `reset` before `package.json` is recreated.
const RESET_PATHS: [&str; 4] = ["node_modules", "package-lock.json", "yarn.lock", "package.json"];

pub fn version() -> Result<()> {
    println!("{}", format!("nebe {}", nebe_core::VERSION).blue());
    Ok(())
}

pub fn ping() -> Result<()> {
    println!("{}", "Pong".blue());
    Ok(())
}

pub fn debug(ctx: &Context) -> Result<()> {
    println!("{}", ctx.settings.path().display().to_string().dimmed());
    println!("{}", visual::to_tab_json(ctx.settings.all())?);
    Ok(())
}

pub fn reset(ctx: &mut Context, config: bool) -> Result<()> {
    let root = ctx.root()?;
    for name in RESET_PATHS {
        let path = root.join(name);
        visual::remove_path(&path).with_context(|| format!("failed to delete {}", path.display()))?;
        println!("{}", format!("Deleted {}", path.display()).green());
    }

    let package = root.join("package.json");
    fs::write(&package, PACKAGE_TEMPLATE)
        .with_context(|| format!("failed to write {}", package.display()))?;
    println!("{}", format!("Created new {}", package.display()).green());

    if config {
        ctx.settings.clear_tenant();
        ctx.save()?;
        println!("{}", "Stored settings cleared".green());
    }
    Ok(())
}

pub fn root(ctx: &mut Context, path: Option<PathBuf>) -> Result<()> {
    let Some(path) = path else {
        let root = ctx.root()?;
        println!("{}", root.display());
        return Ok(());
    };

    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };
    fs::create_dir_all(&path)
        .with_context(|| format!("failed to create root folder {}", path.display()))?;
    ctx.settings.set_root(&path);
    ctx.save()?;
    tracing::info!(root = %path.display(), "Root folder stored");
    println!("{}", format!("Root folder set to {}", path.display()).green());
    Ok(())
}
