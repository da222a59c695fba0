//! `sync`: downloads the listing and mirrors it into `src/`.

use super::boxed;
use crate::context::Context;
use anyhow::{Context as _, Result};
use colored::{ColoredString, Colorize};
use nebe_core::contract::ClientApi;
use nebe_core::sync::{self, GitIdentity, SyncAction, SyncOptions, SyncReport};
use nebe_core::visual;

pub fn describe(action: &SyncAction) -> ColoredString {
    match action {
        SyncAction::Cloned => "cloned".green(),
        SyncAction::Pulled => "behind, pulled".green(),
        SyncAction::UpToDate => "up to date".normal(),
        SyncAction::Ahead(n) => format!("ahead by {n}, push the changes!").yellow(),
        SyncAction::Dirty(n) => format!("{n} changed files, commit or push them!").yellow(),
        SyncAction::Unsynced => "not selected, deleted".blue(),
        SyncAction::KeptDirty(n) => {
            format!("not selected but has {n} changed files, skipping").yellow()
        }
        SyncAction::RemovedStale => "no longer listed, deleted".blue(),
        SyncAction::Failed(reason) => format!("failed: {reason}").red(),
    }
}

fn print_report(report: &SyncReport) {
    for brand in &report.brands {
        println!(
            "{}",
            format!(
                "Brand {} ({} of {} selected)",
                brand.brand, brand.selected, brand.total
            )
            .cyan()
        );
        for outcome in report
            .visuals
            .iter()
            .filter(|o| o.visual.brand == brand.brand)
        {
            println!("  {}: {}", outcome.visual.repo, describe(&outcome.action));
        }
    }
}

pub async fn run(ctx: &mut Context, shallow: bool) -> Result<()> {
    let api = ctx.api();
    ctx.authenticate(&api).await?;
    let root = ctx.root()?;

    println!("{}", "Downloading the list of visuals to sync..".green());
    // Credentials may have changed with the refreshed user.
    let listing = ctx
        .api()
        .visuals()
        .await
        .map_err(boxed)
        .context("failed to download the list of visuals")?;
    if ctx.debug {
        println!("{}", visual::to_tab_json(&listing)?);
    }
    sync::remember_listing(&mut ctx.settings, &listing);
    ctx.save()?;

    let identity = GitIdentity::from_settings(&ctx.settings);
    let options = SyncOptions { shallow };
    let spinner = ctx.spinner("Synchronizing visuals");
    let report = sync::synchronise(&root, &listing, &ctx.git(), &identity, &options).await?;
    let failures = report.failures();
    spinner.finish(
        failures == 0,
        if failures == 0 {
            "Visuals synchronized".to_string()
        } else {
            format!("{failures} visuals failed to synchronize")
        },
    );
    print_report(&report);

    sync::mark_synced(&mut ctx.settings, chrono::Utc::now());
    ctx.save()?;

    println!(
        "{}",
        format!(
            "Synchronized {} of {} visuals locally",
            report.selected(),
            report.total()
        )
        .green()
    );
    println!(
        "{}",
        format!(
            "Choose which visuals sync locally at: {}",
            ctx.urls.sync_settings_url()
        )
        .blue()
    );
    Ok(())
}
