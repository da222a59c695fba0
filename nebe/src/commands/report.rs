//! Diagnostics: `send-report` and the `test-*` probes.

use super::boxed;
use crate::context::Context;
use crate::reporter::HttpReporter;
use anyhow::{bail, Result};
use colored::Colorize;
use nebe_core::contract::{AccountsApi, ClientApi, ErrorReporter};
use nebe_core::report::{self, Level, ReportEvent};
use nebe_core::visual;

pub async fn send_report(ctx: &Context) -> Result<()> {
    let report = report::configuration_report(std::env::vars(), ctx.settings.all());
    let event = ReportEvent::new(Level::Info, "Report")
        .with_environment(super::environment_name(ctx.target))
        .with_tag("command", "send-report")
        .with_extra(report.clone());

    HttpReporter::from_env().capture(event).await.map_err(boxed)?;
    println!("{}", visual::to_tab_json(&report)?);
    Ok(())
}

pub async fn test_accounts(ctx: &Context) -> Result<()> {
    let message = ctx.api().ping().await.map_err(boxed)?;
    if message == "pong" {
        println!("{}", "PONG!".green().bold());
    } else {
        println!("{}", format!("Unexpected answer: {message}").yellow());
    }
    Ok(())
}

pub async fn test_cli_controller(ctx: &mut Context) -> Result<()> {
    let api = ctx.api();
    ctx.authenticate(&api).await?;
    let listing = ctx.api().visuals_raw().await.map_err(boxed)?;
    println!("{}", visual::to_tab_json(&listing)?);
    Ok(())
}

/// Sends a test message, then fails so the error path is reported too.
pub async fn test_reporter(ctx: &Context) -> Result<()> {
    let reporter = HttpReporter::from_env();
    let event = ReportEvent::new(Level::Info, "Test")
        .with_environment(super::environment_name(ctx.target))
        .with_tag("command", "test-reporter");
    reporter.capture(event).await.map_err(boxed)?;
    if !reporter.is_remote() {
        println!("{}", "No report URL configured, the event was only logged".yellow());
    }
    println!("OK");
    bail!("Test error raised by test-reporter")
}
