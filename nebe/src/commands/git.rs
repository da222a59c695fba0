//! Batch git commands over every local visual: `fetch`, `pull`, `push`,
//! `commit`, `status`.

use crate::context::Context;
use crate::output::Table;
use anyhow::Result;
use colored::Colorize;
use nebe_core::batch::{self, GitOp, ItemOutcome, StatusRow};

pub fn outcome_table(outcomes: &[ItemOutcome]) -> Table {
    let mut table = Table::new(["Visual", "Result"]);
    for outcome in outcomes {
        let result = match &outcome.error {
            None => "OK".green().to_string(),
            Some(error) => error.red().to_string(),
        };
        table.push([outcome.visual.to_string(), result]);
    }
    table
}

pub fn status_table(rows: &[StatusRow]) -> Table {
    let mut table = Table::new(["Visual", "Branch", "State"]);
    for row in rows {
        let branch = row.branch.clone().unwrap_or_default();
        let branch = if row.off_master() {
            branch.red().bold().to_string()
        } else {
            branch
        };
        table.push([row.visual.to_string(), branch, row.state.describe()]);
    }
    table
}

async fn run_op(ctx: &Context, op: GitOp) -> Result<()> {
    let root = ctx.root()?;
    let spinner = ctx.spinner(format!("Running git {} on all visuals", op.verb()));
    let outcomes = batch::run_all(&root, &ctx.git(), op).await?;
    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    spinner.finish(
        failed == 0,
        format!("{} of {} visuals done", outcomes.len() - failed, outcomes.len()),
    );
    if !outcomes.is_empty() {
        println!("{}", outcome_table(&outcomes).render());
    }
    Ok(())
}

pub async fn fetch(ctx: &Context) -> Result<()> {
    run_op(ctx, GitOp::Fetch).await
}

pub async fn pull(ctx: &Context) -> Result<()> {
    run_op(ctx, GitOp::Pull).await
}

pub async fn push(ctx: &mut Context) -> Result<()> {
    let api = ctx.api();
    ctx.authenticate(&api).await?;
    let root = ctx.root()?;

    let outcomes = batch::push_changed(&root, &ctx.git(), &ctx.prompter()).await?;
    if outcomes.is_empty() {
        println!("{}", "No changes".green());
        return Ok(());
    }
    println!("{}", outcome_table(&outcomes).render());
    Ok(())
}

pub async fn commit(ctx: &Context) -> Result<()> {
    let root = ctx.root()?;
    let rows = batch::commit_all(&root, &ctx.git()).await?;
    if rows.is_empty() {
        println!("{}", "Nothing to commit/push".green());
        return Ok(());
    }
    println!("{}", status_table(&rows).render());
    Ok(())
}

pub async fn status(ctx: &mut Context) -> Result<()> {
    let api = ctx.api();
    ctx.authenticate(&api).await?;
    let root = ctx.root()?;

    let rows = batch::status(&root, &ctx.git()).await?;
    if rows.is_empty() {
        println!("{}", "No changes".green());
        return Ok(());
    }
    println!("{}", status_table(&rows).render());
    Ok(())
}
