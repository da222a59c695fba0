//! `validate`: config and schema checks of every local visual.

use crate::context::Context;
use anyhow::Result;
use colored::Colorize;
use nebe_core::checks::{self, ConfigCheck, SchemaCheck};
use nebe_core::visual;

pub fn print_config_check(check: &ConfigCheck) {
    for error in &check.errors {
        println!("{}", error.red());
    }
    for warning in &check.warnings {
        println!("{}", warning.yellow());
    }
    if check.is_clean() {
        println!("{}", "config.json is valid".green());
    }
}

pub fn print_schema_check(check: &SchemaCheck) {
    if check.valid {
        println!("{}", "schema.json is valid".green());
    } else {
        println!("{}", "schema.json is not valid".red());
    }
    for message in &check.messages {
        println!("  {message}");
    }
}

pub async fn run(ctx: &mut Context) -> Result<()> {
    let api = ctx.api();
    ctx.authenticate(&api).await?;
    let root = ctx.root()?;

    for id in visual::all_visuals(&root)? {
        let dir = id.dir(&root);

        let config = dir.join("config.json");
        if config.exists() {
            println!("Checking config of {id}");
            print_config_check(&checks::check_config(&config));
        }

        let schema = dir.join("schema.json");
        if schema.exists() {
            println!("Checking schema of {id}");
            print_schema_check(&checks::check_schema(&schema, &api).await);
        }
    }

    println!("{}", "Done.".green());
    Ok(())
}
