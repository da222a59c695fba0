//! `create` and `clone`.

use super::boxed;
use crate::context::Context;
use crate::http::ApiError;
use anyhow::{bail, Context as _, Result};
use colored::Colorize;
use nebe_core::batch::{PUSH_BRANCH, PUSH_REMOTE};
use nebe_core::contract::{ClientApi, Git, Prompter};
use nebe_core::model::{Format, NewVisual, VisualConfig};
use nebe_core::settings;
use nebe_core::sync::{self, GitIdentity};
use nebe_core::visual::{self, VisualId};
use std::fs;

const TEMPLATES_URL: &str = "https://github.com/nebe-app";

/// Comma separated tags, trimmed, empty ones dropped.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn valid_name(name: &str) -> bool {
    name.trim().chars().count() > 3
}

fn ask_name(prompter: &dyn Prompter) -> Result<String> {
    loop {
        let name = prompter
            .input("Visual name (public, can be changed later):")
            .map_err(boxed)?;
        if valid_name(&name) {
            return Ok(name.trim().to_string());
        }
        println!("{}", "The name must be longer than 3 characters".yellow());
    }
}

/// Offers `items` by their `label` and returns the chosen one.
pub fn pick<'a, T>(
    prompter: &dyn Prompter,
    message: &str,
    items: &'a [T],
    label: impl Fn(&T) -> String,
) -> Result<&'a T> {
    let labels: Vec<String> = items.iter().map(label).collect();
    let idx = prompter.select(message, &labels).map_err(boxed)?;
    items
        .get(idx)
        .with_context(|| format!("selection {idx} is out of range for \"{message}\""))
}

pub async fn run(ctx: &mut Context) -> Result<()> {
    let root = ctx.root()?;
    let api = ctx.api();
    let prompter = ctx.prompter();

    let brands = api.brands().await.map_err(boxed)?.brands;
    if ctx.debug {
        println!("{}", visual::to_tab_json(&brands)?);
    }
    if brands.is_empty() {
        bail!("No brands available for this account");
    }

    let brand = pick(
        &prompter,
        "Which brand should the visual belong to?",
        &brands,
        |b| b.name.clone(),
    )?;
    let &(format, _) = pick(
        &prompter,
        "Which output format will the visual have?",
        &Format::CREATABLE,
        |(_, label)| label.to_string(),
    )?;

    let name = ask_name(&prompter)?;
    let description = prompter
        .input("Visual description (optional):")
        .map_err(boxed)?;
    let tags = parse_tags(
        &prompter
            .input("Visual tags (comma separated, optional):")
            .map_err(boxed)?,
    );

    let payload = NewVisual {
        git_organization_name: brand.git_organization_name.clone(),
        output_category: format,
        name: name.clone(),
        description: description.clone(),
        tags: tags.clone(),
    };
    println!("{}", visual::to_tab_json(&payload)?);

    if !prompter.confirm("Is the data correct?", true).map_err(boxed)? {
        println!("{}", "Cancelled".yellow());
        return Ok(());
    }

    let spinner = ctx.spinner("Creating visual");
    let created = match api.create_visual(&payload).await {
        Ok(created) => created,
        Err(e) => {
            spinner.finish(false, "Creating the visual failed");
            return Err(boxed(e));
        }
    };
    spinner.finish(true, "Visual created");

    let id = VisualId::new(&brand.git_organization_name, &created.git_repo_name);
    let repo = id.dir(&root);
    fs::create_dir_all(&repo).with_context(|| format!("failed to create {}", repo.display()))?;

    let git = ctx.git();
    git.clone_repo(&created.origin, &repo, None)
        .await
        .map_err(boxed)
        .context("failed to clone the new repository")?;
    println!("{}", "Repository cloned".green());
    println!("{}", format!("Repository: {}", repo.display()).green());

    let config = VisualConfig::new(name, description, format, tags);
    fs::write(repo.join("config.json"), visual::to_tab_json(&config)?)?;
    fs::write(repo.join("schema.json"), "{}")?;

    sync::apply_identity(&repo, &git, &GitIdentity::from_settings(&ctx.settings)).await;
    git.add_all(&repo).await.map_err(boxed)?;
    git.commit(&repo, "Init commit").await.map_err(boxed)?;
    git.push(&repo, PUSH_REMOTE, PUSH_BRANCH)
        .await
        .map_err(boxed)?;
    println!("{}", "Created config.json and pushed the first commit".green());

    ctx.settings.set(settings::NEWEST_VISUAL, id.to_string());
    ctx.save()?;
    tracing::info!(visual = %id, "Visual created");

    println!("{}", format!("Visual templates are available at {TEMPLATES_URL}").green());
    println!(
        "{}",
        format!(
            "After copying a template start development with: {}",
            ctx.target.command("dev --newest")
        )
        .green()
    );
    Ok(())
}

pub async fn clone(ctx: &Context, repo: &str) -> Result<()> {
    let id: VisualId = repo.parse().context("Invalid repo name")?;
    let root = ctx.root()?;
    let (Some(username), Some(password)) = (ctx.settings.username(), ctx.settings.password())
    else {
        return Err(ApiError::NoCredentials(ctx.target.command("login")).into());
    };

    let dest = id.dir(&root);
    if dest.is_file() || fs::read_dir(&dest).map(|mut d| d.next().is_some()).unwrap_or(false) {
        println!("{}", "Repository already cloned".red());
        return Ok(());
    }
    fs::create_dir_all(&dest).with_context(|| format!("failed to create {}", dest.display()))?;

    println!("{}", "Starting cloning...".blue());
    let remote = ctx.urls.git_remote(username, password, &id.to_string());
    ctx.git()
        .clone_repo(&remote, &dest, Some(1))
        .await
        .map_err(boxed)?;
    println!("{}", "Repository successfully cloned".green());
    Ok(())
}
