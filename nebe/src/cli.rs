//! # nebe CLI interface
//!
//! Command parsing and routing. [`Cli`] declares the global flags and every
//! subcommand; [`run`] resolves the target (environment and tenant), loads
//! the settings and hands over to the matching module in [`crate::commands`].
//!
//! All workflow logic lives in `nebe-core`; the command modules only wire
//! the concrete clients to it and print results.
//!
//! ## How To Use
//! - From the shell: `nebe --help`.
//! - From tests: build a [`Cli`] with `Cli::parse_from` and call [`run`].

use crate::commands;
use crate::context::Context;
use anyhow::Result;
use clap::{Parser, Subcommand};
use nebe_core::environment::{Environment, Target, Tenant};

/// Create, sync, preview and build nebe visuals.
#[derive(Debug, Parser)]
#[clap(name = "nebe", version, about = "Create, sync, preview and build nebe visuals")]
pub struct Cli {
    /// Verbose logging and full error output
    #[clap(long, short, global = true)]
    pub debug: bool,

    /// Use the local development stack
    #[clap(long, global = true)]
    pub local: bool,

    /// Use the staging services
    #[clap(long, global = true, hide = true)]
    pub staging: bool,

    /// Use the Sazka tenant
    #[clap(long, global = true)]
    pub sazka: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn target(&self) -> Target {
        let environment = if self.local {
            Environment::Local
        } else if self.staging {
            Environment::Staging
        } else {
            Environment::Production
        };
        let tenant = if self.sazka {
            Tenant::Sazka
        } else {
            Tenant::Default
        };
        Target::new(environment, tenant)
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Authorize the CLI against the web application
    Login,
    /// Create a new visual
    Create,
    /// Clone a visual repository (`brand/repo`)
    #[clap(hide = true)]
    Clone { repo: String },
    /// Synchronize the visuals selected in the web application
    Sync {
        /// Clone with history depth 1
        #[clap(long, short)]
        shallow: bool,
    },
    /// Fetch every local visual
    Fetch,
    /// Pull every local visual
    Pull,
    /// Commit and push the selected changed visuals
    Push,
    /// Commit and push every changed visual
    #[clap(hide = true)]
    Commit,
    /// Show the state of local visuals
    Status,
    /// Preview a visual locally and in the studio
    Dev {
        /// Open the visual created last
        #[clap(long, short)]
        newest: bool,
        /// Open the visual of the previous dev session
        #[clap(long, short)]
        latest: bool,
        /// Local preview only, no remote bundle
        #[clap(long)]
        offline: bool,
    },
    /// Build every visual of a brand into dist-build
    #[clap(hide = true)]
    Build,
    /// Convert the print PDFs of a visual to JPEG
    ConvertPdf,
    /// Validate config and schema of all local visuals
    Validate,
    /// Print stored settings
    #[clap(hide = true)]
    Debug,
    /// Print the version of the CLI
    Version,
    /// Ping the CLI
    #[clap(hide = true)]
    Ping,
    /// Recreate package.json in the root folder
    #[clap(hide = true)]
    Reset {
        /// Also clear stored settings
        #[clap(long)]
        config: bool,
    },
    /// Show or set the root folder
    Root { path: Option<std::path::PathBuf> },
    /// Send the current configuration to error tracking
    #[clap(hide = true)]
    SendReport,
    /// Check that the accounts service answers
    #[clap(hide = true)]
    TestAccounts,
    /// Check that the client CLI API answers
    #[clap(hide = true)]
    TestCliController,
    /// Send a test event to error tracking
    #[clap(hide = true)]
    TestReporter,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Login => "login",
            Commands::Create => "create",
            Commands::Clone { .. } => "clone",
            Commands::Sync { .. } => "sync",
            Commands::Fetch => "fetch",
            Commands::Pull => "pull",
            Commands::Push => "push",
            Commands::Commit => "commit",
            Commands::Status => "status",
            Commands::Dev { .. } => "dev",
            Commands::Build => "build",
            Commands::ConvertPdf => "convert-pdf",
            Commands::Validate => "validate",
            Commands::Debug => "debug",
            Commands::Version => "version",
            Commands::Ping => "ping",
            Commands::Reset { .. } => "reset",
            Commands::Root { .. } => "root",
            Commands::SendReport => "send-report",
            Commands::TestAccounts => "test-accounts",
            Commands::TestCliController => "test-cli-controller",
            Commands::TestReporter => "test-reporter",
        }
    }
}

/// Async entrypoint shared by `main` and the integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    let target = cli.target();
    tracing::info!(command = cli.command.name(), ?target, "Running command");

    // Commands that need no settings.
    match &cli.command {
        Commands::Version => return commands::misc::version(),
        Commands::Ping => return commands::misc::ping(),
        _ => {}
    }

    let mut ctx = Context::load(target, cli.debug)?;

    match cli.command {
        Commands::Login => commands::login::run(&mut ctx).await,
        Commands::Create => commands::create::run(&mut ctx).await,
        Commands::Clone { repo } => commands::create::clone(&ctx, &repo).await,
        Commands::Sync { shallow } => commands::sync::run(&mut ctx, shallow).await,
        Commands::Fetch => commands::git::fetch(&ctx).await,
        Commands::Pull => commands::git::pull(&ctx).await,
        Commands::Push => commands::git::push(&mut ctx).await,
        Commands::Commit => commands::git::commit(&ctx).await,
        Commands::Status => commands::git::status(&mut ctx).await,
        Commands::Dev {
            newest,
            latest,
            offline,
        } => commands::dev::run(&mut ctx, commands::dev::start(newest, latest), offline).await,
        Commands::Build => commands::build::build(&ctx),
        Commands::ConvertPdf => commands::build::convert_pdf(&ctx).await,
        Commands::Validate => commands::validate::run(&mut ctx).await,
        Commands::Debug => commands::misc::debug(&ctx),
        Commands::Reset { config } => commands::misc::reset(&mut ctx, config),
        Commands::Root { path } => commands::misc::root(&mut ctx, path),
        Commands::SendReport => commands::report::send_report(&ctx).await,
        Commands::TestAccounts => commands::report::test_accounts(&ctx).await,
        Commands::TestCliController => commands::report::test_cli_controller(&mut ctx).await,
        Commands::TestReporter => commands::report::test_reporter(&ctx).await,
        Commands::Version | Commands::Ping => Ok(()),
    }
}
