use clap::Parser;
use colored::Colorize;
use nebe::cli::{run, Cli};
use nebe::commands::environment_name;
use nebe::http::response_body;
use nebe::reporter::HttpReporter;
use nebe_core::contract::ErrorReporter;
use nebe_core::report::ReportEvent;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_error(error: &anyhow::Error, debug: bool) {
    if !debug {
        eprintln!("{}", format!("{error:#}").red());
        return;
    }
    eprintln!("{}", format!("{error:?}").red());
    if let Some(body) = response_body(error) {
        eprintln!("{}", body.red());
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.debug);
    tracing::info!("CLI arguments parsed, invoking run");

    let debug = cli.debug;
    let target = cli.target();
    let command = cli.command.name();

    match run(cli).await {
        Ok(()) => {
            tracing::info!(command, "CLI completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(command, error = %e, "CLI exited with error");
            let event = ReportEvent::from_error(e.as_ref())
                .with_environment(environment_name(target))
                .with_tag("command", command)
                .with_tag("tenant", target.bin());
            if let Err(report_error) = HttpReporter::from_env().capture(event).await {
                tracing::warn!(error = %report_error, "Failed to report error");
            }
            print_error(&e, debug);
            ExitCode::FAILURE
        }
    }
}
