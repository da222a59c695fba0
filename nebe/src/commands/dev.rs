//! # dev: live preview of one visual
//!
//! Wires the pieces of `nebe_core::dev` to real servers, the file watcher
//! and the devstack:
//!
//! 1. ports are checked, the visual is chosen and remembered as `lastDev`,
//! 2. `dist/` is prepared and every selected size gets a preview server on
//!    consecutive ports from the tenant's base port,
//! 3. the state server answers `GET /state` on port 1400,
//! 4. unless `--offline`, a remote bundle is started and every file of the
//!    visual is uploaded,
//! 5. file changes are debounced, classified, sent to the bundle and
//!    rebuilt locally until Ctrl+C or SIGTERM,
//! 6. the remote bundle is deleted and the servers stop.
//!
//! # Error Handling
//! Errors before the servers run abort the command. Once running, failures
//! of single rebuilds or remote calls are printed and logged; a remote
//! bundle that cannot start leaves the local preview running.

use crate::commands::validate::{print_config_check, print_schema_check};
use crate::context::Context;
use crate::server::{self, Server};
use anyhow::{Context as _, Result};
use colored::Colorize;
use nebe_core::contract::{DevstackApi, Git};
use nebe_core::dev::events::{self, Tracker, DEBOUNCE};
use nebe_core::dev::preview::DevWorkspace;
use nebe_core::dev::remote::RemoteSync;
use nebe_core::dev::session::{RemoteSession, SessionConfig};
use nebe_core::dev::state::{DevState, PreviewState, RemoteState, SharedState};
use nebe_core::dev::{self, watch, DevError, Reaction, Start};
use nebe_core::environment::STATE_PORT;
use nebe_core::model::NewBundle;
use nebe_core::settings;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

pub fn start(newest: bool, latest: bool) -> Start {
    if newest {
        Start::Newest
    } else if latest {
        Start::Latest
    } else {
        Start::Ask
    }
}

fn local_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Fails on the first port another process holds.
pub async fn check_ports(ports: &[u16]) -> Result<(), DevError> {
    for &port in ports {
        match tokio::net::TcpListener::bind(local_addr(port)).await {
            Ok(listener) => drop(listener),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                return Err(DevError::PortInUse(port))
            }
            Err(e) => {
                tracing::warn!(port, error = %e, "Cannot check port, continuing");
                println!(
                    "{}",
                    format!("Could not check whether port {port} is available, continuing").yellow()
                );
            }
        }
    }
    Ok(())
}

/// Rebuilds one preview; returns the error to publish in the state.
fn build_preview(workspace: &DevWorkspace, size: &str) -> Option<String> {
    match workspace.build_size(size) {
        Ok(true) => None,
        Ok(false) => {
            println!(
                "{}",
                format!("Resize {size} does not contain element <main>!").red()
            );
            None
        }
        Err(e) => {
            tracing::error!(size, error = %e, "Preview build failed");
            println!("{}", format!("Error {size}: {e}").red());
            Some(e.to_string())
        }
    }
}

async fn record_build(state: &SharedState, size: &str, error: Option<String>) {
    let mut state = state.write().await;
    for preview in state.bundlers.values_mut() {
        if preview.folder == size {
            preview.error = error.clone();
        }
    }
}

async fn refresh_git_status(state: &SharedState, git: &dyn Git, dir: &Path) {
    let status = match git.status(dir).await {
        Ok(status) => Some(status),
        Err(e) => {
            tracing::debug!(error = %e, "No git status for dev state");
            None
        }
    };
    state.write().await.git_status = status;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Everything a change needs to be handled.
struct LiveSession<'a> {
    workspace: DevWorkspace,
    sizes: Vec<String>,
    state: SharedState,
    devstack: Arc<dyn DevstackApi>,
    git: &'a dyn Git,
    tracker: Tracker,
    remote: Option<RemoteSync>,
}

impl LiveSession<'_> {
    async fn on_change(&mut self, relative: &Path) {
        let actions = self
            .tracker
            .classify_all(self.workspace.visual_dir(), relative);
        tracing::debug!(path = %relative.display(), ?actions, "File changed");
        if let Some(remote) = &self.remote {
            for (path, action) in &actions {
                remote.dispatch(path, *action);
            }
        }

        match dev::reaction_for(relative, &self.sizes) {
            Reaction::Schema => {
                println!("Schema changed, checking and rebundling...");
                let check = self.workspace.refresh_schema(self.devstack.as_ref()).await;
                print_schema_check(&check);
                self.state.write().await.apply_schema(&check);
                for size in &self.sizes {
                    let error = build_preview(&self.workspace, size);
                    record_build(&self.state, size, error).await;
                }
            }
            Reaction::Config => {
                println!("Config changed, validating");
                match self.workspace.copy_config() {
                    Ok(check) => {
                        print_config_check(&check);
                        self.state.write().await.config = check.config;
                    }
                    Err(e) => println!("{}", format!("Cannot copy config.json: {e}").red()),
                }
            }
            Reaction::Size(size) => {
                let error = build_preview(&self.workspace, &size);
                record_build(&self.state, &size, error).await;
            }
            Reaction::Include => {
                if let Err(e) = self.workspace.copy_include() {
                    println!("{}", format!("Cannot copy include folder: {e}").red());
                }
            }
            Reaction::None => {}
        }

        refresh_git_status(&self.state, self.git, self.workspace.visual_dir()).await;
    }
}

pub async fn run(ctx: &mut Context, start: Start, offline: bool) -> Result<()> {
    let root = ctx.root()?;
    let base_port = ctx.target.dev_base_port();
    check_ports(&[base_port, STATE_PORT]).await?;

    let prompter = ctx.prompter();
    let visual = dev::choose_visual(&root, &ctx.settings, start, &prompter)?;
    ctx.settings.set(settings::LAST_DEV, visual.to_string());
    ctx.save()?;
    println!("Building {visual}");

    let devstack: Arc<dyn DevstackApi> = Arc::new(ctx.api());
    let git = ctx.git();

    let mut workspace = DevWorkspace::new(&root, visual.clone(), &ctx.urls);
    let config = workspace.prepare()?;
    print_config_check(&config);
    let schema = workspace.refresh_schema(devstack.as_ref()).await;
    print_schema_check(&schema);

    let sizes = workspace.sizes();
    if !sizes.is_empty() {
        println!("Serving {} visual sizes", sizes.len());
    }
    let selected = dev::select_sizes(&sizes, &prompter)?;
    println!("Running previews for resizes: {}", selected.join(", "));

    let state: SharedState = Arc::new(RwLock::new(DevState::new(visual.to_string())));
    {
        let mut state = state.write().await;
        state.config = config.config.clone();
        state.apply_schema(&schema);
        state.folders = selected.clone();
    }
    refresh_git_status(&state, &git, workspace.visual_dir()).await;

    let mut servers = Vec::new();
    for (i, size) in selected.iter().enumerate() {
        let port = base_port + i as u16;
        let error = build_preview(&workspace, size);
        let dir = workspace.size_dir(size);
        std::fs::create_dir_all(&dir)?;
        let server = Server::spawn(local_addr(port), server::preview_router(&dir))
            .await
            .with_context(|| format!("failed to serve {size} on port {port}"))?;
        println!("{}", format!("{size}: http://localhost:{port}").cyan());
        state.write().await.bundlers.insert(
            i,
            PreviewState {
                folder: size.clone(),
                port,
                error,
            },
        );
        servers.push(server);
    }
    servers.push(
        Server::spawn(local_addr(STATE_PORT), server::state_router(Arc::clone(&state)))
            .await
            .with_context(|| format!("failed to serve dev state on port {STATE_PORT}"))?,
    );

    let tracker = Tracker::scan(workspace.visual_dir());
    let mut session = None;
    let mut remote = None;
    if offline {
        println!("{}", "Offline mode, remote preview disabled".yellow());
    } else {
        let spinner = ctx.spinner("Starting remote session");
        let request = NewBundle {
            visual: visual.to_string(),
            sizes: selected.clone(),
        };
        match RemoteSession::start(Arc::clone(&devstack), &request, SessionConfig::default()).await
        {
            Ok(started) => {
                spinner.set_message("Uploading files");
                state.write().await.remote = Some(RemoteState::from(started.bundle()));
                let sync = RemoteSync::new(
                    started.devstack(),
                    started.bundle().endpoints.clone(),
                    workspace.visual_dir().to_path_buf(),
                );
                let summary = sync.upload_all(tracker.files()).await;
                spinner.finish(
                    summary.failed == 0,
                    format!(
                        "Remote session ready, uploaded {} files ({} failed)",
                        summary.sent, summary.failed
                    ),
                );
                if let Some(url) = &started.bundle().preview_url {
                    println!("{}", format!("Remote preview: {url}").cyan());
                }
                remote = Some(sync);
                session = Some(started);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Remote session unavailable");
                spinner.finish(
                    false,
                    format!("Remote session unavailable, local preview only: {e}"),
                );
            }
        }
    }

    let (watcher, raw) = watch::watch(workspace.visual_dir())
        .with_context(|| format!("failed to watch {}", workspace.visual_dir().display()))?;
    let mut changes = events::debounce(raw, DEBOUNCE);

    let mut running = LiveSession {
        workspace,
        sizes: selected,
        state,
        devstack,
        git: &git,
        tracker,
        remote,
    };

    println!("Listening to file changes... Press Ctrl+C to stop servers");
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            changed = changes.recv() => match changed {
                Some(relative) => running.on_change(&relative).await,
                None => break,
            },
            _ = &mut shutdown => break,
        }
    }
    drop(watcher);

    println!("{}", "Stopping...".blue());
    if let Some(session) = session {
        match session.teardown().await {
            Ok(()) => println!("{}", "Remote session closed".green()),
            Err(e) => println!("{}", format!("{e}").yellow()),
        }
    }
    for server in servers {
        server.shutdown().await;
    }
    Ok(())
}
