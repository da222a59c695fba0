//! `login`: OAuth authorization-code flow through the browser.
//!
//! A callback server listens on `127.0.0.1:8050`, the browser is sent to
//! the accounts authorize page, and the command polls until the callback
//! has exchanged the code for a token. The token and the user it belongs to
//! are then stored in the settings.

use super::boxed;
use crate::context::Context;
use crate::server::{self, OAuthCallback, Server};
use anyhow::{bail, Context as _, Result};
use colored::Colorize;
use nebe_core::contract::AccountsApi;
use nebe_core::environment::{ServiceUrls, Target, OAUTH_CALLBACK_PORT};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CLIENT_ID_ENV: &str = "NEBE_OAUTH_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "NEBE_OAUTH_CLIENT_SECRET";

const CHECK_INTERVAL: Duration = Duration::from_secs(2);
const MAX_CHECKS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthClient {
    pub id: String,
    pub secret: String,
}

impl OAuthClient {
    /// Public client of the target, overridable from the environment.
    pub fn for_target(target: Target) -> Self {
        let (id, secret) = if target.is_local() {
            (
                "963b867a-f8a3-4abf-abc7-9b2cf27376eb",
                "wCeDg2MlEkVURVpVPxxN1cq9R9qhBZcu2lXVK3eY",
            )
        } else {
            (
                "963bd29c-5162-4e81-b3c7-e6b22915d68e",
                "EDBe481iZWGXk4hnOJUH9FcFqRu7yxzrjDYYj83x",
            )
        };
        Self {
            id: env_or(CLIENT_ID_ENV, id),
            secret: env_or(CLIENT_SECRET_ENV, secret),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn redirect_uri() -> String {
    format!("http://localhost:{OAUTH_CALLBACK_PORT}")
}

/// Random 40 character `state` parameter.
pub fn random_state() -> String {
    let mut state = format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    );
    state.truncate(40);
    state
}

pub fn authorize_url(
    urls: &ServiceUrls,
    client: &OAuthClient,
    redirect_uri: &str,
    state: &str,
) -> Result<url::Url> {
    let base = urls.accounts_url("oauth/authorize");
    let url = url::Url::parse_with_params(
        &base,
        [
            ("client_id", client.id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", ""),
            ("state", state),
        ],
    )
    .with_context(|| format!("invalid authorize url {base}"))?;
    Ok(url)
}

pub async fn run(ctx: &mut Context) -> Result<()> {
    let client = OAuthClient::for_target(ctx.target);
    let state = random_state();
    let redirect = redirect_uri();

    let callback = Arc::new(OAuthCallback {
        accounts: Arc::new(ctx.api()),
        expected_state: state.clone(),
        redirect_uri: redirect.clone(),
        client_id: client.id.clone(),
        client_secret: client.secret.clone(),
        token: Mutex::new(None),
    });
    let addr = SocketAddr::from(([127, 0, 0, 1], OAUTH_CALLBACK_PORT));
    let server = Server::spawn(addr, server::oauth_router(Arc::clone(&callback)))
        .await
        .with_context(|| format!("failed to listen on port {OAUTH_CALLBACK_PORT}"))?;
    if ctx.debug {
        println!("{}", format!("Listening on port {OAUTH_CALLBACK_PORT}").green());
    }

    let url = authorize_url(&ctx.urls, &client, &redirect, &state)?;
    if let Err(e) = open::that(url.as_str()) {
        tracing::warn!(error = %e, "Failed to open the browser");
    }
    println!("{}", format!("Opening the browser at: {url}").green());

    let spinner = ctx.spinner("Waiting for login...");
    let mut token = None;
    for check in 1..=MAX_CHECKS {
        tokio::time::sleep(CHECK_INTERVAL).await;
        if let Some(received) = callback.take_token() {
            token = Some(received);
            break;
        }
        if ctx.debug {
            spinner.set_message(format!("Waiting for login... ({check}x)"));
        }
    }
    server.shutdown().await;

    let Some(token) = token else {
        spinner.finish(false, "Login timed out, try again");
        bail!("Login timed out after {} checks", MAX_CHECKS);
    };

    ctx.settings.set_token(&token);
    if ctx.settings.access_token().is_none() {
        spinner.finish(false, "Login failed, try again");
        bail!("Received token could not be stored");
    }

    let user = match ctx.api().user().await {
        Ok(user) => user,
        Err(e) => {
            spinner.finish(false, "Login failed");
            return Err(boxed(e).context("failed to load the logged in user"));
        }
    };
    ctx.settings.set_user(&user);
    ctx.save()?;
    tracing::info!(user_id = user.id, "Logged in");
    spinner.finish(true, format!("User {} logged in", user.email));
    Ok(())
}
