//! Local HTTP servers: the OAuth callback of `login`, and the state and
//! preview servers of `dev`.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use nebe_core::contract::AccountsApi;
use nebe_core::dev::state::SharedState;
use nebe_core::model::Token;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

const LOGIN_PAGE: &str = include_str!("../assets/login.html");

/// A server running on a background task until [`Server::shutdown`].
pub struct Server {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl Server {
    /// Binds `addr` before returning, so an occupied port fails here.
    pub async fn spawn(addr: SocketAddr, router: Router) -> std::io::Result<Server> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();
        tracing::info!(%addr, "Server listening");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await
        });

        Ok(Server {
            addr,
            shutdown: Some(tx),
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.handle.await {
            Ok(Ok(())) => tracing::debug!(addr = %self.addr, "Server stopped"),
            Ok(Err(e)) => tracing::warn!(addr = %self.addr, error = %e, "Server failed"),
            Err(e) => tracing::warn!(addr = %self.addr, error = %e, "Server task failed"),
        }
    }
}

/// Data the OAuth callback needs to finish the authorization-code flow.
pub struct OAuthCallback {
    pub accounts: Arc<dyn AccountsApi>,
    pub expected_state: String,
    pub redirect_uri: String,
    pub client_id: String,
    pub client_secret: String,
    /// Filled once the code has been exchanged.
    pub token: Mutex<Option<Token>>,
}

impl OAuthCallback {
    pub fn take_token(&self) -> Option<Token> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

pub fn oauth_router(callback: Arc<OAuthCallback>) -> Router {
    Router::new()
        .route("/", get(oauth_callback))
        .with_state(callback)
}

async fn oauth_callback(
    State(callback): State<Arc<OAuthCallback>>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Unable to login").into_response();
    };
    if query.state.as_deref() != Some(callback.expected_state.as_str()) {
        tracing::warn!("OAuth callback with unexpected state");
        return (StatusCode::BAD_REQUEST, "Invalid login state").into_response();
    }

    match callback
        .accounts
        .exchange_code(
            &code,
            &callback.redirect_uri,
            &callback.client_id,
            &callback.client_secret,
        )
        .await
    {
        Ok(token) => {
            *callback
                .token
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(token);
            tracing::info!("Authorization code exchanged");
            Html(LOGIN_PAGE).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Authorization code exchange failed");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// `GET /state` with CORS open to any origin.
pub fn state_router(state: SharedState) -> Router {
    Router::new()
        .route("/state", get(dev_state))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

async fn dev_state(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    Json(state.clone())
}

/// Static preview of one built size folder.
pub fn preview_router(dir: &Path) -> Router {
    Router::new().fallback_service(ServeDir::new(dir))
}
