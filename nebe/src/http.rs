//! # HTTP client for the remote services
//!
//! [`ApiClient`] implements the accounts, client and devstack traits of
//! `nebe_core::contract` on top of `reqwest`. Which service a call goes to
//! and how it authenticates is decided here:
//!
//! | Service  | Authentication                        |
//! |----------|---------------------------------------|
//! | accounts | `Authorization` header (cached token) |
//! | client   | basic auth with the git credentials   |
//! | devstack | `Authorization` header (cached token) |
//! | validator| none                                  |
//!
//! Non-success responses become [`ApiError::Status`] carrying the response
//! body, which the CLI prints with `--debug`.

use async_trait::async_trait;
use nebe_core::contract::{AccountsApi, BoxError, ClientApi, DevstackApi};
use nebe_core::environment::ServiceUrls;
use nebe_core::model::{
    BrandListing, Bundle, CreatedVisual, Endpoint, NewBundle, NewVisual, SchemaValidation,
    SyncListing, Token, User,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("User not logged in, please use the \"{0}\" command first")]
    NotLoggedIn(String),
    #[error("git credentials are not stored, please use the \"{0}\" command first")]
    NoCredentials(String),
    #[error("{method} {url} failed with status {status}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },
    #[error("invalid endpoint method `{0}`")]
    Method(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Non-empty response body of the first failed HTTP call in the chain.
pub fn response_body(error: &anyhow::Error) -> Option<&str> {
    error.chain().find_map(|cause| match cause.downcast_ref::<ApiError>() {
        Some(ApiError::Status { body, .. }) if !body.is_empty() => Some(body.as_str()),
        _ => None,
    })
}

#[derive(Debug, Clone, Copy)]
enum Auth {
    None,
    Token,
    Basic,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    urls: ServiceUrls,
    token: Option<String>,
    credentials: Option<(String, String)>,
    login_hint: String,
}

impl ApiClient {
    /// `login_hint` is the command shown when a call needs credentials
    /// that are not stored.
    pub fn new(urls: ServiceUrls, login_hint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            urls,
            token: None,
            credentials: None,
            login_hint: login_hint.into(),
        }
    }

    /// `Authorization` header value for accounts and devstack calls.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_credentials(mut self, username: Option<&str>, password: Option<&str>) -> Self {
        self.credentials = match (username, password) {
            (Some(u), Some(p)) => Some((u.to_string(), p.to_string())),
            _ => None,
        };
        self
    }

    pub fn urls(&self) -> &ServiceUrls {
        &self.urls
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        auth: Auth,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .header(reqwest::header::ACCEPT, "application/json");

        request = match auth {
            Auth::None => request,
            Auth::Token => {
                let token = self
                    .token
                    .as_deref()
                    .ok_or_else(|| ApiError::NotLoggedIn(self.login_hint.clone()))?;
                request.header(reqwest::header::AUTHORIZATION, token)
            }
            Auth::Basic => {
                let (username, password) = self
                    .credentials
                    .as_ref()
                    .ok_or_else(|| ApiError::NoCredentials(self.login_hint.clone()))?;
                request.basic_auth(username, Some(password))
            }
        };

        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, url, ?auth, "HTTP request");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%method, url, status = status.as_u16(), "HTTP request failed");
            return Err(ApiError::Status {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        auth: Auth,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        Ok(self.request(method, url, auth, body).await?.json().await?)
    }
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct CreatedVisualResponse {
    visual: CreatedVisual,
}

#[async_trait]
impl AccountsApi for ApiClient {
    async fn user(&self) -> Result<User, BoxError> {
        let url = self.urls.accounts_url("user");
        Ok(self.json(Method::GET, &url, Auth::Token, None).await?)
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Token, BoxError> {
        let url = self.urls.accounts_url("oauth/token");
        let body = json!({
            "grant_type": "authorization_code",
            "code": code,
            "redirect_uri": redirect_uri,
            "client_id": client_id,
            "client_secret": client_secret,
        });
        Ok(self.json(Method::POST, &url, Auth::None, Some(&body)).await?)
    }

    async fn ping(&self) -> Result<String, BoxError> {
        let url = self.urls.accounts_url("public/ping");
        let message: Message = self.json(Method::GET, &url, Auth::None, None).await?;
        Ok(message.message)
    }
}

#[async_trait]
impl ClientApi for ApiClient {
    async fn visuals(&self) -> Result<SyncListing, BoxError> {
        let url = self.urls.api_url("visual");
        Ok(self.json(Method::GET, &url, Auth::Basic, None).await?)
    }

    async fn visuals_raw(&self) -> Result<Value, BoxError> {
        let url = self.urls.api_url("visual");
        Ok(self.json(Method::GET, &url, Auth::Basic, None).await?)
    }

    async fn brands(&self) -> Result<BrandListing, BoxError> {
        let url = self.urls.api_url("brand");
        Ok(self.json(Method::GET, &url, Auth::Basic, None).await?)
    }

    async fn create_visual(&self, visual: &NewVisual) -> Result<CreatedVisual, BoxError> {
        let url = self.urls.api_url("visual");
        let body = serde_json::to_value(visual)?;
        let created: CreatedVisualResponse =
            self.json(Method::POST, &url, Auth::Basic, Some(&body)).await?;
        Ok(created.visual)
    }
}

#[async_trait]
impl DevstackApi for ApiClient {
    async fn create_bundle(&self, request: &NewBundle) -> Result<Bundle, BoxError> {
        let url = self.urls.devstack_url("bundle");
        let body = serde_json::to_value(request)?;
        Ok(self.json(Method::POST, &url, Auth::Token, Some(&body)).await?)
    }

    async fn bundle(&self, id: &str) -> Result<Bundle, BoxError> {
        let url = self.urls.devstack_url(&format!("bundle/{id}"));
        Ok(self.json(Method::GET, &url, Auth::Token, None).await?)
    }

    async fn delete_bundle(&self, id: &str) -> Result<(), BoxError> {
        let url = self.urls.devstack_url(&format!("bundle/{id}"));
        self.request(Method::DELETE, &url, Auth::Token, None).await?;
        Ok(())
    }

    async fn call_endpoint(&self, endpoint: &Endpoint, body: &Value) -> Result<(), BoxError> {
        let method = Method::from_bytes(endpoint.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| ApiError::Method(endpoint.method.clone()))?;
        let url = if endpoint.url.starts_with("http://") || endpoint.url.starts_with("https://") {
            endpoint.url.clone()
        } else {
            self.urls.devstack_url(&endpoint.url)
        };
        self.request(method, &url, Auth::Token, Some(body)).await?;
        Ok(())
    }

    async fn validate_schema(&self, schema: &Value) -> Result<SchemaValidation, BoxError> {
        Ok(self
            .json(Method::POST, &self.urls.validator, Auth::None, Some(schema))
            .await?)
    }
}
