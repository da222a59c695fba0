#![allow(unused)]

//! # contract: boundaries between the workflows and the outside world
//!
//! Every workflow in this crate talks to remote services, git, the terminal
//! and native converters only through the traits below. The CLI crate
//! provides the real implementations (HTTP client, git CLI wrapper, terminal
//! prompter, GraphicsMagick); tests use the generated mocks.
//!
//! ## Interface & Extensibility
//! - All remote and process-bound methods are async and return [`BoxError`].
//! - Implementations are `Send + Sync` so workflows can fan out with
//!   `join_all` and spawned tasks.
//!
//! ## Mocking & Testing
//! - The traits are annotated for `mockall`; `MockAccountsApi`, `MockGit`,
//!   `MockPrompter`, ... are exported with the `test-export-mocks` feature.

use crate::git_status::GitStatus;
use crate::model::{
    Bundle, BrandListing, CreatedVisual, Endpoint, NewBundle, NewVisual, SchemaValidation,
    SyncListing, Token, User,
};
use crate::report::ReportEvent;
use async_trait::async_trait;
use mockall::{automock, predicate::*};
use std::path::Path;

/// Error type crossing trait boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Accounts service: identity and OAuth.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait AccountsApi: Send + Sync {
    /// Currently authenticated user (requires a token).
    async fn user(&self) -> Result<User, BoxError>;

    /// Exchanges an authorization code for a token.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Token, BoxError>;

    /// Unauthenticated liveness probe; returns the `message` field.
    async fn ping(&self) -> Result<String, BoxError>;
}

/// Client application CLI API (basic auth with git credentials).
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ClientApi: Send + Sync {
    /// All visuals of the user grouped by brand.
    async fn visuals(&self) -> Result<SyncListing, BoxError>;

    /// Raw `visual` listing, for diagnostics.
    async fn visuals_raw(&self) -> Result<serde_json::Value, BoxError>;

    async fn brands(&self) -> Result<BrandListing, BoxError>;

    async fn create_visual(&self, visual: &NewVisual) -> Result<CreatedVisual, BoxError>;
}

/// Devstack: remote bundles, their filesystem, and schema validation.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DevstackApi: Send + Sync {
    async fn create_bundle(&self, request: &NewBundle) -> Result<Bundle, BoxError>;

    async fn bundle(&self, id: &str) -> Result<Bundle, BoxError>;

    async fn delete_bundle(&self, id: &str) -> Result<(), BoxError>;

    /// Calls one of the filesystem endpoints handed out with a bundle.
    async fn call_endpoint(
        &self,
        endpoint: &Endpoint,
        body: &serde_json::Value,
    ) -> Result<(), BoxError>;

    /// Posts a schema to the validator and returns its verdict.
    async fn validate_schema(
        &self,
        schema: &serde_json::Value,
    ) -> Result<SchemaValidation, BoxError>;
}

/// Git operations on a working copy.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Git: Send + Sync {
    /// Clones `origin` into `dest`; `depth` makes a shallow clone.
    async fn clone_repo(&self, origin: &str, dest: &Path, depth: Option<u32>)
        -> Result<(), BoxError>;

    async fn fetch(&self, repo: &Path) -> Result<(), BoxError>;

    async fn pull(&self, repo: &Path) -> Result<(), BoxError>;

    async fn status(&self, repo: &Path) -> Result<GitStatus, BoxError>;

    /// Stages every change, including deletions.
    async fn add_all(&self, repo: &Path) -> Result<(), BoxError>;

    async fn commit(&self, repo: &Path, message: &str) -> Result<(), BoxError>;

    async fn push(&self, repo: &Path, remote: &str, branch: &str) -> Result<(), BoxError>;

    /// Value of `key` in the repository-local config.
    async fn local_config(&self, repo: &Path, key: &str) -> Result<Option<String>, BoxError>;

    async fn set_local_config(&self, repo: &Path, key: &str, value: &str)
        -> Result<(), BoxError>;
}

/// Interactive questions. Selections return indices into `choices`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Prompter: Send + Sync {
    fn select(&self, message: &str, choices: &[String]) -> Result<usize, BoxError>;

    fn multi_select(
        &self,
        message: &str,
        choices: &[String],
        defaults: &[bool],
    ) -> Result<Vec<usize>, BoxError>;

    fn input(&self, message: &str) -> Result<String, BoxError>;

    fn confirm(&self, message: &str, default: bool) -> Result<bool, BoxError>;
}

/// Converts the first page of a PDF into a JPEG.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(
        &self,
        pdf: &Path,
        output: &Path,
        density: u32,
        width: u32,
        height: u32,
    ) -> Result<(), BoxError>;
}

/// Remote error tracking.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ErrorReporter: Send + Sync {
    async fn capture(&self, event: ReportEvent) -> Result<(), BoxError>;
}
