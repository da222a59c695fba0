//! One module per command group. Each function prints its own results and
//! returns `anyhow::Result`; `main` turns errors into the exit code.

pub mod build;
pub mod create;
pub mod dev;
pub mod git;
pub mod login;
pub mod misc;
pub mod report;
pub mod sync;
pub mod validate;

use crate::http::ApiError;
use nebe_core::contract::BoxError;
use nebe_core::environment::{Environment, Target};

/// Lifts an error from a trait seam into `anyhow`. An [`ApiError`] stays
/// reachable through `downcast_ref` on the error chain.
pub fn boxed(error: BoxError) -> anyhow::Error {
    match error.downcast::<ApiError>() {
        Ok(api) => anyhow::Error::new(*api),
        Err(other) => anyhow::anyhow!(other),
    }
}

/// Environment label attached to error reports.
pub fn environment_name(target: Target) -> &'static str {
    match target.environment {
        Environment::Production => "production",
        Environment::Staging => "staging",
        Environment::Local => "local",
    }
}
