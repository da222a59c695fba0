#![doc = "nebe-core: core logic library for the nebe CLI."]

//! This crate holds the data model, settings store and every workflow the
//! `nebe` binary orchestrates (sync, batch git operations, build, pdf
//! conversion, dev sessions). Anything that talks to the outside world goes
//! through the traits in [`contract`], so the workflows can be driven by
//! mocks in tests and by real clients in the CLI crate.
//!
//! # Usage
//! Depend on this crate from the CLI and provide concrete implementations
//! of the [`contract`] traits.

pub mod batch;
pub mod build;
pub mod checks;
pub mod contract;
pub mod dev;
pub mod environment;
pub mod fill;
pub mod git_status;
pub mod markup;
pub mod model;
pub mod pdf;
pub mod report;
pub mod settings;
pub mod sync;
pub mod visual;

/// Version of the tool, embedded into generated markup and error reports.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
