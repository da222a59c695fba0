pub mod cli;
pub mod commands;
pub mod context;
pub mod git;
pub mod http;
pub mod output;
pub mod prompt;
pub mod raster;
pub mod reporter;
pub mod server;

pub use cli::{run, Cli, Commands};
