//! Command-line interface and orchestration for repo-pulse
//!
//! This module implements the CLI commands and wires the hosting client, the analytics
//! engine, and the HTTP server together. It handles argument parsing, configuration
//! management, and the high-level workflows.
//!
//! ## Commands
//!
//! - **serve**: Run the HTTP API and WebSocket push channel
//! - **report**: Collect the report for one repository and print or save it as JSON
//! - **init**: Generate a default configuration file
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. Commands that reach the hosting API share the setup in
//! `common`: logging, configuration loading, and construction of the collector.
//!
//! Configuration is read from a TOML file (`repo-pulse.toml` by default) whose values all
//! have defaults, so the file is optional.

mod common;
mod config;
mod host;
mod init;
mod report;
mod run;
mod serve;

#[cfg(debug_assertions)]
pub use config::Config;

pub use host::Host;
pub use init::{InitArgs, init_config};
pub use report::{ReportArgs, process_report};
pub use run::run;
pub use serve::{ServeArgs, serve_api};
