#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for repo-pulse
//!
//! This library consolidates all functionality for the repo-pulse tool, which fetches
//! repository metadata from GitHub, synthesizes star and fork analytics from it, and
//! serves the result over HTTP and a WebSocket push channel.
//!
//! # Module Organization
//!
//! - [`analytics`]: The synthesis engine turning sparse ground truth into chartable series
//! - [`facts`]: Data collection from the hosting API
//! - [`serve`]: HTTP endpoints and the push channel
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod analytics;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub mod facts;

pub mod serve;

pub use crate::commands::{Host, run};
