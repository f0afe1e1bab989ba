//! Setup shared by every command that talks to the hosting API.

use super::config::Config;
use crate::Result;
use crate::facts::Collector;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use log::LevelFilter;

const LOG_TARGET: &str = "  commands";

/// How much diagnostic output to emit on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Nothing at all
    None,
    Error,
    Warn,
    /// Fetches, connections and other milestones
    Info,
    /// Pagination and synthesis detail
    Debug,
    Trace,
}

impl LogLevel {
    const fn filter(self) -> Option<LevelFilter> {
        match self {
            Self::None => None,
            Self::Error => Some(LevelFilter::Error),
            Self::Warn => Some(LevelFilter::Warn),
            Self::Info => Some(LevelFilter::Info),
            Self::Debug => Some(LevelFilter::Debug),
            Self::Trace => Some(LevelFilter::Trace),
        }
    }
}

/// Arguments shared between the serve and report commands
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Path to configuration file (default is `repo-pulse.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,
}

/// Everything a command needs once the arguments are processed
#[derive(Debug)]
pub struct Common {
    pub config: Config,
    pub collector: Collector,
}

impl Common {
    pub fn new(args: &CommonArgs) -> Result<Self> {
        init_logging(args.log_level);

        let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
        let collector = Collector::new(args.github_token.as_deref(), config.hosting_options(), config.seed)?;

        if args.github_token.is_none() {
            log::warn!(target: LOG_TARGET, "No GitHub token provided; requests are subject to the anonymous rate limit");
        }

        Ok(Self { config, collector })
    }
}

/// Install the logger; `RUST_LOG`, when set, takes precedence over `--log-level`.
fn init_logging(log_level: LogLevel) {
    let Some(level) = log_level.filter() else {
        return;
    };

    // a logger may already be installed when commands run more than once in a process
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(level >= LevelFilter::Debug)
        .try_init();
}
