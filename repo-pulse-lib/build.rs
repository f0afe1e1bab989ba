//! This build script validates the default configuration file (`default_config.toml`)

use ohno::{IntoAppError, app_err};
use std::env;
use std::path::PathBuf;
use std::process;

type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

const KNOWN_KEYS: &[&str] = &[
    "bind",
    "port",
    "allowed_origins",
    "api_base_url",
    "refresh_interval",
    "request_timeout",
    "max_star_events",
    "max_star_pages",
    "max_concurrent_requests",
    "trending_window_days",
    "seed",
];

fn main() {
    match inner_main() {
        Ok(()) => {
            println!("cargo:rerun-if-changed=default_config.toml");
            println!("cargo:rerun-if-changed=build.rs");
        }
        Err(e) => {
            eprintln!("unable to load default_config.toml: {e:?}");
            process::exit(1);
        }
    }
}

fn inner_main() -> Result<()> {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").into_app_err("CARGO_MANIFEST_DIR should be set during build")?;
    let config_path = PathBuf::from(manifest_dir).join("default_config.toml");

    let text = std::fs::read_to_string(&config_path).into_app_err("reading default_config.toml")?;
    let table: toml::Table = toml::from_str(&text).into_app_err("parsing default_config.toml")?;

    if let Some(key) = table.keys().find(|key| !KNOWN_KEYS.contains(&key.as_str())) {
        return Err(app_err!("unknown setting '{key}' in default_config.toml"));
    }

    Ok(())
}
