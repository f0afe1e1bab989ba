use super::Host;
use super::common::{Common, CommonArgs};
use crate::Result;
use crate::facts::RepoSpec;
use camino::Utf8PathBuf;
use chrono::Utc;
use clap::Parser;
use ohno::IntoAppError;
use std::fs;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Repository to report on, as `owner/repo` or a GitHub URL
    #[arg(value_name = "REPO")]
    pub repo: String,

    /// Write the JSON report to this file instead of the terminal
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Collect a single report and print it as JSON
pub async fn process_report<H: Host>(host: &mut H, args: &ReportArgs) -> Result<()> {
    let spec: RepoSpec = args.repo.parse()?;
    let common = Common::new(&args.common)?;

    let outcome = common.collector.collect(&spec, Utc::now()).await;
    let report = match outcome.into_result(&format!("repository '{spec}'")) {
        Ok(report) => report,
        Err(e) => {
            let _ = writeln!(host.error(), "{e}");
            host.exit(1);
            return Err(e);
        }
    };

    let json = serde_json::to_string_pretty(&report).into_app_err("serializing report")?;

    if let Some(path) = &args.output {
        fs::write(path, json).into_app_err_with(|| format!("writing report to '{path}'"))?;
        let _ = writeln!(host.output(), "Wrote report for '{spec}' to {path}");
    } else {
        let _ = writeln!(host.output(), "{json}");
    }

    Ok(())
}
