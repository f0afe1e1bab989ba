use super::Host;
use super::common::{Common, CommonArgs};
use crate::Result;
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to, overriding the configuration file
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Port to listen on, overriding the configuration file
    #[arg(long, short = 'p', value_name = "PORT")]
    pub port: Option<u16>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Run the HTTP server until it fails
pub async fn serve_api<H: Host>(host: &mut H, args: &ServeArgs) -> Result<()> {
    let Common { config, collector } = Common::new(&args.common)?;

    let mut options = config.serve_options();
    if let Some(bind) = &args.bind {
        options.bind.clone_from(bind);
    }
    if let Some(port) = args.port {
        options.port = port;
    }

    let _ = writeln!(host.output(), "repo-pulse listening on http://{}:{}", options.bind, options.port);

    if let Err(e) = crate::serve::serve(collector, options).await {
        let _ = writeln!(host.error(), "❌ Server stopped: {e:#}");
        host.exit(1);
        return Err(e);
    }

    Ok(())
}
