//! # repotree-cli
//!
//! A thin command-line front end over the reconciliation core.
//!
//! Every subcommand builds a fresh [`SlingTransport`], runs one operation
//! and prints the result as text or JSON. Mutations report whether the
//! repository actually changed, so scripts can run them repeatedly.
//!
//! ## Usage
//!
//! ```bash
//! repotree read /content/site
//! repotree save /content/site/jcr:content -p jcr:title=Home -p hidden=true
//! repotree --output json delete /content/old --if-exists
//! repotree tree /content/site
//! ```

pub mod args;
pub mod commands;
pub mod config;
pub mod error;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use repotree_http::SlingTransport;

pub use args::{Args, Command};
pub use config::CliConfig;
pub use error::CliError;

/// Load configuration, install logging, and execute one command.
pub fn run(args: Args) -> Result<(), CliError> {
    let config = CliConfig::load(args.config.as_deref())?.merge_args(&args);
    init_logging(args.verbose, config.log_level.as_deref());

    tracing::debug!(url = %config.instance.url, "connecting");
    let transport = SlingTransport::new(&config.instance)?;
    let output = commands::execute(&args.command, &transport, config.output)?;
    print!("{}", output);
    Ok(())
}

/// `RUST_LOG` wins unless `-v` is given.
fn init_logging(verbose: u8, configured: Option<&str>) {
    let default = configured.unwrap_or("warn");
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
