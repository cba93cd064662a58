//! Galinfo main entry point
//!
//! Starts the metadata search API server. Configuration comes from CLI
//! flags with environment-variable fallbacks; a `.env` file is honored when
//! present.

use clap::Parser;
use galinfo::config::Config;
use tracing_subscriber::EnvFilter;

/// Galinfo: metadata search service for visual-novel and doujin game catalogs
#[derive(Parser, Debug)]
#[command(name = "galinfo")]
#[command(version = "1.0.0")]
#[command(about = "Metadata search API for visual-novel catalogs", long_about = None)]
struct Cli {
    /// Address to bind the API server to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    bind: String,

    /// Outbound proxy URL for catalog fetches (http, https or socks5)
    #[arg(long, env = "PROXY")]
    proxy: Option<String>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = Config::new(&cli.bind, cli.proxy)?;
    if config.proxy.is_some() {
        tracing::info!("Outbound proxy configured");
    }

    galinfo::server::serve(config).await
}

/// Sets up the tracing subscriber based on verbosity level
///
/// With no flags, the `LOG_LEVEL` environment variable is honored before
/// falling back to info.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::try_from_env("LOG_LEVEL")
                .unwrap_or_else(|_| EnvFilter::new("galinfo=info,warn")),
            1 => EnvFilter::new("galinfo=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
