//! Remote indicator command-line driver.
//!
//! Loads a configuration and a set of menu contributions, replays lifecycle
//! events against a simulated authority, and prints what the indicator
//! would display.

mod app;

use std::path::PathBuf;

use clap::Parser;
use remote_indicator::ResourceUri;
use remote_indicator_connection::LifecycleEvent;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "remote-indicator", version, about)]
pub struct Args {
    /// Indicator configuration (TOML). Defaults apply when absent.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Menu contributions (JSON list of groups).
    #[arg(long)]
    pub contributions: Option<PathBuf>,

    /// Remote authority of the session, e.g. `ssh-remote+myhost`.
    #[arg(long)]
    pub authority: Option<String>,

    /// Folder opened in the workspace.
    #[arg(long)]
    pub workspace: Option<ResourceUri>,

    /// Make the authority resolution fail.
    #[arg(long)]
    pub resolve_fails: bool,

    /// Lifecycle event to apply after resolution, e.g. `connection-lost`.
    /// May be repeated.
    #[arg(long = "event")]
    pub events: Vec<LifecycleEvent>,

    /// Menu entry to run after printing.
    #[arg(long)]
    pub select: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting remote indicator");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(args))
}
