//! vault-k8s-mapper - sync Vault KV secrets into a Kubernetes Secret
//!
//! Runs once per invocation, typically as a Job or init container.

mod cli;
mod output;
mod sync;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Must happen before the Vault or Kubernetes clients open a TLS connection
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let report = sync::run(&cli).await?;

    if !cli.quiet {
        output::summary(&report);
    }
    Ok(())
}

/// Initialize tracing with appropriate verbosity. `RUST_LOG` wins when set.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("info"),
                1 => EnvFilter::new("debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
