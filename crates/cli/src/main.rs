// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! capstan: upgrade a fixed set of Docker containers to their latest images.
//!
//! Loads the ordered task list from a TOML config, connects to the local
//! Docker daemon, and runs the sequential upgrade batch. Exit code 0 only
//! when every task succeeded; 1 on any task failure, startup failure, or
//! interrupt.

mod exit_error;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use capstan_adapters::{ContainerApi, DockerEngine, Lifecycle};
use capstan_core::UpgradeConfig;
use capstan_engine::Upgrader;
use exit_error::ExitError;

/// Upgrade a fixed set of Docker containers to their latest published images.
#[derive(Debug, Parser)]
#[command(name = "capstan", version, about)]
struct Cli {
    /// Path to the upgrade configuration file
    #[arg(short, long, default_value = "capstan.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.code)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::new(format!(
        "capstan={level},capstan_core={level},capstan_adapters={level},capstan_engine={level}"
    ));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<(), ExitError> {
    let config = UpgradeConfig::load(&cli.config).map_err(|err| ExitError::new(1, err.to_string()))?;

    let engine = connect().await?;
    let lifecycle = Lifecycle::new(Arc::new(engine));
    let upgrader = Upgrader::new(lifecycle, config.settle_delay);

    info!(tasks = config.tasks.len(), "starting upgrade batch");
    tokio::select! {
        finished = upgrader.upgrade_all(&config.tasks) => {
            if finished {
                Ok(())
            } else {
                Err(ExitError::new(1, "upgrade failed"))
            }
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("upgrade interrupted by user");
            Err(ExitError::new(1, "interrupted"))
        }
    }
}

/// Connect to the Docker daemon; unreachable daemons are fatal before any
/// task is attempted.
async fn connect() -> Result<DockerEngine, ExitError> {
    let remediation = "cannot connect to Docker daemon; this tool needs access \
                       to the Docker socket.\n\nWhen running inside a container, \
                       mount the socket:\n\n  docker run \
                       -v /var/run/docker.sock:/var/run/docker.sock ...";

    let engine =
        DockerEngine::connect().map_err(|err| ExitError::new(1, format!("{remediation}\n\nOriginal error: {err}")))?;
    engine
        .ping()
        .await
        .map_err(|err| ExitError::new(1, format!("{remediation}\n\nOriginal error: {err}")))?;
    Ok(engine)
}
