use std::process::ExitCode;

use clap::Parser as _;
use cli::Cli;
use tokio::{
    select,
    signal::unix::{SignalKind, signal},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use coinswap_core::config::Config;

mod cli;
mod telemetry;
mod wallet;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = color_eyre::install() {
        eprintln!("Failed to install error report handler: {}", err);
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let subscriber = telemetry::get_subscriber(config.log_level.as_deref());
    telemetry::init_subscriber(subscriber);

    let shutdown_token = CancellationToken::new();
    let mut command_jh = tokio::spawn(cli.run(config, shutdown_token.clone()));

    let mut sigterm = signal(SignalKind::terminate())
        .expect("setting sigterm listener on unix should always work");
    let mut sigint = signal(SignalKind::interrupt())
        .expect("setting sigint listener on unix should always work");

    // A swap that already started is never abandoned; signals only stop commands
    // that have not reached submission yet.
    let result = select! {
        res = &mut command_jh => res,
        _ = sigterm.recv() => {
            info!("received SIGTERM signal, waiting for the current command");
            shutdown_token.cancel();
            command_jh.await
        }
        _ = sigint.recv() => {
            info!("received SIGINT signal, waiting for the current command");
            shutdown_token.cancel();
            command_jh.await
        }
    };

    match result {
        Ok(Ok(())) => {
            info!("command completed");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!(error = ?e, "command failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(%e, "command exited unexpectedly");
            ExitCode::FAILURE
        }
    }
}
