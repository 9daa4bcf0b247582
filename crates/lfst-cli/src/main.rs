use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use lfst_protocol::TransferError;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    match commands::run_command(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<TransferError>() {
            Some(transfer) => {
                eprintln!("{} {}", "error:".red().bold(), transfer.status());
                ExitCode::from(1)
            }
            None => {
                eprintln!("{} {err:#}", "fatal:".red().bold());
                ExitCode::from(2)
            }
        },
    }
}

/// Logs go to stderr; stdout carries object bytes and command output.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
