mod cli;
mod commands;
mod error;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use ember_config::Settings;
use ember_source::SourceOptions;
use exn::ResultExt;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", miette::miette!("{err:?}"));
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let pretty = settings.pretty && !cli.compact;
    match cli.command {
        Command::Stats { path } => {
            let options = SourceOptions {
                temp_dir: settings.temp_dir,
                temp_prefix: settings.temp_prefix,
                pool_connections: Some(settings.pool_connections),
            };
            let report = commands::stats(&path, &options).await?;
            commands::print(&report, pretty)
        },
        Command::Inspect { path } => commands::print(&commands::inspect(&path)?, pretty),
        Command::Analyze { path } => commands::print(&commands::analyze(&path)?, pretty),
    }
}
