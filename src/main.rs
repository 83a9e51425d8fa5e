use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::{EnvFilter, fmt};

// executable-specific modules
mod cli;
mod driver;

/// The environment variable that controls log filtering.
const LOG_ENV: &str = "TYPEDBLOCKS_LOG";

pub fn interface() -> driver::Result {
    let Cli { config, command } = Cli::parse();
    let context = driver::Context::load(config.as_deref())?;
    let mut stdout = std::io::stdout().lock();

    match command {
        Command::Check { input } => context.check(&input, &mut stdout),
        Command::Gen { input } => context.generate(&input, &mut stdout),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_logging();

    match interface() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            match error.code() {
                Some(code) => eprintln!("error[{code}]: {error}"),
                None => eprintln!("error: {error}"),
            }
            ExitCode::FAILURE
        }
    }
}
