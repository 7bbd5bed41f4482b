use clap::Parser;
use penplot::cli::Cli;
use penplot::{commands, error_panel, init_logging};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let units = cli.units();

    if let Err(err) = init_logging(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", err);
    }

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("Command failed: {:?}", err);
            eprint!("{}", error_panel(&err, units));
            ExitCode::FAILURE
        }
    }
}
