//! HiVision CLI entry point

use std::process::ExitCode;

use clap::Parser;

use hivision::cli::{
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    init_tracing, run_devices, run_record, run_screenshot, Presenter, EXIT_ERROR,
    EXIT_USAGE_ERROR,
};
use hivision::domain::error::ConfigError;
use hivision::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Record(args) => run_record(args).await,
        Commands::Screenshot(args) => run_screenshot(args).await,
        Commands::Devices => run_devices().await,
        Commands::Config { action } => {
            let presenter = Presenter::new();
            let store = XdgConfigStore::new();
            match handle_config_command(action, &store, &presenter).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e @ ConfigError::ValidationError { .. }) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_USAGE_ERROR)
                }
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
    }
}
