// Entrypoint for the CLI application.
// - Loads `.env`, refuses to start without the SEESAW_* variables, then runs
//   exactly one command and prints its JSON result.
// - Errors are printed as a single line on stderr with exit status 1.

use std::process::ExitCode;

use clap::Parser;
use seesaw_cli::api::ApiClient;
use seesaw_cli::cli::{dispatch, render, Cli};
use seesaw_cli::config::{init_logging, Settings};
use tracing::debug;

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let missing = Settings::missing_env_vars();
    if !missing.is_empty() {
        eprintln!("Error: seesaw is not configured");
        eprintln!("Missing environment variables: {}", missing.join(", "));
        eprintln!("Set them in the environment or in a .env file, e.g.");
        eprintln!("  SEESAW_BASE_URL=https://app.seesaw.fun/v1");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<String> {
    let settings = Settings::from_env();
    debug!(base_url = %settings.base_url, cache = %settings.token_cache.display(), "starting");
    let mut api = ApiClient::from_settings(&settings)?;
    let value = dispatch(&mut api, cli.command)?;
    render(&value)
}
