mod cli_args;

use clap::Parser;
use cli_args::CliArgs;
use nodestrap_diagnostics::enable_tracing_by_env;

/// Parse the command line arguments and execute the selected command.
pub async fn run_cli() -> miette::Result<()> {
    enable_tracing_by_env();
    CliArgs::parse().run().await
}
