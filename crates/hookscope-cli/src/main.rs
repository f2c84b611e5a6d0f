//! Main entry point for the `hookscope` binary.

use std::process::ExitCode;

use clap::Parser;
use hookscope_cli::cli::Cli;
use hookscope_cli::{CliError, Exit};
use hookscope_common_log::LogConfig;
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env().with_verbosity(cli.verbose, cli.quiet);
    if let Err(e) = hookscope_common_log::init(log_config) {
        eprintln!("hookscope: failed to initialize logging: {e}");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to create tokio runtime");
            return Exit::GeneralError.into();
        }
    };

    match runtime.block_on(cli.execute()) {
        Ok(()) => Exit::Success.into(),
        Err(e) => report_error(&e),
    }
}

fn report_error(e: &CliError) -> ExitCode {
    match e.hint() {
        Some(hint) => error!(code = e.code(), %hint, "{e}"),
        None => error!(code = e.code(), "{e}"),
    }
    e.exit_code().into()
}
