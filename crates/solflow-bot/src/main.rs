//! Binary entrypoint for the solflow swap bot.

use std::process::ExitCode;

fn main() -> ExitCode {
    match solflow_bot::runtime::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("solflow-bot failed: {error}");
            ExitCode::FAILURE
        }
    }
}
