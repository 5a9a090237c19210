//! Binary entrypoint for the `spf` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // A local .env may set SPF_CONFIG or SPF_LOG.
    let _ = dotenvy::dotenv();

    match spf::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
