//! Binary entrypoint for the Tether worker.

use std::io;
use std::process::ExitCode;

use tether_worker::{SystemConfigLoader, bootstrap_with, report_bootstrap_failure};

fn main() -> ExitCode {
    let worker = match bootstrap_with(&SystemConfigLoader) {
        Ok(worker) => worker,
        Err(error) => return report_bootstrap_failure(&error, io::stdout(), io::stderr()),
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    match worker.run(&mut input, io::stdout().lock(), io::stderr().lock()) {
        Ok(exit) => exit.exit_code(),
        Err(error) => {
            tracing::error!(%error, "worker stopped");
            ExitCode::from(error.exit_status())
        }
    }
}
