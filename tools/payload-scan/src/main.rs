//! CONTEXT: payload-scan entry point
//! INTENT: Parse arguments, install the logger, map the scan outcome to an exit status
//! DEPS: payload_scan (library half), env_logger
//! READINESS: Command-line tool; no service dependencies
//! TESTS: tests/cli.rs drives this binary end to end
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use payload_scan::{run, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .format_timestamp(None)
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&cli, &mut out) {
        Ok(outcome) => {
            let _ = out.flush();
            outcome.exit_code()
        }
        Err(err) => {
            let _ = writeln!(io::stderr(), "payload-scan: {err}");
            ExitCode::from(2)
        }
    }
}
