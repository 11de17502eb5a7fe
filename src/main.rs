use anyhow::Result;
use clap::Parser;
use snesdev::cli::{Command, RootArgs};
use snesdev::config::LOG_ENV;
use snesdev::{report, workflow};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code for a run that stopped on a failed required step.
const EXIT_ABORTED: u8 = 1;
/// Exit code for setup errors: bad flags or config, or a held run lock.
const EXIT_SETUP_ERROR: u8 = 2;

fn main() -> ExitCode {
    let args = RootArgs::parse();
    init_tracing(args.verbose);
    match dispatch(args.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_SETUP_ERROR)
        }
    }
}

/// Log to stderr; `SNESDEV_LOG` takes an `EnvFilter` directive and wins over
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn dispatch(command: Command) -> Result<ExitCode> {
    match command {
        Command::Install(args) => {
            let report = workflow::run_install(&args)?;
            if args.json {
                let text = serde_json::to_string_pretty(&report)?;
                println!("{text}");
            } else if report.success {
                print!("{}", report::render(&report));
            } else {
                eprint!("{}", report::render(&report));
            }
            Ok(if report.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_ABORTED)
            })
        }
        Command::Status(args) => workflow::run_status(&args).map(|()| ExitCode::SUCCESS),
        Command::Reset(args) => workflow::run_reset(&args).map(|()| ExitCode::SUCCESS),
        Command::Steps(args) => workflow::run_steps(&args).map(|()| ExitCode::SUCCESS),
    }
}
