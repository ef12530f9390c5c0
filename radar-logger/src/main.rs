//! Data logger binary.
//!
//! Entry point for the `data-logger` command-line tool.

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use radar_logger::exit::{codes, exit_code};
use radar_logger::{
    execute_record, init_logging, usage, Cli, CommandError, LogFacade, Logger, TerminationSignal,
    Verbosity,
};
use radar_service::{RealSleeper, SimulatedRuntime};
use radar_sink::StandardSinkOpener;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayVersion => codes::SUCCESS,
                _ => codes::INVALID_ARGS,
            };
            let _ = e.print();
            return ExitCode::from(code as u8);
        }
    };

    if cli.help {
        print!("{}", usage());
        return ExitCode::from(codes::INVALID_ARGS as u8);
    }

    let request = match cli.to_run_request() {
        Ok(request) => request,
        Err(e) => {
            let e = CommandError::from(e);
            eprintln!("error: {}", e);
            eprint!("{}", usage());
            return ExitCode::from(exit_code(&e) as u8);
        }
    };

    let verbosity = Verbosity::from_count(cli.verbose);
    init_logging(verbosity);

    // Ctrl+C ends runs without a sweep count
    let signal = TerminationSignal::install();

    let runtime = SimulatedRuntime::new(RealSleeper::new());
    let logger = LogFacade;

    match execute_record(
        &request,
        verbosity.runtime_log_level(),
        &runtime,
        &StandardSinkOpener,
        &signal,
        &logger,
    ) {
        Ok(summary) => {
            logger.debug(&format!("run finished: {:?}", summary));
            ExitCode::from(codes::SUCCESS as u8)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e) as u8)
        }
    }
}
