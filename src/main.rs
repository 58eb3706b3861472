use std::process::ExitCode;

use clap::Parser;
use gaze_pipeline::cli::TrainCli;

fn main() -> ExitCode {
    match TrainCli::parse().run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
