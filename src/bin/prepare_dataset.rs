use std::process::ExitCode;

use clap::Parser;
use gaze_pipeline::cli::commands::PrepareCli;

fn main() -> ExitCode {
    match PrepareCli::parse().run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
