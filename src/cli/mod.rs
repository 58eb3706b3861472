// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Argument parsing with `clap`. All work is delegated to
// Layer 2 (application).
//
// Two binaries share this layer:
//   1. `gaze-train --config <yaml>`        — encoder training run
//   2. `prepare-dataset --dataset <name>`  — loader lifecycle
//
// Each command sets up its named logger and runs the use case
// inside it.

pub mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::application::train_use_case::TrainUseCase;
use crate::infra::config::{AppConfig, DEFAULT_CONFIG_PATH};
use crate::infra::logger::setup_logger;

pub const TRAIN_LOGGER: &str = "training";

#[derive(Parser, Debug)]
#[command(
    name = "gaze-train",
    version,
    about = "Train the eye-tracking feature encoder from a YAML configuration."
)]
pub struct TrainCli {
    /// Path to the configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

impl TrainCli {
    pub fn run(self) -> Result<()> {
        let config = AppConfig::from_file(&self.config)
            .with_context(|| format!("Cannot load configuration '{}'", self.config.display()))?;

        let logger = setup_logger(TRAIN_LOGGER, &config.logger_settings()?)?;
        let outcome = logger.in_scope(|| TrainUseCase::new(config).execute())?;

        println!("Training complete. Model saved to {}", outcome.model_path.display());
        Ok(())
    }
}
