// ============================================================
// Layer 1 — Dataset Preparation Command
// ============================================================
// `prepare-dataset` flags. Converts them into a LoaderConfig
// and hands off to PrepareUseCase.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::application::prepare_use_case::PrepareUseCase;
use crate::data::registry::DatasetKind;
use crate::data::zuco::Precision;
use crate::domain::resource::LoaderConfig;
use crate::infra::logger::{setup_logger, LoggerSettings, DEFAULT_LOGGER};

#[derive(Parser, Debug)]
#[command(
    name = "prepare-dataset",
    version,
    about = "Download, preprocess and validate an eye-tracking dataset."
)]
pub struct PrepareCli {
    /// Dataset to prepare: onestop or zuco
    #[arg(long)]
    pub dataset: DatasetKind,

    /// Acquisition mode (loader default when omitted)
    #[arg(long)]
    pub mode: Option<String>,

    /// Source root (default: data/raw/<Dataset>)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Keep downloaded archives packed
    #[arg(long)]
    pub no_extract: bool,

    /// Bearer token for the remote host
    #[arg(long)]
    pub api_key: Option<String>,

    /// Storage precision for EEG features
    #[arg(long, default_value = "f16")]
    pub precision: Precision,
}

impl PrepareCli {
    /// CLI flags → loader configuration.
    /// The application layer never sees clap types.
    pub fn loader_config(&self) -> LoaderConfig {
        let root = self.root.clone().unwrap_or_else(|| self.dataset.default_root());
        let config = LoaderConfig::new(root)
            .with_extraction(!self.no_extract)
            .with_api_key(self.api_key.clone());

        match &self.mode {
            Some(mode) => config.with_mode(mode.as_str()),
            None => config,
        }
    }

    pub fn run(self) -> Result<()> {
        let logger = setup_logger(DEFAULT_LOGGER, &LoggerSettings::default())?;
        let use_case = PrepareUseCase::new(self.dataset, self.loader_config(), self.precision);
        let report = logger.in_scope(|| use_case.execute())?;

        println!(
            "{}: {} records ({} with neural features) → {}",
            report.dataset,
            report.records,
            report.with_neural,
            report.processed.display()
        );
        Ok(())
    }
}
