// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per training epoch:
//
//   epoch,train_loss,val_loss
//   1,,
//   2,,
//
// Losses are optional: the current loop defines no objective,
// so both columns stay empty until one is wired in.
//
// Output file: <checkpoint_dir>/metrics.csv

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch:      usize,
    pub train_loss: Option<f64>,
    pub val_loss:   Option<f64>,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: Option<f64>, val_loss: Option<f64>) -> Self {
        Self { epoch, train_loss, val_loss }
    }

    /// Epoch with no objective at all
    pub fn unmeasured(epoch: usize) -> Self {
        Self::new(epoch, None, None)
    }

    /// True if this epoch has a validation loss that beats `best`.
    /// The first measured epoch always improves on `None`.
    pub fn is_improvement(&self, best: Option<f64>) -> bool {
        match (self.val_loss, best) {
            (Some(loss), Some(best)) => loss < best,
            (Some(loss), None) => loss.is_finite(),
            (None, _) => false,
        }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the header if the file doesn't exist yet, so runs append.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut writer = csv::Writer::from_path(&csv_path)?;
            writer.write_record(["epoch", "train_loss", "val_loss"])?;
            writer.flush()?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let file = OpenOptions::new().append(true).open(&self.csv_path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.serialize(m)?;
        writer.flush()?;

        tracing::debug!("Logged epoch {} metrics: {:?} / {:?}", m.epoch, m.train_loss, m.val_loss);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
