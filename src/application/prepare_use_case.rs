// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Runs one dataset through the full loader lifecycle:
//
//   Step 1: download    → remote resources into the source root
//   Step 2: preprocess  → standardized JSON-lines file
//   Step 3: load_data   → word records back from that file
//   Step 4: check       → reject an empty or malformed record set

use std::path::PathBuf;

use crate::data::registry::{open_loader, DatasetKind};
use crate::data::zuco::Precision;
use crate::domain::resource::LoaderConfig;
use crate::domain::traits::DatasetLoader;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct PrepareReport {
    pub dataset:    &'static str,
    pub downloaded: Vec<PathBuf>,
    pub processed:  PathBuf,
    pub records:    usize,
    /// Records that also carry neural features
    pub with_neural: usize,
}

pub struct PrepareUseCase {
    kind:      DatasetKind,
    config:    LoaderConfig,
    precision: Precision,
}

impl PrepareUseCase {
    pub fn new(kind: DatasetKind, config: LoaderConfig, precision: Precision) -> Self {
        Self { kind, config, precision }
    }

    pub fn execute(self) -> Result<PrepareReport> {
        let mut loader = open_loader(self.kind, self.config, self.precision)?;
        run_lifecycle(loader.as_mut())
    }
}

/// download → preprocess → load_data → check on any loader.
pub fn run_lifecycle(loader: &mut dyn DatasetLoader) -> Result<PrepareReport> {
    tracing::info!("Preparing '{}' in '{}'", loader.name(), loader.config().source_root().display());

    let downloaded = loader.download()?;
    let processed = loader.preprocess()?;
    let records = loader.load_data(&processed)?;

    if let Err(e) = loader.check(&records) {
        tracing::error!("{}", e);
        return Err(e);
    }

    let with_neural = records.iter().filter(|r| r.neural_features.is_some()).count();
    tracing::info!(
        "'{}' ready: {} records ({} with neural features) in '{}'",
        loader.name(),
        records.len(),
        with_neural,
        processed.display()
    );

    Ok(PrepareReport {
        dataset: loader.name(),
        downloaded,
        processed,
        records: records.len(),
        with_neural,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::zuco;
    use crate::domain::resource::LoaderState;
    use crate::error::PipelineError;
    use std::fs;

    #[test]
    fn test_zuco_manual_mode_runs_offline() {
        let dir = tempfile::tempdir().unwrap();
        let export = r#"{"subject": "ZAB", "sentences": [
            {"id": "s0", "content": "a b", "words": [
                {"content": "a", "fixations": {"FFD": 100.0, "TRT": 200.0}},
                {"content": "b", "fixations": null}
            ]}
        ]}"#;
        fs::write(dir.path().join("ZAB.json"), export).unwrap();

        let report = PrepareUseCase::new(DatasetKind::Zuco, LoaderConfig::new(dir.path()), Precision::F16)
            .execute()
            .unwrap();

        assert_eq!(report.dataset, "zuco");
        assert!(report.downloaded.is_empty());
        assert_eq!(report.records, 2);
        assert_eq!(report.with_neural, 0);
        assert_eq!(report.processed, dir.path().join(zuco::OUTPUT_FILE));
    }

    #[test]
    fn test_empty_root_fails_with_missing_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = zuco::ZucoLoader::new(LoaderConfig::new(dir.path())).unwrap();

        let err = run_lifecycle(&mut loader).unwrap_err();

        assert!(matches!(err, PipelineError::MissingData { .. }));
        assert_eq!(loader.state(), LoaderState::Downloaded);
    }
}
