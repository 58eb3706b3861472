// ============================================================
// Layer 4 — Loader Registry
// ============================================================
// Name → loader lookup used by the dataset preparation CLI.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::data::{onestop, zuco};
use crate::domain::resource::{LoaderConfig, DEFAULT_RAW_ROOT};
use crate::domain::traits::DatasetLoader;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    OneStop,
    Zuco,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::OneStop, DatasetKind::Zuco];

    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::OneStop => "onestop",
            DatasetKind::Zuco => "zuco",
        }
    }

    /// `data/raw/OneStop` or `data/raw/ZuCo`
    pub fn default_root(self) -> PathBuf {
        let dir = match self {
            DatasetKind::OneStop => onestop::DATASET_DIR,
            DatasetKind::Zuco => zuco::DATASET_DIR,
        };
        PathBuf::from(DEFAULT_RAW_ROOT).join(dir)
    }
}

impl FromStr for DatasetKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|k| k.name()).collect();
                PipelineError::config("dataset", format!("unknown dataset '{s}'; expected one of {names:?}"))
            })
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Construct the loader for `kind`. `precision` only applies to ZuCo.
pub fn open_loader(
    kind:      DatasetKind,
    config:    LoaderConfig,
    precision: zuco::Precision,
) -> Result<Box<dyn DatasetLoader>> {
    Ok(match kind {
        DatasetKind::OneStop => Box::new(onestop::OneStopLoader::new(config)?),
        DatasetKind::Zuco => Box::new(zuco::ZucoLoader::new(config)?.with_precision(precision)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_dataset_names() {
        assert_eq!("onestop".parse::<DatasetKind>().unwrap(), DatasetKind::OneStop);
        assert_eq!("ZuCo".parse::<DatasetKind>().unwrap(), DatasetKind::Zuco);
        assert!("provo".parse::<DatasetKind>().is_err());
    }

    #[test]
    fn test_default_roots() {
        assert_eq!(DatasetKind::OneStop.default_root(), Path::new("data/raw/OneStop"));
        assert_eq!(DatasetKind::Zuco.default_root(), Path::new("data/raw/ZuCo"));
    }

    #[test]
    fn test_invalid_mode_rejected_for_every_loader() {
        for kind in DatasetKind::ALL {
            let dir = tempfile::tempdir().unwrap();
            let config = LoaderConfig::new(dir.path().join("raw")).with_mode("nonexistent");

            let err = open_loader(kind, config, zuco::Precision::F16).err().unwrap();

            assert!(matches!(err, PipelineError::InvalidMode { .. }), "{kind}: {err}");
            assert!(!dir.path().join("raw").exists());
        }
    }

    #[test]
    fn test_open_loader_reports_its_name() {
        let dir = tempfile::tempdir().unwrap();
        let loader = open_loader(DatasetKind::Zuco, LoaderConfig::new(dir.path()), zuco::Precision::F32).unwrap();
        assert_eq!(loader.name(), "zuco");
        assert_eq!(loader.config().mode(), zuco::DEFAULT_MODE);
    }
}
