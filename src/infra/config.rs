// ============================================================
// Layer 6 — Application Configuration
// ============================================================
// YAML file read once at startup by `gaze-train`:
//
//   model:
//     encoder: {input_dim, hidden_dim, output_dim, num_layers, dropout}
//   training: {epochs, learning_rate, seed?}
//   logging:  {checkpoint_dir, log_dir?, level?}
//
// Required keys are checked by path before deserialising, so a
// missing key is reported by its full dotted name. Unknown keys
// are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{PipelineError, Result};
use crate::infra::logger::{parse_level, LoggerSettings, DEFAULT_LOG_DIR};
use crate::ml::model::EncoderConfig;

pub const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

const REQUIRED_KEYS: [&str; 8] = [
    "model.encoder.input_dim",
    "model.encoder.hidden_dim",
    "model.encoder.output_dim",
    "model.encoder.num_layers",
    "model.encoder.dropout",
    "training.epochs",
    "training.learning_rate",
    "logging.checkpoint_dir",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub model:    ModelSection,
    pub training: TrainingSection,
    pub logging:  LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSection {
    pub encoder: EncoderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSection {
    pub epochs:        usize,
    pub learning_rate: f64,
    /// Backend RNG seed; drawn at random when absent
    #[serde(default)]
    pub seed:          Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    pub checkpoint_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir:        PathBuf,
    #[serde(default = "default_level")]
    pub level:          String,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

fn default_level() -> String {
    "info".to_string()
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!("Loaded configuration from '{}'", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)
            .map_err(|e| PipelineError::config("<document>", e.to_string()))?;

        for key in REQUIRED_KEYS {
            if lookup(&value, key).is_none() {
                return Err(PipelineError::config(key, "missing required key"));
            }
        }

        let config: Self = serde_yaml::from_value(value)
            .map_err(|e| PipelineError::config("<document>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.model.encoder.validate()?;

        let lr = self.training.learning_rate;
        if !lr.is_finite() || lr <= 0.0 {
            return Err(PipelineError::config("training.learning_rate", format!("must be positive, got {lr}")));
        }

        parse_level(&self.logging.level)?;
        Ok(())
    }

    /// Logger settings for the training run: console plus a file under `log_dir`.
    pub fn logger_settings(&self) -> Result<LoggerSettings> {
        Ok(LoggerSettings::default()
            .with_level(parse_level(&self.logging.level)?)
            .with_log_dir(Some(self.logging.log_dir.clone())))
    }
}

/// Follow a dotted path through nested mappings. Nulls count as absent.
fn lookup<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(value, |node, segment| node.get(segment))
        .filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    const SAMPLE: &str = include_str!("../../configs/config.yaml");

    fn without(line_prefix: &str) -> String {
        SAMPLE
            .lines()
            .filter(|l| !l.trim_start().starts_with(line_prefix))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_sample_config_parses() {
        let cfg = AppConfig::from_yaml_str(SAMPLE).unwrap();

        assert_eq!(cfg.model.encoder.input_dim, 128);
        assert_eq!(cfg.model.encoder.output_dim, 32);
        assert_eq!(cfg.training.epochs, 10);
        assert_eq!(cfg.logging.checkpoint_dir, PathBuf::from("checkpoints"));
    }

    #[test]
    fn test_sample_config_has_no_unread_sections() {
        let value: Value = serde_yaml::from_str(SAMPLE).unwrap();
        let sections: Vec<&str> = value
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(sections, vec!["model", "training", "logging"]);
    }

    #[test]
    fn test_missing_key_is_named() {
        let err = AppConfig::from_yaml_str(&without("hidden_dim:")).unwrap_err();
        match err {
            PipelineError::Configuration { key, .. } => assert_eq!(key, "model.encoder.hidden_dim"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_checkpoint_dir_is_named() {
        let err = AppConfig::from_yaml_str(&without("checkpoint_dir:")).unwrap_err();
        assert!(err.to_string().contains("logging.checkpoint_dir"), "{err}");
    }

    #[test]
    fn test_optional_logging_keys_default() {
        let text = "
model:
  encoder: {input_dim: 8, hidden_dim: 4, output_dim: 2, num_layers: 1, dropout: 0.0}
training: {epochs: 1, learning_rate: 0.01}
logging: {checkpoint_dir: out}
";
        let cfg = AppConfig::from_yaml_str(text).unwrap();
        assert_eq!(cfg.logging.log_dir, PathBuf::from("logs"));
        assert_eq!(cfg.logger_settings().unwrap().level, LevelFilter::INFO);
        assert_eq!(cfg.training.seed, None);
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let bad_dropout = SAMPLE.replace("dropout: 0.1", "dropout: 1.5");
        assert!(matches!(
            AppConfig::from_yaml_str(&bad_dropout),
            Err(PipelineError::Configuration { key, .. }) if key == "model.encoder.dropout"
        ));

        let bad_lr = SAMPLE.replace("learning_rate: 0.001", "learning_rate: -1.0");
        assert!(matches!(
            AppConfig::from_yaml_str(&bad_lr),
            Err(PipelineError::Configuration { key, .. }) if key == "training.learning_rate"
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::from_file(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
