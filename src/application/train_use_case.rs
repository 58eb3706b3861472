// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run:
//
//   Step 1: Prepare the checkpoint directory   (Layer 6 - infra)
//   Step 2: Open the metrics CSV               (Layer 6 - infra)
//   Step 3: Build the encoder and run epochs   (Layer 5 - ml)
//
// Logging is set up by the caller; everything here only emits
// `tracing` events.

use crate::error::Result;
use crate::infra::{checkpoint::CheckpointManager, config::AppConfig, metrics::MetricsLogger};
use crate::ml::trainer::{run_training, TrainOutcome};

pub struct TrainUseCase {
    config: AppConfig,
}

impl TrainUseCase {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn execute(&self) -> Result<TrainOutcome> {
        let dir = &self.config.logging.checkpoint_dir;
        tracing::info!("Starting training, checkpoints go to '{}'", dir.display());

        let ckpt_manager = CheckpointManager::new(dir)?;
        let metrics = MetricsLogger::new(dir)?;

        run_training(&self.config, &ckpt_manager, &metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_creates_checkpoint_directory() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt_dir = dir.path().join("nested").join("ckpt");
        let text = format!(
            "
model:
  encoder: {{input_dim: 6, hidden_dim: 4, output_dim: 2, num_layers: 3, dropout: 0.0}}
training: {{epochs: 2, learning_rate: 0.01}}
logging: {{checkpoint_dir: '{}'}}
",
            ckpt_dir.display()
        );
        let use_case = TrainUseCase::new(AppConfig::from_yaml_str(&text).unwrap());

        let outcome = use_case.execute().unwrap();

        assert!(ckpt_dir.join("best_model.mpk").exists());
        assert!(ckpt_dir.join("training_state.json").exists());
        assert!(ckpt_dir.join("encoder_config.json").exists());
        assert!(ckpt_dir.join("metrics.csv").exists());
        assert_eq!(outcome.info.num_layers, 3);
    }
}
