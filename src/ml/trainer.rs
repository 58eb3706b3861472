// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop around the encoder. There is no objective yet, so
// the default epoch step does no work and reports no losses.
//
// Save policy:
//   - an epoch whose validation loss beats the best so far saves
//     best_model.mpk and training_state.json
//   - if no epoch produced a validation loss at all, the final
//     parameters are saved once at the end, with a warning
//
// The epoch body sits behind EpochStep so a real objective can be
// plugged in without touching the bookkeeping.
//
// Reference: Burn Book §5 (Training)

use std::path::PathBuf;

use burn::{backend::NdArray, tensor::backend::AutodiffBackend};

use crate::error::Result;
use crate::infra::checkpoint::{CheckpointManager, TrainingState};
use crate::infra::config::AppConfig;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{Encoder, ModelInfo};

pub type TrainBackend = burn::backend::Autodiff<NdArray>;

/// What one epoch reports back to the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    pub metrics: EpochMetrics,
    /// Optimiser steps taken during the epoch
    pub steps:   usize,
}

/// Body of one training epoch.
pub trait EpochStep<B: AutodiffBackend> {
    fn run_epoch(&mut self, epoch: usize, encoder: &mut Encoder<B>) -> Result<EpochReport>;
}

/// No loss is defined yet: nothing to optimise or validate.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoObjective;

impl<B: AutodiffBackend> EpochStep<B> for NoObjective {
    fn run_epoch(&mut self, epoch: usize, _encoder: &mut Encoder<B>) -> Result<EpochReport> {
        Ok(EpochReport { metrics: EpochMetrics::unmeasured(epoch), steps: 0 })
    }
}

#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub info:       ModelInfo,
    pub state:      TrainingState,
    pub model_path: PathBuf,
}

/// Train on the CPU autodiff backend with the placeholder epoch step.
pub fn run_training(
    cfg:          &AppConfig,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
) -> Result<TrainOutcome> {
    let device = Default::default();
    train_loop::<TrainBackend, _>(cfg, ckpt_manager, metrics, NoObjective, &device)
}

pub fn train_loop<B: AutodiffBackend, S: EpochStep<B>>(
    cfg:          &AppConfig,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
    mut step:     S,
    device:       &B::Device,
) -> Result<TrainOutcome> {
    let seed = cfg.training.seed.unwrap_or_else(rand::random);
    B::seed(seed);
    tracing::info!("Starting training (seed {})", seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let mut encoder = Encoder::<B>::new(cfg.model.encoder.clone(), device)?;
    let info = encoder.describe();
    tracing::info!("Model initialized: {}", info);

    let epochs = cfg.training.epochs;
    let lr = cfg.training.learning_rate;
    tracing::info!("Training for {} epochs with learning rate {}", epochs, lr);

    let mut state = TrainingState::new(lr, seed);
    let mut best_path = None;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=epochs {
        tracing::info!("Epoch {}/{}", epoch, epochs);

        let report = step.run_epoch(epoch, &mut encoder)?;
        metrics.log(&report.metrics)?;
        state.epochs_completed = epoch;
        state.steps_completed += report.steps;

        if report.metrics.is_improvement(state.best_val_loss) {
            state.best_val_loss = report.metrics.val_loss;
            best_path = Some(ckpt_manager.save_encoder(&encoder)?);
            ckpt_manager.save_state(&state)?;
            tracing::info!("Validation loss improved to {:?}, checkpoint saved", state.best_val_loss);
        }
    }

    let model_path = match best_path {
        Some(path) => path,
        None => {
            tracing::warn!("No validation metric was produced; saving final parameters");
            ckpt_manager.save_encoder(&encoder)?
        }
    };
    ckpt_manager.save_state(&state)?;
    tracing::info!("Model saved to {}", model_path.display());

    Ok(TrainOutcome { info, state, model_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config(dir: &Path, epochs: usize) -> AppConfig {
        let text = format!(
            "
model:
  encoder: {{input_dim: 12, hidden_dim: 8, output_dim: 4, num_layers: 2, dropout: 0.1}}
training: {{epochs: {epochs}, learning_rate: 0.001, seed: 42}}
logging: {{checkpoint_dir: '{}'}}
",
            dir.display()
        );
        AppConfig::from_yaml_str(&text).unwrap()
    }

    /// Replays a fixed list of validation losses.
    struct Scripted {
        losses: Vec<Option<f64>>,
    }

    impl EpochStep<TrainBackend> for Scripted {
        fn run_epoch(&mut self, epoch: usize, _: &mut Encoder<TrainBackend>) -> Result<EpochReport> {
            let val_loss = self.losses[epoch - 1];
            Ok(EpochReport { metrics: EpochMetrics::new(epoch, val_loss, val_loss), steps: 5 })
        }
    }

    #[test]
    fn test_placeholder_run_saves_final_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), 3);
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();

        let outcome = run_training(&cfg, &ckpt, &metrics).unwrap();

        assert_eq!(outcome.model_path, dir.path().join("best_model.mpk"));
        assert!(outcome.model_path.exists());
        assert_eq!(outcome.state.epochs_completed, 3);
        assert_eq!(outcome.state.steps_completed, 0);
        assert_eq!(outcome.state.best_val_loss, None);
        assert_eq!(ckpt.load_state().unwrap(), outcome.state);

        let rows = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(rows.lines().count(), 4);
    }

    #[test]
    fn test_zero_epochs_still_persists() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();

        let outcome = run_training(&config(dir.path(), 0), &ckpt, &metrics).unwrap();

        assert!(ckpt.has_model());
        assert_eq!(outcome.state.epochs_completed, 0);
        assert_eq!(outcome.state.seed, 42);
    }

    #[test]
    fn test_best_validation_loss_is_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), 4);
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let step = Scripted { losses: vec![None, Some(3.0), Some(2.0), Some(2.5)] };

        let outcome = train_loop::<TrainBackend, _>(&cfg, &ckpt, &metrics, step, &Default::default()).unwrap();

        assert_eq!(outcome.state.best_val_loss, Some(2.0));
        assert_eq!(outcome.state.steps_completed, 20);
        assert_eq!(ckpt.load_state().unwrap().best_val_loss, Some(2.0));
        assert!(ckpt.load_encoder::<NdArray>(&Default::default()).is_ok());
    }

    #[test]
    fn test_invalid_encoder_config_fails_before_saving() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), 1);
        cfg.model.encoder.num_layers = 0;
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();

        assert!(run_training(&cfg, &ckpt, &metrics).is_err());
        assert!(!ckpt.has_model());
    }
}
