// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the encoder with Burn's CompactRecorder.
//
// File layout:
//   <checkpoint_dir>/
//     best_model.mpk        ← encoder parameters (half precision)
//     encoder_config.json   ← architecture, needed to rebuild the module
//     training_state.json   ← epoch/step counters, learning rate,
//                             best validation loss, RNG seed
//
// Loading fails if the stored architecture does not match the
// record, since Burn's records are typed by module structure.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::fs;
use std::path::{Path, PathBuf};

use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::ml::model::{Encoder, EncoderConfig};

/// Without extension; the recorder appends `.mpk`
const MODEL_STEM: &str = "best_model";
const CONFIG_FILE: &str = "encoder_config.json";
const STATE_FILE: &str = "training_state.json";

/// Progress persisted next to the parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    pub epochs_completed: usize,
    pub steps_completed:  usize,
    pub learning_rate:    f64,
    /// `None` until some epoch produced a validation metric
    pub best_val_loss:    Option<f64>,
    pub seed:             u64,
}

impl TrainingState {
    pub fn new(learning_rate: f64, seed: u64) -> Self {
        Self { epochs_completed: 0, steps_completed: 0, learning_rate, best_val_loss: None, seed }
    }
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/best_model.mpk`
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_STEM).with_extension("mpk")
    }

    pub fn has_model(&self) -> bool {
        self.model_path().exists()
    }

    /// Write parameters and architecture. Returns the parameter file path.
    pub fn save_encoder<B: Backend>(&self, encoder: &Encoder<B>) -> Result<PathBuf> {
        let stem = self.dir.join(MODEL_STEM);

        CompactRecorder::new()
            .record(encoder.model().clone().into_record(), stem.clone())
            .map_err(|e| PipelineError::Checkpoint(format!("cannot save '{}': {e}", stem.display())))?;

        self.write_json(CONFIG_FILE, encoder.config())?;

        let path = self.model_path();
        tracing::debug!("Saved encoder parameters to '{}'", path.display());
        Ok(path)
    }

    /// Rebuild the encoder from `encoder_config.json` and load `best_model.mpk` into it.
    pub fn load_encoder<B: Backend>(&self, device: &B::Device) -> Result<Encoder<B>> {
        let config: EncoderConfig = self.read_json(CONFIG_FILE)?;
        config.validate()?;

        let stem = self.dir.join(MODEL_STEM);
        let record = CompactRecorder::new()
            .load(stem.clone(), device)
            .map_err(|e| PipelineError::Checkpoint(format!("cannot load '{}': {e}", stem.display())))?;

        let model = config.init::<B>(device).load_record(record);
        tracing::info!("Loaded encoder from '{}'", self.model_path().display());
        Encoder::from_parts(config, model, false)
    }

    pub fn save_state(&self, state: &TrainingState) -> Result<()> {
        self.write_json(STATE_FILE, state)
    }

    pub fn load_state(&self) -> Result<TrainingState> {
        self.read_json(STATE_FILE)
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.dir.join(file);
        let text = fs::read_to_string(&path).map_err(|e| {
            PipelineError::Checkpoint(format!(
                "cannot read '{}' ({e}). Has a training run been completed?",
                path.display()
            ))
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray;

    #[test]
    fn test_round_trip_restores_architecture_and_weights() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path().join("ckpt")).unwrap();
        let device = Default::default();
        let cfg = EncoderConfig::new().with_input_dim(16).with_hidden_dim(8).with_output_dim(4);
        let encoder = Encoder::<B>::new(cfg, &device).unwrap();

        let path = manager.save_encoder(&encoder).unwrap();
        assert_eq!(path, dir.path().join("ckpt").join("best_model.mpk"));
        assert!(manager.has_model());
        assert!(dir.path().join("ckpt").join("encoder_config.json").exists());

        let restored = manager.load_encoder::<B>(&device).unwrap();
        assert_eq!(restored.config().input_dim, 16);
        assert_eq!(restored.describe().total_parameter_count, encoder.describe().total_parameter_count);

        // parameters are stored at half precision
        let batch = Tensor::<B, 2>::random([3, 16], Distribution::Default, &device);
        let before = encoder.encode_batch(batch.clone()).unwrap().into_data().to_vec::<f32>().unwrap();
        let after = restored.encode_batch(batch).unwrap().into_data().to_vec::<f32>().unwrap();
        let max_diff = before.iter().zip(&after).map(|(a, b)| (a - b).abs()).fold(0.0f32, f32::max);
        assert!(max_diff < 0.05, "max diff {max_diff}");
    }

    #[test]
    fn test_training_state_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path()).unwrap();
        let state = TrainingState { epochs_completed: 3, steps_completed: 0, learning_rate: 1e-3, best_val_loss: None, seed: 7 };

        manager.save_state(&state).unwrap();

        assert_eq!(manager.load_state().unwrap(), state);
    }

    #[test]
    fn test_loading_without_run_is_checkpoint_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path()).unwrap();

        assert!(!manager.has_model());
        assert!(matches!(manager.load_encoder::<B>(&Default::default()), Err(PipelineError::Checkpoint(_))));
        assert!(matches!(manager.load_state(), Err(PipelineError::Checkpoint(_))));
    }
}
