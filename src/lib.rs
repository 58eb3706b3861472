// ============================================================
// gaze-pipeline
// ============================================================
// Eye-tracking / EEG dataset acquisition and a placeholder
// feature encoder for dyslexia-detection research.
//
// Layers (each only depends on the ones below it):
//
//   Layer 1  cli          — clap argument parsing
//   Layer 2  application  — use cases (train, prepare)
//   Layer 3  domain       — records, loader contract
//   Layer 4  data         — download, extraction, loaders
//   Layer 5  ml           — burn encoder and training loop
//   Layer 6  infra        — logging, config, checkpoints, metrics

#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;
pub mod ml;

pub use error::{PipelineError, Result};
