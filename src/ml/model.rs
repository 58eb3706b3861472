// ============================================================
// Layer 5 — Encoder Model
// ============================================================
// Placeholder feature encoder for gaze / EEG word features.
//
//   x [batch, input_dim]
//     │
//     ├─ Linear(input_dim → hidden_dim) → ReLU → Dropout
//     ├─ Linear(hidden_dim → hidden_dim) → ReLU → Dropout   (× num_layers - 2)
//     ├─ Linear(hidden_dim → output_dim) → ReLU
//     │
//     └─ LayerNorm(output_dim)
//   y [batch, output_dim]
//
// With num_layers = 1 the single projection is input_dim → output_dim.
// Burn's Dropout is a no-op unless the backend tracks gradients, so
// inference on a plain backend is deterministic.

use burn::{
    nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};
use serde::Serialize;

// `Result` stays unimported: the Config derive expands to code naming
// the two-argument std one.
use crate::error::{self, PipelineError};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
#[derive(Config, Debug)]
pub struct EncoderConfig {
    #[config(default = 128)]
    pub input_dim:  usize,
    #[config(default = 64)]
    pub hidden_dim: usize,
    #[config(default = 32)]
    pub output_dim: usize,
    #[config(default = 2)]
    pub num_layers: usize,
    #[config(default = 0.1)]
    pub dropout:    f64,
}

impl EncoderConfig {
    pub fn validate(&self) -> error::Result<()> {
        let dims = [
            ("input_dim", self.input_dim),
            ("hidden_dim", self.hidden_dim),
            ("output_dim", self.output_dim),
            ("num_layers", self.num_layers),
        ];
        for (key, value) in dims {
            if value == 0 {
                return Err(PipelineError::config(format!("model.encoder.{key}"), "must be at least 1"));
            }
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(PipelineError::config(
                "model.encoder.dropout",
                format!("must be in [0, 1), got {}", self.dropout),
            ));
        }
        Ok(())
    }

    /// `(in, out)` of every projection, in order.
    pub fn layer_dims(&self) -> Vec<(usize, usize)> {
        (0..self.num_layers)
            .map(|i| {
                let d_in = if i == 0 { self.input_dim } else { self.hidden_dim };
                let d_out = if i + 1 == self.num_layers { self.output_dim } else { self.hidden_dim };
                (d_in, d_out)
            })
            .collect()
    }

    /// Unchecked; `Encoder::new` validates first.
    pub fn init<B: Backend>(&self, device: &B::Device) -> EncoderModel<B> {
        let layers = self
            .layer_dims()
            .into_iter()
            .map(|(d_in, d_out)| LinearConfig::new(d_in, d_out).init(device))
            .collect();

        EncoderModel {
            layers,
            dropout: DropoutConfig::new(self.dropout).init(),
            norm:    LayerNormConfig::new(self.output_dim).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct EncoderModel<B: Backend> {
    pub layers:  Vec<Linear<B>>,
    pub dropout: Dropout,
    pub norm:    LayerNorm<B>,
}

impl<B: Backend> EncoderModel<B> {
    /// x: [batch, input_dim] → [batch, output_dim]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let n = self.layers.len();
        let mut x = x;
        for (i, layer) in self.layers.iter().enumerate() {
            x = relu(layer.forward(x));
            if i + 1 < n {
                x = self.dropout.forward(x);
            }
        }
        self.norm.forward(x)
    }
}

/// What `Encoder::describe` reports.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub input_dim:                 usize,
    pub hidden_dim:                usize,
    pub output_dim:                usize,
    pub num_layers:                usize,
    pub dropout:                   f64,
    pub total_parameter_count:     usize,
    pub trainable_parameter_count: usize,
}

impl std::fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}→{}→{} ({} layers, dropout {}) | params: {} total, {} trainable",
            self.input_dim,
            self.hidden_dim,
            self.output_dim,
            self.num_layers,
            self.dropout,
            self.total_parameter_count,
            self.trainable_parameter_count,
        )
    }
}

/// Validated encoder plus the bookkeeping the bare module doesn't carry.
#[derive(Debug)]
pub struct Encoder<B: Backend> {
    config: EncoderConfig,
    model:  EncoderModel<B>,
    frozen: bool,
}

impl<B: Backend> Encoder<B> {
    pub fn new(config: EncoderConfig, device: &B::Device) -> error::Result<Self> {
        config.validate()?;
        let model = config.init(device);
        Ok(Self { config, model, frozen: false })
    }

    /// Wrap an already-built module (e.g. one restored from a checkpoint).
    ///
    /// `frozen` says whether `model` has already been through `no_grad`;
    /// it only drives the trainable count in `describe`.
    pub fn from_parts(config: EncoderConfig, model: EncoderModel<B>, frozen: bool) -> error::Result<Self> {
        config.validate()?;
        Ok(Self { config, model, frozen })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn model(&self) -> &EncoderModel<B> {
        &self.model
    }

    pub fn into_model(self) -> EncoderModel<B> {
        self.model
    }

    pub fn embedding_dim(&self) -> usize {
        self.config.output_dim
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// batch: [batch, input_dim] → [batch, output_dim]
    pub fn forward(&self, batch: Tensor<B, 2>) -> error::Result<Tensor<B, 2>> {
        self.check_input(&batch)?;
        Ok(self.model.forward(batch))
    }

    /// Forward pass with no gradient tracking on inputs or parameters.
    pub fn encode_batch(&self, batch: Tensor<B, 2>) -> error::Result<Tensor<B, 2>> {
        self.check_input(&batch)?;
        Ok(self.model.clone().no_grad().forward(batch.detach()))
    }

    /// Mark every parameter as not requiring gradients.
    pub fn freeze(&mut self) {
        self.model = self.model.clone().no_grad();
        self.frozen = true;
    }

    pub fn describe(&self) -> ModelInfo {
        let total = self.model.num_params();
        ModelInfo {
            input_dim:                 self.config.input_dim,
            hidden_dim:                self.config.hidden_dim,
            output_dim:                self.config.output_dim,
            num_layers:                self.config.num_layers,
            dropout:                   self.config.dropout,
            total_parameter_count:     total,
            trainable_parameter_count: if self.frozen { 0 } else { total },
        }
    }

    fn check_input(&self, batch: &Tensor<B, 2>) -> error::Result<()> {
        let [rows, features] = batch.dims();
        if rows == 0 || features != self.config.input_dim {
            return Err(PipelineError::validation(format!(
                "expected a [batch >= 1, {}] input, got [{rows}, {features}]",
                self.config.input_dim
            )));
        }
        Ok(())
    }
}
