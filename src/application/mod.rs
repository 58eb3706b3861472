// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing or printing here (that's Layer 1)
//   - Only workflow coordination

// Encoder training run
pub mod train_use_case;

// Dataset download → preprocess → load → check
pub mod prepare_use_case;
