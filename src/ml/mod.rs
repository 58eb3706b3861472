// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model code lives here.
//
//   model.rs    — Feature encoder
//                 • stacked Linear projections, ReLU after each
//                 • dropout between projections
//                 • final LayerNorm over the embedding
//                 • parameter-count introspection, freezing
//
//   trainer.rs  — Epoch loop
//                 Placeholder objective, metrics CSV rows,
//                 best-validation save policy
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Encoder architecture
pub mod model;

/// Training loop with checkpointing
pub mod trainer;
