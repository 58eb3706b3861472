// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several other layers:
//
//   logger.rs      — Named logger registry
//                    One tracing-subscriber stack per name,
//                    console + optional file sink, runtime
//                    level changes with scoped overrides.
//
//   config.rs      — YAML application configuration
//                    Required keys are reported by their
//                    dotted path when missing.
//
//   checkpoint.rs  — Encoder persistence
//                    Burn's CompactRecorder for parameters,
//                    JSON for architecture and training state.
//
//   metrics.rs     — Per-epoch metrics CSV
//
// Reference: Burn Book §5 (Checkpointing)
//            tracing-subscriber docs

/// Named loggers with scoped level overrides
pub mod logger;

/// YAML configuration for the training binary
pub mod config;

/// Encoder checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
