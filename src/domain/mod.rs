// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, enums and traits describing what the pipeline
// works with: raw resources, standardized word records, and the
// one lifecycle contract every dataset loader implements.
//
// Nothing here knows about reqwest, zip archives or burn.
// The only filesystem-aware code is the default `extract`
// method on DatasetLoader, which delegates to the data layer.

// Standardized word / sentence records plus their shape checks
pub mod record;

// Loader configuration, download resources, lifecycle state
pub mod resource;

// Core abstractions (traits) that the data layer implements
pub mod traits;
