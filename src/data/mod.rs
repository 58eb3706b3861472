// ============================================================
// Layer 4 — Dataset Acquisition
// ============================================================
// Everything from a remote catalogue to standardized word
// records on disk.
//
// The pipeline flows in this order:
//
//   ResourceCatalogue  → mode → named remote resources
//       │
//       ▼
//   download           → fetch into the source root (skip if present)
//       │
//       ▼
//   archive            → unpack zip archives next to them
//       │
//       ▼
//   OneStop / ZuCo     → parse raw reports into WordRecords
//       │
//       ▼
//   store              → stream records to <root>/<name>.jsonl
//
// Reference: reqwest blocking docs, zip crate docs

/// Mode → resource tables
pub mod catalogue;

/// Atomic, retrying resource download
pub mod download;

/// Zip extraction
pub mod archive;

/// Glob discovery and JSON-lines storage
pub mod store;

/// OneStop eye-tracking loader
pub mod onestop;

/// ZuCo EEG + eye-tracking loader
pub mod zuco;

/// Dataset name → loader
pub mod registry;
