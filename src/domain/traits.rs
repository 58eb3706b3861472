// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// DatasetLoader is the single lifecycle contract for every
// corpus:  download → preprocess → load_data → validate.
//
// RemoteSource is the seam between loaders and the network,
// so a loader can be exercised against an in-memory fake.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::record::{check_records, WordRecord};
use crate::domain::resource::{LoaderConfig, LoaderState};
use crate::error::Result;

// ─── RemoteSource ─────────────────────────────────────────────────────────────
/// Anything that can stream the body of a remote resource.
///
/// Implementations:
///   - HttpSource → blocking reqwest client
///   - test fakes that count calls
pub trait RemoteSource {
    /// Stream the resource at `url` into `sink`, returning the byte count.
    ///
    /// A non-success status must be reported as `PipelineError::Transfer`
    /// before anything is written.
    fn fetch(&self, url: &str, api_key: Option<&str>, sink: &mut dyn Write) -> Result<u64>;
}

// ─── DatasetLoader ────────────────────────────────────────────────────────────
/// Acquire and normalise one raw corpus.
///
/// Implementations:
///   - OneStopLoader → reading-comprehension eye-tracking reports
///   - ZucoLoader    → EEG + eye-tracking per-subject exports
pub trait DatasetLoader {
    /// Short registry name, e.g. `"onestop"`
    fn name(&self) -> &'static str;

    fn config(&self) -> &LoaderConfig;

    fn state(&self) -> LoaderState;

    /// Fetch every resource of the selected mode into the source root.
    /// Already-present files are skipped. Returns the local paths.
    fn download(&mut self) -> Result<Vec<PathBuf>>;

    /// Turn whatever raw files are under the source root into the
    /// standardized JSON-lines file and return its path.
    fn preprocess(&mut self) -> Result<PathBuf>;

    /// Parse a standardized file into word records.
    fn load_data(&mut self, file_path: &Path) -> Result<Vec<WordRecord>>;

    /// Where `preprocess` writes its output.
    fn processed_path(&self) -> PathBuf;

    /// Unpack an archive into `destination`. The archive is left
    /// on disk whether or not extraction succeeds.
    fn extract(&self, archive_path: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
        crate::data::archive::extract_zip(archive_path, destination)
    }

    /// True when the record set is non-empty and every record is well-formed.
    fn validate(&self, data: &[WordRecord]) -> bool {
        self.check(data).is_ok()
    }

    /// Same gate as `validate`, reporting why a set was rejected.
    fn check(&self, data: &[WordRecord]) -> Result<()> {
        check_records(data)
    }
}
