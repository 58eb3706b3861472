// ============================================================
// Layer 3 — Loader Configuration and Download Resources
// ============================================================

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Parent of every dataset's default source root.
pub const DEFAULT_RAW_ROOT: &str = "data/raw";

/// Settings a loader is constructed with.
///
/// Built with the `with_*` methods, then handed to a loader which
/// keeps it for its whole lifetime. Fields are private so a loader's
/// configuration cannot drift after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    source_root:      PathBuf,
    mode:             String,
    allow_extraction: bool,
    #[serde(default, skip_serializing)]
    api_key:          Option<String>,
}

impl LoaderConfig {
    /// Config rooted at `source_root`, with the loader's default mode,
    /// extraction enabled and no API key.
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root:      source_root.into(),
            mode:             String::new(),
            allow_extraction: true,
            api_key:          None,
        }
    }

    /// `data/raw/<dataset_dir>`
    pub fn for_dataset(dataset_dir: &str) -> Self {
        Self::new(Path::new(DEFAULT_RAW_ROOT).join(dataset_dir))
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn with_extraction(mut self, allow: bool) -> Self {
        self.allow_extraction = allow;
        self
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Empty until a loader fills in its default
    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn allow_extraction(&self) -> bool {
        self.allow_extraction
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Used by loaders to substitute their default mode when none was given.
    pub(crate) fn or_default_mode(mut self, default_mode: &str) -> Self {
        if self.mode.is_empty() {
            self.mode = default_mode.to_string();
        }
        self
    }
}

/// One remote file to fetch for the current attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResource {
    /// Catalogue name, e.g. `fixations_Paragraph`
    pub identifier:     String,
    /// Full URL
    pub remote_locator: String,
    /// Final destination under the source root
    pub local_path:     PathBuf,
}

impl DownloadResource {
    pub fn new(
        identifier:     impl Into<String>,
        remote_locator: impl Into<String>,
        local_path:     impl Into<PathBuf>,
    ) -> Self {
        Self {
            identifier:     identifier.into(),
            remote_locator: remote_locator.into(),
            local_path:     local_path.into(),
        }
    }
}

/// Where a loader instance is in its lifecycle.
///
/// ```text
/// Uninitialized --download--> Downloaded --preprocess--> Preprocessed --load_data--> Ready
/// ```
///
/// `preprocess` and `load_data` re-scan the disk, so they may be
/// called from any state; the state only records what has happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoaderState {
    Uninitialized,
    Downloaded,
    Preprocessed,
    Ready,
}

impl fmt::Display for LoaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Downloaded    => "downloaded",
            Self::Preprocessed  => "preprocessed",
            Self::Ready         => "ready",
        };
        f.write_str(name)
    }
}
