// ============================================================
// Layer 4 — Resource Download
// ============================================================
// Fetches remote dataset files into a loader's source root.
//
// Guarantees for every resource:
//   1. An existing destination file is never re-fetched
//   2. Bytes stream into `<dest>.part` and are renamed into place
//      only after the whole body arrived and was flushed
//   3. Any failure deletes the partial file, so a truncated
//      download can never pass for a finished one on retry
//   4. Transient failures (5xx, 429, timeouts, refused connections)
//      are retried with exponential backoff, up to a fixed bound
//
// Reference: reqwest blocking client documentation

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::data::catalogue::ResourceCatalogue;
use crate::domain::resource::{DownloadResource, LoaderConfig};
use crate::domain::traits::{DatasetLoader, RemoteSource};
use crate::error::{PipelineError, Result};

/// Timeout and retry bounds for one resource transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPolicy {
    /// Whole-request timeout, body included
    pub timeout:         Duration,
    /// Extra attempts after the first one
    pub max_retries:     u32,
    /// Sleep before the first retry; doubles on each following retry
    pub initial_backoff: Duration,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            timeout:         Duration::from_secs(300),
            max_retries:     3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl TransferPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .checked_mul(2u32.saturating_pow(attempt))
            .unwrap_or(Duration::MAX)
    }
}

// ─── HttpSource ───────────────────────────────────────────────────────────────
/// RemoteSource over a blocking reqwest client.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(policy: &TransferPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(policy.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl RemoteSource for HttpSource {
    fn fetch(&self, url: &str, api_key: Option<&str>, sink: &mut dyn Write) -> Result<u64> {
        let mut request = self.client.get(url);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }

        let mut response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Transfer {
                url:    url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.copy_to(sink)?)
    }
}

/// What happened to one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Destination already existed; no network call was made
    Skipped,
    /// Fetched and renamed into place
    Fetched { bytes: u64 },
}

/// Fetch one resource unless its destination already exists.
pub fn download_resource(
    source:   &dyn RemoteSource,
    resource: &DownloadResource,
    api_key:  Option<&str>,
    policy:   &TransferPolicy,
) -> Result<DownloadOutcome> {
    let dest = &resource.local_path;

    if dest.exists() {
        tracing::info!("'{}' already exists, skipping download", dest.display());
        return Ok(DownloadOutcome::Skipped);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let partial = partial_path(dest);
    let mut attempt = 0u32;

    loop {
        tracing::info!(
            "Downloading '{}' from {} (attempt {}/{})",
            resource.identifier,
            resource.remote_locator,
            attempt + 1,
            policy.max_retries + 1,
        );

        match fetch_to_file(source, &resource.remote_locator, api_key, &partial) {
            Ok(bytes) => {
                if let Err(e) = fs::rename(&partial, dest) {
                    discard_partial(&partial);
                    return Err(e.into());
                }
                tracing::info!("Saved '{}' ({} bytes)", dest.display(), bytes);
                return Ok(DownloadOutcome::Fetched { bytes });
            }
            Err(e) => {
                // Never leave a truncated body behind
                discard_partial(&partial);

                if e.is_retryable() && attempt < policy.max_retries {
                    let wait = policy.backoff(attempt);
                    tracing::warn!(
                        "Transient failure for '{}': {} (retrying in {:?})",
                        resource.identifier, e, wait
                    );
                    thread::sleep(wait);
                    attempt += 1;
                    continue;
                }

                tracing::error!("Download of '{}' failed: {}", resource.identifier, e);
                return Err(e);
            }
        }
    }
}

/// Best-effort removal; a failure here must not mask the transfer error.
fn discard_partial(partial: &Path) {
    if partial.exists() {
        if let Err(e) = fs::remove_file(partial) {
            tracing::warn!("Could not remove partial file '{}': {}", partial.display(), e);
        }
    }
}

/// Download every resource of the config's mode, extracting zip archives
/// into the source root when the config allows it.
///
/// Shared by every loader whose corpus is published as remote archives.
pub fn download_catalogue<L: DatasetLoader + ?Sized>(
    loader:    &L,
    catalogue: &ResourceCatalogue,
    source:    &dyn RemoteSource,
    policy:    &TransferPolicy,
) -> Result<Vec<PathBuf>> {
    let config: &LoaderConfig = loader.config();
    let root = config.source_root();
    let resources = catalogue.resources(config.mode(), root)?;

    let mut paths = Vec::with_capacity(resources.len());
    for resource in &resources {
        download_resource(source, resource, config.api_key(), policy)?;

        if config.allow_extraction() && is_zip(&resource.local_path) {
            loader.extract(&resource.local_path, root)?;
        }
        paths.push(resource.local_path.clone());
    }

    Ok(paths)
}

fn fetch_to_file(
    source:  &dyn RemoteSource,
    url:     &str,
    api_key: Option<&str>,
    path:    &Path,
) -> Result<u64> {
    let mut writer = BufWriter::new(File::create(path)?);
    let bytes = source.fetch(url, api_key, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(bytes)
}

/// `archive.zip` → `archive.zip.part`
pub(crate) fn partial_path(dest: &Path) -> PathBuf {
    let mut name: OsString = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}

// ─── Test Doubles ─────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod fake {
    use std::cell::{Cell, RefCell};
    use std::io::Write;
    use std::rc::Rc;

    use crate::domain::traits::RemoteSource;
    use crate::error::{PipelineError, Result};

    /// Scripted RemoteSource that records every call.
    #[derive(Default)]
    pub struct FakeSource {
        pub body:               Vec<u8>,
        pub status:             u16,
        /// Number of leading calls answered with a 503
        pub transient_failures: Cell<u32>,
        /// Write half the body, then fail with an I/O error
        pub break_mid_body:     bool,
        pub urls:               RefCell<Vec<String>>,
        pub keys:               RefCell<Vec<Option<String>>>,
    }

    impl FakeSource {
        pub fn ok(body: &[u8]) -> Rc<Self> {
            Rc::new(Self { body: body.to_vec(), status: 200, ..Default::default() })
        }

        pub fn status(status: u16) -> Rc<Self> {
            Rc::new(Self { status, ..Default::default() })
        }

        pub fn flaky(body: &[u8], failures: u32) -> Rc<Self> {
            Rc::new(Self {
                body: body.to_vec(),
                status: 200,
                transient_failures: Cell::new(failures),
                ..Default::default()
            })
        }

        pub fn calls(&self) -> usize {
            self.urls.borrow().len()
        }
    }

    impl RemoteSource for FakeSource {
        fn fetch(&self, url: &str, api_key: Option<&str>, sink: &mut dyn Write) -> Result<u64> {
            self.urls.borrow_mut().push(url.to_string());
            self.keys.borrow_mut().push(api_key.map(str::to_string));

            let pending = self.transient_failures.get();
            if pending > 0 {
                self.transient_failures.set(pending - 1);
                return Err(PipelineError::Transfer { url: url.into(), status: 503 });
            }
            if !(200..300).contains(&self.status) {
                return Err(PipelineError::Transfer { url: url.into(), status: self.status });
            }
            if self.break_mid_body {
                sink.write_all(&self.body[..self.body.len() / 2])?;
                return Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset").into());
            }
            sink.write_all(&self.body)?;
            Ok(self.body.len() as u64)
        }
    }

    impl RemoteSource for Rc<FakeSource> {
        fn fetch(&self, url: &str, api_key: Option<&str>, sink: &mut dyn Write) -> Result<u64> {
            (**self).fetch(url, api_key, sink)
        }
    }
}
