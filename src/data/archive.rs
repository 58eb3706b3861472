// ============================================================
// Layer 4 — Archive Extraction
// ============================================================
// Unpacks downloaded zip archives next to them.
//
// A corrupt archive fails with PipelineError::Extraction and the
// archive itself is left untouched, so it can be inspected or
// deleted by hand before the next download attempt.
//
// Entry names are sanitised by the zip crate (no `..` escapes).

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::{PipelineError, Result};

/// Extract every entry of `archive_path` into `destination`.
/// Returns the paths of the extracted files (directories excluded).
pub fn extract_zip(archive_path: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
    // A missing archive is a plain I/O error, not a corrupt one
    let file = File::open(archive_path)?;

    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| extraction_failed(archive_path, e))?;

    fs::create_dir_all(destination)?;
    archive
        .extract(destination)
        .map_err(|e| extraction_failed(archive_path, e))?;

    let extracted: Vec<PathBuf> = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(|name| destination.join(name))
        .collect();

    tracing::info!(
        "Extracted {} files from '{}' into '{}'",
        extracted.len(),
        archive_path.display(),
        destination.display()
    );
    Ok(extracted)
}

fn extraction_failed(archive: &Path, err: zip::result::ZipError) -> PipelineError {
    tracing::error!("Cannot extract '{}': {}", archive.display(), err);
    PipelineError::Extraction {
        archive: archive.to_path_buf(),
        reason:  err.to_string(),
    }
}
