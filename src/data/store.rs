// ============================================================
// Layer 4 — Record Store
// ============================================================
// File plumbing shared by the loaders:
//
//   find_raw_files   → glob under a source root (sorted)
//   JsonLinesWriter  → stream records to `<out>.tmp`, rename on finish
//   read_json_lines  → parse a standardized file back
//
// Records are written one per line as they are produced, so a
// whole corpus never has to sit in memory before it is saved.
// An unfinished writer removes its temp file when dropped, and
// the previous output stays in place until `finish` succeeds.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PipelineError, Result};

/// All files under `root` matching `pattern` (e.g. `**/*.csv`), sorted.
pub fn find_raw_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let full_pattern = format!("{escaped_root}/{pattern}");

    let entries = glob::glob(&full_pattern)
        .map_err(|e| PipelineError::config("raw file pattern", e.to_string()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(std::io::Error::from)?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Streaming JSON-lines writer with atomic replacement of the target.
pub struct JsonLinesWriter {
    target: PathBuf,
    temp:   PathBuf,
    writer: Option<BufWriter<File>>,
    count:  usize,
}

impl JsonLinesWriter {
    pub fn create(target: impl Into<PathBuf>) -> Result<Self> {
        let target = target.into();
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut temp: OsString = target.as_os_str().to_owned();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        let writer = BufWriter::new(File::create(&temp)?);
        Ok(Self { target, temp, writer: Some(writer), count: 0 })
    }

    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| std::io::Error::other("writer already finished"))?;
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        self.count += 1;
        Ok(())
    }

    /// Records written so far
    pub fn count(&self) -> usize {
        self.count
    }

    /// Flush, then rename the temp file over the target.
    /// Returns the number of records written.
    pub fn finish(mut self) -> Result<usize> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&self.temp, &self.target)?;
        Ok(self.count)
    }
}

impl Drop for JsonLinesWriter {
    fn drop(&mut self) {
        // Still holding the writer means `finish` never ran
        if self.writer.take().is_some() {
            let _ = fs::remove_file(&self.temp);
        }
    }
}

/// Parse every non-blank line of `path` as one `T`.
pub fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}
