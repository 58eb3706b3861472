// ============================================================
// Layer 4 — ZuCo Loader
// ============================================================
// EEG + eye-tracking corpus. Raw data arrives as one export per
// subject/session, placed by hand under the source root:
//
//   <root>/ZAB.json
//   {
//     "subject": "ZAB",
//     "sentences": [
//       { "id": "sentence_0", "content": "Henry Ford ...",
//         "words": [
//           { "content": "Henry",
//             "fixations": { "FFD": 98, "GD": 98, "GPT": 98,
//                            "TRT": 196, "SFD": 98, "nFixations": 2 },
//             "eeg": { "t1": [...], "t2": [...], ..., "g2": [...] } },
//           { "content": "Ford", "fixations": null, "eeg": null }
//         ] } ] }
//
// preprocess walks every export, turns each sentence group into
// one SentenceRecord, and streams it as a line of
// <root>/zuco_word_level.jsonl. EEG values are stored at the
// caller-chosen Precision (f16 by default, like the corpus tools).
//
// Words that were never fixated carry zero fixation features and
// no neural features. A value that does not fit the storage type
// fails preprocessing with the offending word named.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::data::catalogue::ResourceCatalogue;
use crate::data::download::{download_catalogue, HttpSource, TransferPolicy};
use crate::data::store::{find_raw_files, read_json_lines, JsonLinesWriter};
use crate::domain::record::{SentenceRecord, WordRecord};
use crate::domain::resource::{LoaderConfig, LoaderState};
use crate::domain::traits::{DatasetLoader, RemoteSource};
use crate::error::{PipelineError, Result};

pub const BASE_URL: &str = "https://osf.io/download/";
pub const DEFAULT_MODE: &str = "manual";
pub const DATASET_DIR: &str = "ZuCo";
pub const OUTPUT_FILE: &str = "zuco_word_level.jsonl";

const EXPORT_PATTERN: &str = "**/*.json";

/// Order of `WordRecord::fixation_features` for this corpus
pub const FIXATION_MEASURES: [&str; 6] = ["FFD", "GD", "GPT", "TRT", "SFD", "nFixations"];

/// theta, alpha, beta, gamma: two sub-bands each
pub const EEG_BANDS: [&str; 8] = ["t1", "t2", "a1", "a2", "b1", "b2", "g1", "g2"];

/// Subject exports are placed by hand; extra modes can be registered
/// on the returned catalogue before constructing the loader.
pub fn catalogue() -> ResourceCatalogue {
    ResourceCatalogue::new(BASE_URL).with_mode(DEFAULT_MODE, &[])
}

// ─── Precision ────────────────────────────────────────────────────────────────
/// Numeric resolution EEG values are rounded to before storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Precision {
    /// IEEE half precision
    #[default]
    F16,
    F32,
}

impl Precision {
    /// `None` when `value` is not finite at this precision
    /// (|v| > 65504 for f16, NaN at any precision).
    pub fn quantize(self, value: f64) -> Option<f32> {
        let stored = match self {
            Precision::F16 => half::f16::from_f64(value).to_f32(),
            Precision::F32 => value as f32,
        };
        stored.is_finite().then_some(stored)
    }
}

impl FromStr for Precision {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "f16" | "float16" | "half" => Ok(Precision::F16),
            "f32" | "float32" | "single" => Ok(Precision::F32),
            other => Err(PipelineError::config("precision", format!("unknown precision '{other}'; expected f16 or f32"))),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Precision::F16 => "f16",
            Precision::F32 => "f32",
        })
    }
}

// ─── Raw export schema ────────────────────────────────────────────────────────
#[derive(Debug, Deserialize)]
struct SubjectExport {
    #[serde(default)]
    subject:   Option<String>,
    sentences: Vec<SentenceGroup>,
}

#[derive(Debug, Deserialize)]
struct SentenceGroup {
    id:      String,
    #[serde(default)]
    content: String,
    words:   Vec<RawWord>,
}

#[derive(Debug, Deserialize)]
struct RawWord {
    #[serde(default)]
    content:   String,
    #[serde(default)]
    fixations: Option<HashMap<String, Option<f64>>>,
    #[serde(default)]
    eeg:       Option<HashMap<String, Vec<f64>>>,
}

// ─── ZucoLoader ───────────────────────────────────────────────────────────────
pub struct ZucoLoader {
    config:    LoaderConfig,
    catalogue: ResourceCatalogue,
    source:    Box<dyn RemoteSource>,
    policy:    TransferPolicy,
    precision: Precision,
    state:     LoaderState,
}

impl ZucoLoader {
    pub fn new(config: LoaderConfig) -> Result<Self> {
        let policy = TransferPolicy::default();
        let source = HttpSource::new(&policy)?;
        Self::with_parts(config, catalogue(), Box::new(source), policy)
    }

    /// Loader over an explicit catalogue and remote source.
    /// The mode is validated against `catalogue` before the root is created.
    pub fn with_parts(
        config:    LoaderConfig,
        catalogue: ResourceCatalogue,
        source:    Box<dyn RemoteSource>,
        policy:    TransferPolicy,
    ) -> Result<Self> {
        let config = config.or_default_mode(DEFAULT_MODE);
        catalogue.ensure_mode(config.mode())?;

        fs::create_dir_all(config.source_root())?;
        tracing::info!(
            "Initialized ZuCo loader (mode '{}') with source root '{}'",
            config.mode(),
            config.source_root().display()
        );

        Ok(Self {
            config,
            catalogue,
            source,
            policy,
            precision: Precision::default(),
            state: LoaderState::Uninitialized,
        })
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }
}

impl DatasetLoader for ZucoLoader {
    fn name(&self) -> &'static str {
        "zuco"
    }

    fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn state(&self) -> LoaderState {
        self.state
    }

    fn download(&mut self) -> Result<Vec<PathBuf>> {
        let paths = download_catalogue(&*self, &self.catalogue, &*self.source, &self.policy)?;
        if paths.is_empty() {
            tracing::info!(
                "Please place ZuCo subject exports (*.json) in {}",
                self.config.source_root().display()
            );
        }
        self.state = LoaderState::Downloaded;
        Ok(paths)
    }

    fn preprocess(&mut self) -> Result<PathBuf> {
        let root = self.config.source_root();
        let exports = find_raw_files(root, EXPORT_PATTERN)?;
        if exports.is_empty() {
            let err = PipelineError::MissingData {
                dir:     root.to_path_buf(),
                pattern: EXPORT_PATTERN.to_string(),
            };
            tracing::error!("{}", err);
            return Err(err);
        }

        let output = self.processed_path();
        let mut writer = JsonLinesWriter::create(&output)?;

        for file in &exports {
            tracing::info!("Processing {}", file.display());
            let export: SubjectExport = serde_json::from_reader(BufReader::new(File::open(file)?))?;
            let subject = export.subject.clone().unwrap_or_else(|| file_stem(file));

            for group in &export.sentences {
                writer.write(&sentence_record(&subject, group, self.precision)?)?;
            }
        }

        let sentences = writer.finish()?;
        tracing::info!(
            "Saved {} standardized sentences ({} EEG) → {}",
            sentences,
            self.precision,
            output.display()
        );
        self.state = LoaderState::Preprocessed;
        Ok(output)
    }

    /// Flattens the sentence file into its word records.
    fn load_data(&mut self, file_path: &Path) -> Result<Vec<WordRecord>> {
        let sentences: Vec<SentenceRecord> = read_json_lines(file_path)?;
        let records: Vec<WordRecord> = sentences.into_iter().flat_map(|s| s.words).collect();
        tracing::info!("Loaded {} ZuCo word records from {}", records.len(), file_path.display());
        self.state = LoaderState::Ready;
        Ok(records)
    }

    fn processed_path(&self) -> PathBuf {
        self.config.source_root().join(OUTPUT_FILE)
    }
}

/// Per-word aligned features for one sentence group.
fn sentence_record(subject: &str, group: &SentenceGroup, precision: Precision) -> Result<SentenceRecord> {
    let mut words = Vec::with_capacity(group.words.len());

    for (idx, word) in group.words.iter().enumerate() {
        let word_id = format!("{subject}:{}:{idx}", group.id);
        let Some(fixations) = &word.fixations else {
            words.push(WordRecord::new(word_id, vec![0.0; FIXATION_MEASURES.len()]));
            continue;
        };

        let mut fixation_features = Vec::with_capacity(FIXATION_MEASURES.len());
        for measure in FIXATION_MEASURES {
            let value = fixations.get(measure).copied().flatten().unwrap_or(0.0);
            let stored = Precision::F32
                .quantize(value)
                .ok_or_else(|| out_of_range(&word_id, &word.content, measure, value, Precision::F32))?;
            fixation_features.push(stored);
        }

        let record = WordRecord::new(word_id, fixation_features);
        let neural = match &word.eeg {
            Some(eeg) => band_features(eeg, precision, &record.word_id, &word.content)?,
            None => None,
        };
        match neural {
            Some(neural) => words.push(record.with_neural(neural)),
            None => {
                tracing::debug!("'{}' ({}) has no complete EEG bands", record.word_id, word.content);
                words.push(record);
            }
        }
    }

    Ok(SentenceRecord {
        sentence_id: group.id.clone(),
        subject:     subject.to_string(),
        content:     group.content.clone(),
        words,
    })
}

/// Concatenate every band in EEG_BANDS order; `None` if any band is missing.
fn band_features(
    eeg:       &HashMap<String, Vec<f64>>,
    precision: Precision,
    word_id:   &str,
    content:   &str,
) -> Result<Option<Vec<f32>>> {
    let mut features = Vec::new();
    for band in EEG_BANDS {
        let Some(channels) = eeg.get(band) else {
            return Ok(None);
        };
        for value in channels {
            let stored = precision
                .quantize(*value)
                .ok_or_else(|| out_of_range(word_id, content, band, *value, precision))?;
            features.push(stored);
        }
    }
    Ok(Some(features))
}

fn out_of_range(word_id: &str, content: &str, field: &str, value: f64, precision: Precision) -> PipelineError {
    let err = PipelineError::validation(format!(
        "word '{word_id}' ({content}): {field} value {value} is not representable as {precision}"
    ));
    tracing::error!("{}", err);
    err
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}
