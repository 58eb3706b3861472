// ============================================================
// Layer 4 — OneStop Loader
// ============================================================
// Reading-comprehension eye-tracking corpus published on OSF
// as zipped Eyelink report exports.
//
//   download   → <root>/<mode>_<resource>.zip, extracted in place
//   preprocess → every interest-area report CSV under <root>
//                becomes one WordRecord per row in
//                <root>/onestop_word_level.jsonl
//   load_data  → parse that file back
//
// Interest-area report columns we read:
//   participant_id                      required
//   IA_ID                               required
//   unique_paragraph_id / paragraph_id  optional, part of word_id
//   IA_FIRST_FIXATION_DURATION ...      fixation features, fixed order
//
// Eyelink writes "." for measures that do not apply (a word that
// was skipped has no first-fixation duration); those become 0.0.
// Fixation reports lack IA_ID and are skipped with a warning.

use std::fs;
use std::path::{Path, PathBuf};

use crate::data::catalogue::ResourceCatalogue;
use crate::data::download::{download_catalogue, HttpSource, TransferPolicy};
use crate::data::store::{find_raw_files, read_json_lines, JsonLinesWriter};
use crate::domain::record::WordRecord;
use crate::domain::resource::{LoaderConfig, LoaderState};
use crate::domain::traits::{DatasetLoader, RemoteSource};
use crate::error::{PipelineError, Result};

pub const BASE_URL: &str = "https://osf.io/download/";
pub const DEFAULT_MODE: &str = "ordinary";
pub const DATASET_DIR: &str = "OneStop";
pub const OUTPUT_FILE: &str = "onestop_word_level.jsonl";

const REPORT_PATTERN: &str = "**/*.csv";
const PARTICIPANT_COLUMN: &str = "participant_id";
const IA_COLUMN: &str = "IA_ID";
const PARAGRAPH_COLUMNS: [&str; 2] = ["unique_paragraph_id", "paragraph_id"];

/// Order of `WordRecord::fixation_features` for this corpus
pub const FEATURE_COLUMNS: [&str; 5] = [
    "IA_FIRST_FIXATION_DURATION",
    "IA_FIRST_RUN_DWELL_TIME",
    "IA_DWELL_TIME",
    "IA_FIXATION_COUNT",
    "IA_REGRESSION_OUT_COUNT",
];

/// OSF resources per acquisition mode
pub fn catalogue() -> ResourceCatalogue {
    ResourceCatalogue::new(BASE_URL)
        .with_mode("ordinary", &[("fixations_Paragraph", "ne4az"), ("ia_Paragraph", "xkgfz")])
        .with_mode("onestop", &[("fixations_Paragraph", "dq935"), ("ia_Paragraph", "4ajc8")])
}

pub struct OneStopLoader {
    config:    LoaderConfig,
    catalogue: ResourceCatalogue,
    source:    Box<dyn RemoteSource>,
    policy:    TransferPolicy,
    state:     LoaderState,
}

impl OneStopLoader {
    /// Loader fetching over HTTP with the default transfer policy.
    pub fn new(config: LoaderConfig) -> Result<Self> {
        let policy = TransferPolicy::default();
        let source = HttpSource::new(&policy)?;
        Self::with_source(config, Box::new(source), policy)
    }

    /// Loader with an explicit remote source.
    ///
    /// The mode is checked before anything touches the disk or network;
    /// the source root is created afterwards.
    pub fn with_source(
        config: LoaderConfig,
        source: Box<dyn RemoteSource>,
        policy: TransferPolicy,
    ) -> Result<Self> {
        let config = config.or_default_mode(DEFAULT_MODE);
        let catalogue = catalogue();
        catalogue.ensure_mode(config.mode())?;

        fs::create_dir_all(config.source_root())?;
        tracing::info!(
            "Initialized OneStop loader (mode '{}') with source root '{}'",
            config.mode(),
            config.source_root().display()
        );

        Ok(Self { config, catalogue, source, policy, state: LoaderState::Uninitialized })
    }
}

impl DatasetLoader for OneStopLoader {
    fn name(&self) -> &'static str {
        "onestop"
    }

    fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn state(&self) -> LoaderState {
        self.state
    }

    fn download(&mut self) -> Result<Vec<PathBuf>> {
        let paths = download_catalogue(&*self, &self.catalogue, &*self.source, &self.policy)?;
        self.state = LoaderState::Downloaded;
        Ok(paths)
    }

    fn preprocess(&mut self) -> Result<PathBuf> {
        let root = self.config.source_root();
        tracing::info!("Preprocessing OneStop {} dataset...", self.config.mode());

        let reports = find_raw_files(root, REPORT_PATTERN)?;
        if reports.is_empty() {
            return Err(missing_reports(root));
        }

        let output = self.processed_path();
        let mut writer = JsonLinesWriter::create(&output)?;

        for report in &reports {
            match read_report(report, &mut writer)? {
                Some(rows) => tracing::info!("Processed {} ({} words)", report.display(), rows),
                None => tracing::warn!(
                    "Skipping {}: no '{}' / '{}' columns",
                    report.display(),
                    PARTICIPANT_COLUMN,
                    IA_COLUMN
                ),
            }
        }

        // Only fixation reports (or unrelated CSVs) were found
        if writer.count() == 0 {
            return Err(missing_reports(root));
        }

        let count = writer.finish()?;
        tracing::info!("Saved {} word records → {}", count, output.display());
        self.state = LoaderState::Preprocessed;
        Ok(output)
    }

    fn load_data(&mut self, file_path: &Path) -> Result<Vec<WordRecord>> {
        let records: Vec<WordRecord> = read_json_lines(file_path)?;
        tracing::info!("Loaded {} OneStop word records from {}", records.len(), file_path.display());
        self.state = LoaderState::Ready;
        Ok(records)
    }

    fn processed_path(&self) -> PathBuf {
        self.config.source_root().join(OUTPUT_FILE)
    }
}

fn missing_reports(root: &Path) -> PipelineError {
    let err = PipelineError::MissingData {
        dir:     root.to_path_buf(),
        pattern: format!("{REPORT_PATTERN} (interest-area reports)"),
    };
    tracing::error!("{}", err);
    err
}

/// Stream one interest-area report into `writer`.
/// Returns `None` when the file is not an interest-area report.
fn read_report(path: &Path, writer: &mut JsonLinesWriter) -> Result<Option<usize>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let (Some(participant_col), Some(ia_col)) = (column(PARTICIPANT_COLUMN), column(IA_COLUMN)) else {
        return Ok(None);
    };
    let paragraph_col = PARAGRAPH_COLUMNS.iter().find_map(|name| column(name));
    let feature_cols: Vec<Option<usize>> = FEATURE_COLUMNS.iter().map(|name| column(name)).collect();

    let mut rows = 0usize;
    for row in reader.records() {
        let row = row?;
        let field = |idx: usize| row.get(idx).map(str::trim).unwrap_or_default();

        let word_id = match paragraph_col {
            Some(p) => format!("{}:{}:{}", field(participant_col), field(p), field(ia_col)),
            None    => format!("{}:{}", field(participant_col), field(ia_col)),
        };

        let features = feature_cols
            .iter()
            .map(|col| col.map(|idx| parse_measure(field(idx))).unwrap_or(0.0))
            .collect();

        writer.write(&WordRecord::new(word_id, features))?;
        rows += 1;
    }

    Ok(Some(rows))
}

/// Eyelink measure → f32. "." (not applicable), blanks and
/// unparseable values map to 0.0; thousands separators are dropped.
fn parse_measure(raw: &str) -> f32 {
    if raw.is_empty() || raw == "." {
        return 0.0;
    }
    raw.replace(',', "")
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::download::fake::FakeSource;
    use std::io::Write;
    use std::time::Duration;
    use zip::write::SimpleFileOptions;

    const IA_REPORT: &str = "\
participant_id,unique_paragraph_id,IA_ID,IA_LABEL,IA_FIRST_FIXATION_DURATION,IA_FIRST_RUN_DWELL_TIME,IA_DWELL_TIME,IA_FIXATION_COUNT,IA_REGRESSION_OUT_COUNT
l42_1,3_1_2,1,The,180,180,412,2,0
l42_1,3_1_2,2,cat,.,.,0,0,.
l42_1,3_1_2,3,sat,\"1,204\",210,1204,5,1
";

    const FIXATION_REPORT: &str = "\
participant_id,CURRENT_FIX_INDEX,CURRENT_FIX_DURATION
l42_1,1,180
";

    fn no_wait() -> TransferPolicy {
        TransferPolicy { timeout: Duration::from_secs(1), max_retries: 0, initial_backoff: Duration::ZERO }
    }

    fn zip_bytes(name: &str, body: &str) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_constructor_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data").join("raw").join("OneStop");
        assert!(!root.exists());

        let loader = OneStopLoader::with_source(
            LoaderConfig::new(&root),
            Box::new(FakeSource::ok(b"")),
            no_wait(),
        )
        .unwrap();

        assert!(root.is_dir());
        assert_eq!(loader.config().mode(), DEFAULT_MODE);
        assert_eq!(loader.state(), LoaderState::Uninitialized);
    }

    #[test]
    fn test_unknown_mode_fails_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("never-created");
        let source = FakeSource::ok(b"");

        let result = OneStopLoader::with_source(
            LoaderConfig::new(&root).with_mode("nonexistent"),
            Box::new(source.clone()),
            no_wait(),
        );

        match result {
            Err(PipelineError::InvalidMode { valid, .. }) => {
                assert_eq!(valid, vec!["onestop".to_string(), "ordinary".to_string()]);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("mode should have been rejected"),
        }
        assert_eq!(source.calls(), 0);
        assert!(!root.exists());
    }

    #[test]
    fn test_download_extracts_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::ok(&zip_bytes("ia_Paragraph.csv", IA_REPORT));
        let mut loader = OneStopLoader::with_source(
            LoaderConfig::new(dir.path()),
            Box::new(source.clone()),
            no_wait(),
        )
        .unwrap();

        let paths = loader.download().unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(source.calls(), 2);
        assert!(dir.path().join("ordinary_ia_Paragraph.zip").exists());
        assert!(dir.path().join("ia_Paragraph.csv").exists());
        assert_eq!(loader.state(), LoaderState::Downloaded);
        assert!(source.urls.borrow().contains(&"https://osf.io/download/xkgfz".to_string()));

        loader.download().unwrap();
        assert_eq!(source.calls(), 2, "second download must not touch the network");
    }

    #[test]
    fn test_download_without_extraction_keeps_archives_only() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::ok(&zip_bytes("ia_Paragraph.csv", IA_REPORT));
        let mut loader = OneStopLoader::with_source(
            LoaderConfig::new(dir.path()).with_mode("onestop").with_extraction(false),
            Box::new(source),
            no_wait(),
        )
        .unwrap();

        loader.download().unwrap();
        assert!(dir.path().join("onestop_ia_Paragraph.zip").exists());
        assert!(!dir.path().join("ia_Paragraph.csv").exists());
    }

    #[test]
    fn test_preprocess_without_reports_is_missing_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader =
            OneStopLoader::with_source(LoaderConfig::new(dir.path()), Box::new(FakeSource::ok(b"")), no_wait())
                .unwrap();

        let err = loader.preprocess().unwrap_err();
        assert!(matches!(err, PipelineError::MissingData { .. }));
        assert!(!loader.processed_path().exists());
    }

    #[test]
    fn test_preprocess_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ia_Paragraph.csv"), IA_REPORT).unwrap();
        fs::write(dir.path().join("fixations_Paragraph.csv"), FIXATION_REPORT).unwrap();

        let mut loader =
            OneStopLoader::with_source(LoaderConfig::new(dir.path()), Box::new(FakeSource::ok(b"")), no_wait())
                .unwrap();

        let output = loader.preprocess().unwrap();
        assert_eq!(loader.state(), LoaderState::Preprocessed);

        let records = loader.load_data(&output).unwrap();
        assert_eq!(loader.state(), LoaderState::Ready);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].word_id, "l42_1:3_1_2:1");
        assert_eq!(records[0].fixation_features, vec![180.0, 180.0, 412.0, 2.0, 0.0]);
        // skipped word: "." becomes 0.0
        assert_eq!(records[1].fixation_features, vec![0.0, 0.0, 0.0, 0.0, 0.0]);
        // quoted thousands separator
        assert_eq!(records[2].fixation_features[0], 1204.0);
        assert!(loader.validate(&records));
    }

    #[test]
    fn test_preprocess_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ia_Paragraph.csv"), IA_REPORT).unwrap();
        let mut loader =
            OneStopLoader::with_source(LoaderConfig::new(dir.path()), Box::new(FakeSource::ok(b"")), no_wait())
                .unwrap();

        let first = fs::read_to_string(loader.preprocess().unwrap()).unwrap();
        let second = fs::read_to_string(loader.preprocess().unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_only_fixation_reports_is_missing_data() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fixations_Paragraph.csv"), FIXATION_REPORT).unwrap();
        let mut loader =
            OneStopLoader::with_source(LoaderConfig::new(dir.path()), Box::new(FakeSource::ok(b"")), no_wait())
                .unwrap();

        assert!(matches!(loader.preprocess(), Err(PipelineError::MissingData { .. })));
    }

    #[test]
    fn test_parse_measure() {
        assert_eq!(parse_measure("."), 0.0);
        assert_eq!(parse_measure(""), 0.0);
        assert_eq!(parse_measure("212.5"), 212.5);
        assert_eq!(parse_measure("1,204"), 1204.0);
        assert_eq!(parse_measure("NaN"), 0.0);
        assert_eq!(parse_measure("n/a"), 0.0);
    }
}
