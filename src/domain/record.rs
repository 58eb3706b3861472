// ============================================================
// Layer 3 — Standardized Records
// ============================================================
// The logical shape every dataset variant normalises into:
//
//   WordRecord      one stimulus word with its aligned signals
//   SentenceRecord  a sentence of WordRecords (EEG corpus output)
//
// Both loaders write these as JSON lines, one record per line,
// and `load_data` always hands back a flat Vec<WordRecord>.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// One stimulus word with its eye-tracking features and,
/// for corpora that recorded it, the aligned EEG features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    /// Stable identifier, e.g. `"ZAB:sentence_3:7"` or `"l42_1:3_1_2:12"`
    pub word_id: String,

    /// Fixed-order fixation measures (durations in ms, counts)
    pub fixation_features: Vec<f32>,

    /// Concatenated EEG band features, absent when the word was
    /// never fixated or the corpus has no neural channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neural_features: Option<Vec<f32>>,
}

impl WordRecord {
    pub fn new(word_id: impl Into<String>, fixation_features: Vec<f32>) -> Self {
        Self {
            word_id: word_id.into(),
            fixation_features,
            neural_features: None,
        }
    }

    pub fn with_neural(mut self, neural_features: Vec<f32>) -> Self {
        self.neural_features = Some(neural_features);
        self
    }
}

/// One sentence read by one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceRecord {
    pub sentence_id: String,
    pub subject:     String,
    /// Full sentence text as presented on screen
    pub content:     String,
    pub words:       Vec<WordRecord>,
}

/// Shape checks shared by every loader's `validate`.
///
/// Fails on the first problem found:
///   - empty record set
///   - empty `word_id`
///   - empty or non-finite `fixation_features`
///   - non-finite `neural_features`
pub fn check_records(records: &[WordRecord]) -> Result<()> {
    if records.is_empty() {
        return Err(PipelineError::validation("record set is empty"));
    }

    for (i, record) in records.iter().enumerate() {
        if record.word_id.trim().is_empty() {
            return Err(PipelineError::validation(format!("record {i} has an empty word_id")));
        }
        if record.fixation_features.is_empty() {
            return Err(PipelineError::validation(format!(
                "record '{}' has no fixation features",
                record.word_id
            )));
        }
        if record.fixation_features.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::validation(format!(
                "record '{}' has non-finite fixation features",
                record.word_id
            )));
        }
        if let Some(neural) = &record.neural_features {
            if neural.iter().any(|v| !v.is_finite()) {
                return Err(PipelineError::validation(format!(
                    "record '{}' has non-finite neural features",
                    record.word_id
                )));
            }
        }
    }

    Ok(())
}
