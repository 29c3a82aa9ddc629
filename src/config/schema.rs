//! YAML schema for analysis configuration

use crate::io::{BRAIN_FIELD, DEFAULT_SENTENCES_PATH};
use crate::stats::{PredSource, DEFAULT_PRED_TEMPLATE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

fn default_brain_field() -> String {
    BRAIN_FIELD.to_string()
}

fn default_template() -> String {
    DEFAULT_PRED_TEMPLATE.to_string()
}

fn default_pred_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Complete analysis configuration; every section is optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Sentence stimuli, one per line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentences: Option<PathBuf>,

    /// Encoding `.npy` files, concatenated column-wise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encodings: Option<Vec<PathBuf>>,

    /// PCA target dimensionality applied to each encoding file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brain: Option<BrainConfig>,

    /// Directory holding decoder `.csv` and `.pred.npy` outputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_dir: Option<PathBuf>,

    /// Prefix for result file globs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob_prefix: Option<String>,

    /// Centre and L2-normalise predictions before ranking
    #[serde(default = "default_true")]
    pub normalize_predictions: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<CheckpointConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sentences: None,
            encodings: None,
            projection: None,
            brain: None,
            results_dir: None,
            glob_prefix: None,
            normalize_predictions: true,
            comparison: None,
            checkpoint: None,
        }
    }
}

impl AnalysisConfig {
    /// Sentence file, falling back to the standard stimuli location.
    pub fn sentences_path(&self) -> PathBuf {
        self.sentences.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_SENTENCES_PATH))
    }
}

/// Brain image source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrainConfig {
    pub path: PathBuf,
    /// MAT variable holding the image matrix
    #[serde(default = "default_brain_field")]
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<usize>,
}

/// Cross-model significance testing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparisonConfig {
    /// Model name -> stem of its rank CSV
    pub models: BTreeMap<String, String>,
    /// Explicit pairs; all combinations when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairs: Option<Vec<(String, String)>>,
    #[serde(default = "default_true")]
    pub bonferroni: bool,
    #[serde(default = "default_pred_dir")]
    pub pred_dir: PathBuf,
    /// Rank CSV file-name template with one `{}` placeholder
    #[serde(default = "default_template")]
    pub template: String,
}

impl ComparisonConfig {
    pub fn pred_source(&self) -> PredSource {
        PredSource::new(self.pred_dir.clone()).with_template(self.template.clone())
    }
}

/// Fine-tuning checkpoint to summarise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckpointConfig {
    pub savedir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<i64>>,
}
