//! Pairwise model comparison over rank-of-correct predictions

use super::wilcoxon::wilcoxon;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File-name template for per-model rank CSVs; `{}` is replaced by the model's stem.
pub const DEFAULT_PRED_TEMPLATE: &str = "perf.384sentences.{}.pred.csv";

/// Nominal significance level used when reporting the corrected threshold.
const ALPHA: f64 = 0.01;

/// Where per-model rank CSVs live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredSource {
    /// Directory containing the CSVs
    pub dir: PathBuf,
    /// File-name template with one `{}` placeholder
    pub template: String,
}

impl Default for PredSource {
    fn default() -> Self {
        Self { dir: PathBuf::from("."), template: DEFAULT_PRED_TEMPLATE.to_string() }
    }
}

impl PredSource {
    /// Rank CSVs in `dir` named by the default template.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), ..Self::default() }
    }

    /// Use a different file-name template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Path of the CSV for a model stem.
    pub fn path_for(&self, stem: &str) -> PathBuf {
        self.dir.join(self.template.replacen("{}", stem, 1))
    }
}

/// Columns read from a rank CSV; others are ignored.
#[derive(Debug, Deserialize)]
struct RankRow {
    subject: String,
    rank: f64,
}

/// One (model pair, subject) comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub model1: String,
    pub model2: String,
    pub subject: String,
    /// Wilcoxon statistic `min(R+, R-)`
    pub statistic: f64,
    /// Uncorrected two-sided p-value
    pub p_value: f64,
    /// Bonferroni-corrected p-value (`p_value * comparisons`), when requested
    pub p_value_corrected: Option<f64>,
}

/// All comparisons, sorted by (model1, model2, subject)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
    /// Bonferroni factor applied, if any
    pub correction: Option<usize>,
}

impl ComparisonTable {
    /// Number of comparisons.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no comparisons.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Comparison for a model pair and subject.
    pub fn get(&self, model1: &str, model2: &str, subject: &str) -> Option<&ComparisonRow> {
        self.rows
            .iter()
            .find(|r| r.model1 == model1 && r.model2 == model2 && r.subject == subject)
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<16} {:<16} {:<10} {:>12} {:>12} {:>14}",
            "model1", "model2", "subject", "w_stat", "p_val", "p_val_corrected"
        )?;
        for row in &self.rows {
            let corrected = row
                .p_value_corrected
                .map_or_else(|| "-".to_string(), |p| format!("{p:.4e}"));
            writeln!(
                f,
                "{:<16} {:<16} {:<10} {:>12.1} {:>12.4e} {:>14}",
                row.model1, row.model2, row.subject, row.statistic, row.p_value, corrected
            )?;
        }
        Ok(())
    }
}

/// Apply a Bonferroni correction by multiplying by the number of comparisons.
///
/// Values are not clamped to 1.0.
pub fn bonferroni(p_value: f64, comparisons: usize) -> f64 {
    p_value * comparisons as f64
}

fn read_rank_rows(path: &Path) -> Result<Vec<RankRow>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|source| Error::Csv { path: path.to_path_buf(), source })?;
    reader
        .deserialize()
        .map(|row| row.map_err(|source| Error::Csv { path: path.to_path_buf(), source }))
        .collect()
}

/// Compare decoders of different models with Wilcoxon signed-rank tests.
///
/// `models` maps a model name to the stem of its rank CSV (see [`PredSource`]).
/// Rows of two models' CSVs are paired by position; each subject of the first
/// model in a pair yields one test of `rank` against `rank`. Without explicit
/// `pairs`, every 2-combination of model names (sorted) is compared.
///
/// With `correct_bonferroni`, each p-value is multiplied by the total number of
/// comparisons (pairs x subjects).
pub fn wilcoxon_rank_preds(
    models: &BTreeMap<String, String>,
    correct_bonferroni: bool,
    pairs: Option<&[(String, String)]>,
    source: &PredSource,
) -> Result<ComparisonTable> {
    let pairs: Vec<(String, String)> = match pairs {
        Some(pairs) => pairs.to_vec(),
        None => {
            let names: Vec<&String> = models.keys().collect();
            let mut all = Vec::new();
            for (i, a) in names.iter().enumerate() {
                for b in &names[i + 1..] {
                    all.push(((*a).clone(), (*b).clone()));
                }
            }
            all
        }
    };

    for (a, b) in &pairs {
        for name in [a, b] {
            if !models.contains_key(name) {
                return Err(Error::UnknownModel(name.clone()));
            }
        }
    }

    let mut model_preds: BTreeMap<&str, Vec<RankRow>> = BTreeMap::new();
    for (model, stem) in models {
        let path = source.path_for(stem);
        let rows = read_rank_rows(&path)?;
        debug!(model = %model, path = %path.display(), rows = rows.len(), "loaded rank predictions");
        model_preds.insert(model.as_str(), rows);
    }

    let mut rows = Vec::new();
    for (model1, model2) in &pairs {
        let m1 = &model_preds[model1.as_str()];
        let m2 = &model_preds[model2.as_str()];
        if m1.len() != m2.len() {
            return Err(Error::shape(
                format!("rank predictions of {model1} vs {model2}"),
                vec![m1.len()],
                vec![m2.len()],
            ));
        }

        let mut by_subject: BTreeMap<&str, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        let mut mismatched = 0usize;
        for (a, b) in m1.iter().zip(m2) {
            if a.subject != b.subject {
                mismatched += 1;
            }
            let entry = by_subject.entry(a.subject.as_str()).or_default();
            entry.0.push(a.rank);
            entry.1.push(b.rank);
        }
        if mismatched > 0 {
            warn!("{mismatched} rows of {model1} and {model2} are paired across different subjects");
        }

        for (subject, (ranks1, ranks2)) in by_subject {
            let result = wilcoxon(&ranks1, &ranks2)?;
            rows.push(ComparisonRow {
                model1: model1.clone(),
                model2: model2.clone(),
                subject: subject.to_string(),
                statistic: result.statistic,
                p_value: result.p_value,
                p_value_corrected: None,
            });
        }
    }

    rows.sort_by(|a, b| {
        (&a.model1, &a.model2, &a.subject).cmp(&(&b.model1, &b.model2, &b.subject))
    });

    let correction = if correct_bonferroni {
        let comparisons = rows.len();
        info!(
            "Bonferroni correction over {comparisons} comparisons: alpha {ALPHA} -> {}",
            ALPHA / comparisons as f64
        );
        for row in &mut rows {
            row.p_value_corrected = Some(bonferroni(row.p_value, comparisons));
        }
        Some(comparisons)
    } else {
        None
    };

    Ok(ComparisonTable { rows, correction })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::fmt::Write as _;
    use tempfile::TempDir;

    fn write_ranks(dir: &Path, stem: &str, rows: &[(&str, usize)]) {
        let mut content = String::from("idx,subject,rank\n");
        for (i, (subject, rank)) in rows.iter().enumerate() {
            writeln!(content, "{i},{subject},{rank}").expect("string write should succeed");
        }
        std::fs::write(PredSource::new(dir).path_for(stem), content).expect("file write should succeed");
    }

    fn fixture() -> (TempDir, BTreeMap<String, String>) {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let good: Vec<(&str, usize)> = (0..12).map(|i| (if i < 6 { "M01" } else { "M02" }, i % 6)).collect();
        let bad: Vec<(&str, usize)> =
            (0..12).map(|i| (if i < 6 { "M01" } else { "M02" }, 100 + i * 3)).collect();
        // swaps neighbouring GLOVE ranks, so GLOVE vs BERT is indistinguishable
        let mid: Vec<(&str, usize)> = (0..12)
            .map(|i| {
                let j = i % 6;
                (if i < 6 { "M01" } else { "M02" }, if j % 2 == 0 { j + 1 } else { j - 1 })
            })
            .collect();
        write_ranks(dir.path(), "GLOVE", &good);
        write_ranks(dir.path(), "ELMO", &bad);
        write_ranks(dir.path(), "BERT", &mid);

        let models = [("GLOVE", "GLOVE"), ("ELMO", "ELMO"), ("BERT", "BERT")]
            .iter()
            .map(|(m, s)| ((*m).to_string(), (*s).to_string()))
            .collect();
        (dir, models)
    }

    #[test]
    fn test_all_pairs_and_subjects() {
        let (dir, models) = fixture();
        let table = wilcoxon_rank_preds(&models, false, None, &PredSource::new(dir.path()))
            .expect("comparison should succeed");

        // 3 pairs x 2 subjects
        assert_eq!(table.len(), 6);
        assert_eq!(table.correction, None);
        assert_eq!(table.rows[0].model1, "BERT");
        assert_eq!(table.rows[0].model2, "ELMO");
        assert_eq!(table.rows[0].subject, "M01");
        assert!(table.rows.iter().all(|r| r.p_value_corrected.is_none()));
    }

    #[test]
    fn test_bonferroni_is_unclamped_product() {
        let (dir, models) = fixture();
        let table = wilcoxon_rank_preds(&models, true, None, &PredSource::new(dir.path()))
            .expect("comparison should succeed");

        assert_eq!(table.correction, Some(6));
        for row in &table.rows {
            let corrected = row.p_value_corrected.expect("corrected p-value should be set");
            assert_abs_diff_eq!(corrected, row.p_value * 6.0, epsilon = 1e-15);
        }
        // GLOVE vs BERT has p = 1, so its corrected value is 6 and left as-is
        let row = table.get("BERT", "GLOVE", "M01").expect("row should exist");
        assert_abs_diff_eq!(row.p_value, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(row.p_value_corrected.unwrap_or(0.0), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_explicit_pairs() {
        let (dir, models) = fixture();
        let pairs = vec![("GLOVE".to_string(), "ELMO".to_string())];
        let table = wilcoxon_rank_preds(&models, true, Some(&pairs), &PredSource::new(dir.path()))
            .expect("comparison should succeed");

        assert_eq!(table.len(), 2);
        assert_eq!(table.correction, Some(2));
        let row = table.get("GLOVE", "ELMO", "M02").expect("row should exist");
        // GLOVE ranks are all lower: exact p = 2 / 2^6
        assert_eq!(row.statistic, 0.0);
        assert_abs_diff_eq!(row.p_value, 2.0 / 64.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_model_in_pairs() {
        let (dir, models) = fixture();
        let pairs = vec![("GLOVE".to_string(), "GPT".to_string())];
        let err = wilcoxon_rank_preds(&models, false, Some(&pairs), &PredSource::new(dir.path())).unwrap_err();
        assert!(matches!(err, Error::UnknownModel(ref m) if m == "GPT"));
    }

    #[test]
    fn test_row_count_mismatch() {
        let (dir, mut models) = fixture();
        write_ranks(dir.path(), "SHORT", &[("M01", 1)]);
        models.insert("SHORT".into(), "SHORT".into());

        let err = wilcoxon_rank_preds(&models, false, None, &PredSource::new(dir.path())).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_missing_prediction_file() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let models: BTreeMap<String, String> =
            [("A".to_string(), "a".to_string()), ("B".to_string(), "b".to_string())].into_iter().collect();
        let err = wilcoxon_rank_preds(&models, false, None, &PredSource::new(dir.path())).unwrap_err();
        assert!(matches!(err, Error::Csv { .. }));
    }

    #[test]
    fn test_custom_template() {
        let source = PredSource::new("/results").with_template("{}.ranks.csv");
        assert_eq!(source.path_for("GLOVE"), PathBuf::from("/results/GLOVE.ranks.csv"));
        assert_eq!(PredSource::default().path_for("X"), PathBuf::from("./perf.384sentences.X.pred.csv"));
    }

    #[test]
    fn test_bonferroni_helper() {
        assert_abs_diff_eq!(bonferroni(0.3, 5), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_display_table() {
        let (dir, models) = fixture();
        let table = wilcoxon_rank_preds(&models, true, None, &PredSource::new(dir.path()))
            .expect("comparison should succeed");
        let out = table.to_string();
        assert!(out.contains("p_val_corrected"));
        assert!(out.contains("GLOVE"));
    }
}
